use autobloom::bloom::{BloomFilter, DeletableBloomFilter};
use autobloom::SipHashFamily;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

fn bench_insert(c: &mut Criterion) {
    let mut initial_items = 0u32;
    while initial_items < 1024 - 32 {
        c.bench_function(&format!("bench insert {}", initial_items), |b| {
            b.iter_batched_ref(
                || {
                    let filter =
                        BloomFilter::with_hash_family(1024, 0.01, SipHashFamily, 0).unwrap();
                    for i in 0..initial_items {
                        filter.insert(&i.to_be_bytes());
                    }
                    filter
                },
                |filter| filter.insert(&0xDEAD_BEEFu32.to_be_bytes()),
                BatchSize::PerIteration,
            )
        });
        initial_items += 256;
    }
}

fn bench_contains(c: &mut Criterion) {
    let filter = BloomFilter::with_hash_family(1024, 0.01, SipHashFamily, 0).unwrap();
    for i in 0..1024u32 {
        filter.insert(&i.to_be_bytes());
    }
    c.bench_function("bench contains", |b| {
        b.iter(|| filter.contains(&0xDEAD_BEEFu32.to_be_bytes()))
    });
}

fn bench_remove(c: &mut Criterion) {
    c.bench_function("bench deletable insert remove", |b| {
        b.iter_batched_ref(
            || DeletableBloomFilter::with_hash_family(1024, 0.01, 64, SipHashFamily, 0).unwrap(),
            |filter| {
                filter.insert("foo");
                filter.remove("foo")
            },
            BatchSize::PerIteration,
        )
    });
}

criterion_group!(benches, bench_insert, bench_contains, bench_remove);
criterion_main!(benches);

use crate::bit_array::BitArray;
use crate::bloom::{optimal_hash_count, BloomFilterBuilder, MembershipFilter};
use crate::error::Result;
use crate::util::Probes;
use crate::{HashFamily, SipHashFamily};
use parking_lot::Mutex;
use rand::Rng;
use tracing::trace;

#[derive(Debug)]
struct BitState {
    bit_array: BitArray,
    set_bit_count: usize,
    collisions: usize,
}

/// A space-efficient probabilistic data structure to test for membership in a set.
///
/// At its core, a bloom filter is a bit array, initially all set to zero. `K` hash functions
/// map each element to `K` bits in the bit array. An element definitely does not exist in the
/// bloom filter if any of the `K` bits are unset. An element is possibly in the set if all of the
/// `K` bits are set. The `K` functions come from a [`HashFamily`], each keyed by the filter's seed
/// plus the function's index.
///
/// The bits and counters sit behind a lock, so every operation takes `&self` and each call is
/// atomic with respect to other calls on the same filter.
///
/// # Examples
///
/// ```
/// use autobloom::bloom::BloomFilter;
/// use autobloom::SipHashFamily;
///
/// let filter = BloomFilter::with_hash_family(1000, 0.01, SipHashFamily, 124).unwrap();
///
/// assert!(!filter.contains("foo"));
/// filter.insert("foo");
/// assert!(filter.contains("foo"));
///
/// filter.clear();
/// assert!(!filter.contains("foo"));
///
/// assert_eq!(filter.len(), 9586);
/// assert_eq!(filter.hasher_count(), 7);
/// ```
#[derive(Debug)]
pub struct BloomFilter<H = SipHashFamily> {
    state: Mutex<BitState>,
    hash_family: H,
    bit_count: usize,
    hasher_count: usize,
    seed: u64,
}

impl BloomFilter {
    /// Constructs a new, empty `BloomFilter` with an estimated max capacity of `item_count` items,
    /// a maximum false positive probability of `fpp`, and a random seed.
    ///
    /// # Errors
    ///
    /// Fails if `item_count` is 0 or `fpp` is outside (0, 1).
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    /// ```
    pub fn new(item_count: usize, fpp: f64) -> Result<Self> {
        Self::with_hash_family(item_count, fpp, SipHashFamily, rand::thread_rng().gen())
    }
}

impl<H> BloomFilter<H>
where
    H: HashFamily,
{
    /// Constructs a new, empty `BloomFilter` with an estimated max capacity of `item_count` items,
    /// a maximum false positive probability of `fpp`, a hash family, and a seed.
    ///
    /// # Errors
    ///
    /// Fails if `item_count` is 0 or `fpp` is outside (0, 1).
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::BloomFilter;
    /// use autobloom::Fnv1aHashFamily;
    ///
    /// let filter = BloomFilter::with_hash_family(10, 0.01, Fnv1aHashFamily, 1234).unwrap();
    /// ```
    pub fn with_hash_family(
        item_count: usize,
        fpp: f64,
        hash_family: H,
        seed: u64,
    ) -> Result<Self> {
        BloomFilterBuilder::new(item_count, fpp)
            .hash_family(hash_family)
            .seed(seed)
            .build()
    }

    pub(crate) fn from_parts(item_count: usize, fpp: f64, hash_family: H, seed: u64) -> Self {
        let (bit_count, hasher_count) = optimal_hash_count(item_count, fpp);
        trace!(item_count, fpp, bit_count, hasher_count, seed, "constructed bloom filter");
        BloomFilter {
            state: Mutex::new(BitState {
                bit_array: BitArray::new(bit_count),
                set_bit_count: 0,
                collisions: 0,
            }),
            hash_family,
            bit_count,
            hasher_count,
            seed,
        }
    }

    fn probes<'a>(&'a self, item: &'a [u8]) -> Probes<'a, H> {
        Probes::new(
            &self.hash_family,
            self.seed,
            self.hasher_count,
            self.bit_count,
            item,
        )
    }

    fn insert_bytes(&self, item: &[u8]) {
        let mut state = self.state.lock();
        for offset in self.probes(item) {
            if state.bit_array.set(offset, true) {
                state.collisions += 1;
            } else {
                state.set_bit_count += 1;
            }
        }
    }

    fn contains_bytes(&self, item: &[u8]) -> bool {
        let state = self.state.lock();
        self.probes(item).all(|offset| state.bit_array[offset])
    }

    /// Inserts an element into the bloom filter.
    ///
    /// Each probe that lands on an unset bit sets it; each probe that lands on a bit that is
    /// already set counts as a collision.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    ///
    /// filter.insert("foo");
    /// filter.insert(&[0xDEu8, 0xAD, 0xBE, 0xEF]);
    /// ```
    pub fn insert<U>(&self, item: &U)
    where
        U: AsRef<[u8]> + ?Sized,
    {
        self.insert_bytes(item.as_ref())
    }

    /// Checks if an element is possibly in the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    ///
    /// assert!(!filter.contains("foo"));
    /// filter.insert("foo");
    /// assert!(filter.contains("foo"));
    /// ```
    pub fn contains<U>(&self, item: &U) -> bool
    where
        U: AsRef<[u8]> + ?Sized,
    {
        self.contains_bytes(item.as_ref())
    }

    /// Returns the number of bits in the bloom filter.
    pub fn len(&self) -> usize {
        self.bit_count
    }

    /// Returns `true` if the bloom filter has no bits. Constructed filters always have at least
    /// one.
    pub fn is_empty(&self) -> bool {
        self.bit_count == 0
    }

    /// Returns the number of hash functions used by the bloom filter.
    pub fn hasher_count(&self) -> usize {
        self.hasher_count
    }

    /// Returns the seed mixed into every digest.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns a reference to the bloom filter's hash family.
    pub fn hash_family(&self) -> &H {
        &self.hash_family
    }

    /// Clears the bloom filter, removing all elements and resetting its counters.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    ///
    /// filter.insert("foo");
    /// filter.clear();
    ///
    /// assert!(!filter.contains("foo"));
    /// assert_eq!(filter.count_ones(), 0);
    /// ```
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.bit_array.set_all(false);
        state.set_bit_count = 0;
        state.collisions = 0;
    }

    /// Returns the number of set bits in the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::BloomFilter;
    /// use autobloom::SipHashFamily;
    ///
    /// let filter = BloomFilter::with_hash_family(10, 0.01, SipHashFamily, 0).unwrap();
    /// filter.insert("foo");
    ///
    /// assert_eq!(filter.count_ones() + filter.collisions(), 7);
    /// ```
    pub fn count_ones(&self) -> usize {
        self.state.lock().set_bit_count
    }

    /// Returns the number of unset bits in the bloom filter.
    pub fn count_zeros(&self) -> usize {
        self.bit_count - self.count_ones()
    }

    /// Returns how many probes have landed on bits that were already set.
    pub fn collisions(&self) -> usize {
        self.state.lock().collisions
    }

    /// Returns the fraction of bits that are set.
    pub fn fill_ratio(&self) -> f64 {
        self.count_ones() as f64 / self.bit_count as f64
    }

    /// Returns the estimated false positive probability of the bloom filter: the fill ratio raised
    /// to the number of hash functions. This value will increase as more items are added.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(100, 0.01).unwrap();
    /// assert!(filter.estimated_fpp() < std::f64::EPSILON);
    ///
    /// filter.insert("foo");
    /// assert!(filter.estimated_fpp() > std::f64::EPSILON);
    /// assert!(filter.estimated_fpp() < 0.01);
    /// ```
    pub fn estimated_fpp(&self) -> f64 {
        self.fill_ratio().powi(self.hasher_count as i32)
    }
}

impl<H> MembershipFilter for BloomFilter<H>
where
    H: HashFamily,
{
    fn insert(&self, item: &[u8]) {
        self.insert_bytes(item)
    }

    fn contains(&self, item: &[u8]) -> bool {
        self.contains_bytes(item)
    }
}

#[cfg(test)]
mod tests {
    use super::BloomFilter;
    use crate::bloom::MembershipFilter;
    use crate::util::tests::{random_items, rng, OffsetFamily};
    use crate::{Fnv1aHashFamily, SipHashFamily};
    use proptest::collection::vec;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new() {
        let filter = BloomFilter::with_hash_family(1000, 0.01, Fnv1aHashFamily, 124).unwrap();

        assert_eq!(filter.len(), 9586);
        assert_eq!(filter.hasher_count(), 7);
        assert_eq!(filter.count_ones(), 0);
        assert_eq!(filter.count_zeros(), 9586);
        assert!(!filter.is_empty());

        filter.insert("testdata");
        assert!(filter.contains("testdata"));
        assert!(!filter.contains("nonexistentdata"));
    }

    #[test]
    fn test_counters() {
        let filter = BloomFilter::from_parts(100, 0.1, OffsetFamily { stride: 10 }, 0);
        assert_eq!(filter.len(), 480);
        assert_eq!(filter.hasher_count(), 4);

        // Probes land on bits 0, 10, 10 and 20: three new bits and one collision.
        filter.insert(&[0u8, 1, 1, 2]);

        assert_eq!(filter.count_ones(), 3);
        assert_eq!(filter.collisions(), 1);
        assert!(filter.contains(&[2u8, 1, 0, 0]));
        assert!(!filter.contains(&[3u8, 1, 0, 0]));

        filter.clear();
        assert_eq!(filter.count_ones(), 0);
        assert_eq!(filter.collisions(), 0);
    }

    #[test]
    fn test_estimated_fpp() {
        let filter = BloomFilter::with_hash_family(100, 0.01, SipHashFamily, 0).unwrap();
        assert!(filter.estimated_fpp() < std::f64::EPSILON);

        filter.insert("foo");

        let expected_fpp = (filter.count_ones() as f64 / 959f64).powi(7);
        let expected_fill_ratio = filter.count_ones() as f64 / 959f64;
        assert!((filter.fill_ratio() - expected_fill_ratio).abs() < std::f64::EPSILON);
        assert!((filter.estimated_fpp() - expected_fpp).abs() < std::f64::EPSILON);
    }

    #[test]
    fn test_false_positive_rate() {
        let mut rng = rng();
        let filter = BloomFilter::with_hash_family(100_000, 0.01, SipHashFamily, 1234).unwrap();
        assert_eq!(filter.len(), 958_506);
        assert_eq!(filter.hasher_count(), 7);

        for item in random_items(&mut rng, 100_000) {
            filter.insert(&item);
        }

        let probes = random_items(&mut rng, 10_000);
        let false_positives = probes.iter().filter(|item| filter.contains(*item)).count();
        let rate = false_positives as f64 / probes.len() as f64;
        assert!(rate < 0.03, "false positive rate {} is too high", rate);
        assert!(filter.estimated_fpp() < 0.03);
    }

    #[test]
    fn test_membership_filter() {
        let filter: Box<dyn MembershipFilter> =
            Box::new(BloomFilter::with_hash_family(10, 0.01, SipHashFamily, 0).unwrap());
        filter.insert(b"foo");
        assert!(filter.contains(b"foo"));
    }

    #[test]
    fn test_concurrent_insert() {
        let filter =
            Arc::new(BloomFilter::with_hash_family(4000, 0.01, SipHashFamily, 9).unwrap());
        let handles = (0..4u32)
            .map(|thread_index| {
                let filter = Arc::clone(&filter);
                thread::spawn(move || {
                    for i in 0..1000u32 {
                        filter.insert(&(thread_index * 1000 + i).to_be_bytes());
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!((0..4000u32).all(|i| filter.contains(&i.to_be_bytes())));
        assert_eq!(filter.count_ones(), filter.state.lock().bit_array.count_ones());
    }

    proptest! {
        #[test]
        fn prop_no_false_negatives(
            items in vec(vec(any::<u8>(), 0..32), 1..64),
            seed in any::<u64>(),
        ) {
            let filter =
                BloomFilter::with_hash_family(items.len(), 0.01, SipHashFamily, seed).unwrap();
            for item in &items {
                filter.insert(item);
            }
            for item in &items {
                prop_assert!(filter.contains(item));
            }
        }
    }
}

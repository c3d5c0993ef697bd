use siphasher::sip::SipHasher;
use std::hash::Hasher;

/// A family of independent keyed 64-bit digest functions over arbitrary bytes.
///
/// A filter with `k` hash functions asks for digests `index = 0..k`, each under the filter's
/// `seed`. Implementations must domain-separate on `seed + index` so that the `k` digests of one
/// payload look independent, and must be pure: the same inputs always produce the same digest.
///
/// # Examples
///
/// ```
/// use autobloom::HashFamily;
///
/// struct XorFamily;
///
/// impl HashFamily for XorFamily {
///     fn digest(&self, seed: u64, index: u64, data: &[u8]) -> u64 {
///         data.iter()
///             .fold(seed.wrapping_add(index), |acc, byte| acc.rotate_left(8) ^ u64::from(*byte))
///     }
/// }
///
/// assert_eq!(XorFamily.digest(1, 0, b"foo"), XorFamily.digest(0, 1, b"foo"));
/// ```
pub trait HashFamily: Send + Sync {
    /// Returns the digest of `data` for hash function `index` of a filter seeded with `seed`.
    fn digest(&self, seed: u64, index: u64, data: &[u8]) -> u64;
}

/// The default hash family for all filters: SipHash-2-4 keyed with `seed + index`.
///
/// # Examples
///
/// ```
/// use autobloom::{HashFamily, SipHashFamily};
///
/// let family = SipHashFamily::default();
/// assert_ne!(family.digest(0, 0, b"foo"), family.digest(0, 1, b"foo"));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SipHashFamily;

impl HashFamily for SipHashFamily {
    #[inline]
    fn digest(&self, seed: u64, index: u64, data: &[u8]) -> u64 {
        let mut hasher = SipHasher::new_with_keys(seed.wrapping_add(index), 0);
        hasher.write(data);
        hasher.finish()
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a (64-bit) over the decimal text of `seed + index` followed by the payload.
///
/// This matches the digests of filters that feed each of their `k` hash objects a textual seed
/// prefix before the payload, which is useful when filters must agree bit-for-bit with such
/// implementations.
///
/// # Examples
///
/// ```
/// use autobloom::{Fnv1aHashFamily, HashFamily};
///
/// // Both digests hash the text "1" followed by the payload.
/// assert_eq!(Fnv1aHashFamily.digest(0, 1, b""), Fnv1aHashFamily.digest(1, 0, b""));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Fnv1aHashFamily;

impl Fnv1aHashFamily {
    fn fold(state: u64, bytes: &[u8]) -> u64 {
        bytes.iter().fold(state, |state, byte| {
            (state ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
        })
    }
}

impl HashFamily for Fnv1aHashFamily {
    fn digest(&self, seed: u64, index: u64, data: &[u8]) -> u64 {
        let prefix = seed.wrapping_add(index).to_string();
        let state = Self::fold(FNV_OFFSET_BASIS, prefix.as_bytes());
        Self::fold(state, data)
    }
}

/// Iterator over the `k` bit offsets an item maps to in a filter of `bit_count` bits.
pub struct Probes<'a, H> {
    hash_family: &'a H,
    data: &'a [u8],
    seed: u64,
    bit_count: u64,
    index: u64,
    hasher_count: u64,
}

impl<'a, H> Probes<'a, H>
where
    H: HashFamily,
{
    pub fn new(
        hash_family: &'a H,
        seed: u64,
        hasher_count: usize,
        bit_count: usize,
        data: &'a [u8],
    ) -> Self {
        Probes {
            hash_family,
            data,
            seed,
            bit_count: bit_count as u64,
            index: 0,
            hasher_count: hasher_count as u64,
        }
    }
}

impl<'a, H> Iterator for Probes<'a, H>
where
    H: HashFamily,
{
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.hasher_count {
            return None;
        }
        let digest = self.hash_family.digest(self.seed, self.index, self.data);
        self.index += 1;
        Some((digest % self.bit_count) as usize)
    }
}

use crate::bit_array::BitArray;
use crate::bloom::{optimal_hash_count, BloomFilterBuilder, MembershipFilter};
use crate::error::Result;
use crate::util::Probes;
use crate::{HashFamily, SipHashFamily};
use parking_lot::Mutex;
use rand::Rng;
use tracing::trace;

#[derive(Debug)]
struct RegionState {
    bit_array: BitArray,
    collision_bitmap: BitArray,
    set_bit_count: usize,
    collisions: usize,
}

// `offset < bit_count <= region_count * region_width`, so the quotient is already in range; the
// clamp keeps the bitmap access in bounds even if the width were ever computed differently.
fn region_of(offset: usize, region_width: usize, region_count: usize) -> usize {
    (offset / region_width).min(region_count - 1)
}

/// A bloom filter that supports removing elements.
///
/// The bit array is split into `R` contiguous regions of `ceil(M / R)` bits. Whenever an insert
/// probes a bit that is already set, the region holding that bit is flagged as shared by more than
/// one element, and stays flagged until the filter is cleared. Removing an element only clears its
/// bits that sit in unflagged regions. As long as only inserted elements are removed, a removal
/// never introduces a false negative for another element.
///
/// Removing an element that was never inserted is not detected. Its bits in unflagged regions are
/// cleared even when they belong to elements still in the filter, which then stop testing
/// positive.
///
/// A removal is reported as successful as soon as one of the `K` bits was cleared. That is
/// enough for the removed element to stop testing positive, but some of its bits may remain set
/// in flagged regions.
///
/// # Examples
///
/// ```
/// use autobloom::bloom::DeletableBloomFilter;
/// use autobloom::SipHashFamily;
///
/// let filter = DeletableBloomFilter::with_hash_family(100, 0.01, 10, SipHashFamily, 12344).unwrap();
///
/// filter.insert("test-key");
/// assert!(filter.contains("test-key"));
///
/// assert!(filter.remove("test-key"));
/// assert!(!filter.contains("test-key"));
///
/// assert_eq!(filter.len(), 959);
/// assert_eq!(filter.region_count(), 10);
/// assert_eq!(filter.region_width(), 96);
/// ```
#[derive(Debug)]
pub struct DeletableBloomFilter<H = SipHashFamily> {
    state: Mutex<RegionState>,
    hash_family: H,
    bit_count: usize,
    hasher_count: usize,
    region_count: usize,
    region_width: usize,
    seed: u64,
}

impl DeletableBloomFilter {
    /// Constructs a new, empty `DeletableBloomFilter` with an estimated max capacity of
    /// `item_count` items, a maximum false positive probability of `fpp`, `region_count` regions,
    /// and a random seed.
    ///
    /// # Errors
    ///
    /// Fails if `item_count` is 0, `fpp` is outside (0, 1) or `region_count` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::DeletableBloomFilter;
    ///
    /// let filter = DeletableBloomFilter::new(100, 0.01, 10).unwrap();
    /// ```
    pub fn new(item_count: usize, fpp: f64, region_count: usize) -> Result<Self> {
        Self::with_hash_family(
            item_count,
            fpp,
            region_count,
            SipHashFamily,
            rand::thread_rng().gen(),
        )
    }
}

impl<H> DeletableBloomFilter<H>
where
    H: HashFamily,
{
    /// Constructs a new, empty `DeletableBloomFilter` with an estimated max capacity of
    /// `item_count` items, a maximum false positive probability of `fpp`, `region_count` regions,
    /// a hash family, and a seed.
    ///
    /// # Errors
    ///
    /// Fails if `item_count` is 0, `fpp` is outside (0, 1) or `region_count` is 0.
    pub fn with_hash_family(
        item_count: usize,
        fpp: f64,
        region_count: usize,
        hash_family: H,
        seed: u64,
    ) -> Result<Self> {
        BloomFilterBuilder::new(item_count, fpp)
            .hash_family(hash_family)
            .seed(seed)
            .build_deletable(region_count)
    }

    pub(crate) fn from_parts(
        item_count: usize,
        fpp: f64,
        region_count: usize,
        hash_family: H,
        seed: u64,
    ) -> Self {
        let (bit_count, hasher_count) = optimal_hash_count(item_count, fpp);
        let region_width = (bit_count + region_count - 1) / region_count;
        trace!(
            item_count,
            fpp,
            bit_count,
            hasher_count,
            region_count,
            region_width,
            seed,
            "constructed deletable bloom filter"
        );
        DeletableBloomFilter {
            state: Mutex::new(RegionState {
                bit_array: BitArray::new(bit_count),
                collision_bitmap: BitArray::new(region_count),
                set_bit_count: 0,
                collisions: 0,
            }),
            hash_family,
            bit_count,
            hasher_count,
            region_count,
            region_width,
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

    fn region_of(&self, offset: usize) -> usize {
        region_of(offset, self.region_width, self.region_count)
    }

    fn insert_bytes(&self, item: &[u8]) {
        let mut state = self.state.lock();
        for offset in self.probes(item) {
            if state.bit_array.set(offset, true) {
                state.collision_bitmap.set(self.region_of(offset), true);
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

    /// Inserts an element into the filter. A probe that lands on a bit that is already set flags
    /// the bit's region as shared.
    pub fn insert<U>(&self, item: &U)
    where
        U: AsRef<[u8]> + ?Sized,
    {
        self.insert_bytes(item.as_ref())
    }

    /// Checks if an element is possibly in the filter.
    pub fn contains<U>(&self, item: &U) -> bool
    where
        U: AsRef<[u8]> + ?Sized,
    {
        self.contains_bytes(item.as_ref())
    }

    /// Removes an element from the filter, clearing each of its set bits that lies in an unflagged
    /// region. Returns `true` if at least one bit was cleared.
    ///
    /// A `true` result does not mean every bit of the element was cleared: bits in flagged
    /// regions are left alone. A `false` result means no bit was cleared, because none of the
    /// element's bits were set or all of them sit in flagged regions.
    ///
    /// Only remove elements that were inserted. An element that was never inserted but shares a
    /// set bit in an unflagged region with a present element is "removed" too: the call returns
    /// `true` and the present element becomes a false negative.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::DeletableBloomFilter;
    ///
    /// let filter = DeletableBloomFilter::new(100, 0.01, 10).unwrap();
    ///
    /// assert!(!filter.remove("foo"));
    /// filter.insert("foo");
    /// assert!(filter.remove("foo"));
    /// assert!(!filter.contains("foo"));
    /// ```
    pub fn remove<U>(&self, item: &U) -> bool
    where
        U: AsRef<[u8]> + ?Sized,
    {
        let mut state = self.state.lock();
        let mut cleared = false;
        for offset in self.probes(item.as_ref()) {
            if state.collision_bitmap[self.region_of(offset)] {
                continue;
            }
            if state.bit_array.set(offset, false) {
                state.set_bit_count -= 1;
                cleared = true;
            }
        }
        cleared
    }

    /// Returns the number of bits in the filter.
    pub fn len(&self) -> usize {
        self.bit_count
    }

    /// Returns `true` if the filter has no bits. Constructed filters always have at least one.
    pub fn is_empty(&self) -> bool {
        self.bit_count == 0
    }

    /// Returns the number of hash functions used by the filter.
    pub fn hasher_count(&self) -> usize {
        self.hasher_count
    }

    /// Returns the seed mixed into every digest.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of regions the bits are split into.
    pub fn region_count(&self) -> usize {
        self.region_count
    }

    /// Returns the number of bits per region. The last region may be shorter.
    pub fn region_width(&self) -> usize {
        self.region_width
    }

    /// Returns the number of regions flagged as shared.
    pub fn flagged_region_count(&self) -> usize {
        self.state.lock().collision_bitmap.count_ones()
    }

    /// Clears the filter, removing all elements, unflagging every region and resetting the
    /// counters.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.bit_array.set_all(false);
        state.collision_bitmap.set_all(false);
        state.set_bit_count = 0;
        state.collisions = 0;
    }

    /// Returns the number of set bits in the filter.
    pub fn count_ones(&self) -> usize {
        self.state.lock().set_bit_count
    }

    /// Returns the number of unset bits in the filter.
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

    /// Returns the estimated false positive probability of the filter: the fill ratio raised to
    /// the number of hash functions.
    pub fn estimated_fpp(&self) -> f64 {
        self.fill_ratio().powi(self.hasher_count as i32)
    }
}

impl<H> MembershipFilter for DeletableBloomFilter<H>
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
    use super::{region_of, DeletableBloomFilter};
    use crate::util::tests::{random_items, rng, OffsetFamily};
    use crate::{Fnv1aHashFamily, SipHashFamily};
    use proptest::prelude::*;

    fn offset_filter() -> DeletableBloomFilter<OffsetFamily> {
        // 959 bits, 7 hash functions, 10 regions of 96 bits.
        DeletableBloomFilter::from_parts(100, 0.01, 10, OffsetFamily { stride: 10 }, 0)
    }

    #[test]
    fn test_single_key_deletion() {
        let filter =
            DeletableBloomFilter::with_hash_family(100, 0.01, 10, Fnv1aHashFamily, 12344).unwrap();
        assert_eq!(filter.len(), 959);
        assert_eq!(filter.hasher_count(), 7);

        filter.insert("test-key");
        assert!(filter.contains("test-key"));
        assert!(filter.remove("test-key"));
        assert!(!filter.contains("test-key"));
    }

    #[test]
    fn test_uncontended_round_trip() {
        let filter = offset_filter();
        let key = [0u8, 10, 20, 30, 40, 50, 60];

        filter.insert(&key);
        assert_eq!(filter.count_ones(), 7);
        assert_eq!(filter.flagged_region_count(), 0);

        assert!(filter.remove(&key));
        assert!(!filter.contains(&key));
        assert_eq!(filter.count_ones(), 0);
    }

    #[test]
    fn test_partial_removal() {
        let filter = offset_filter();
        // Bits 0, 100, ..., 600: one bit in each of regions 0 through 6.
        let first = [0u8, 10, 20, 30, 40, 50, 60];
        // Bits 0, 10, ..., 60: all in region 0, and bit 0 is shared with `first`.
        let second = [0u8, 1, 2, 3, 4, 5, 6];

        filter.insert(&first);
        filter.insert(&second);
        assert_eq!(filter.count_ones(), 13);
        assert_eq!(filter.collisions(), 1);
        assert_eq!(filter.flagged_region_count(), 1);

        // Bit 0 stays set because region 0 is flagged; the other six bits are cleared.
        assert!(filter.remove(&first));
        assert_eq!(filter.count_ones(), 7);
        assert!(!filter.contains(&first));
        assert!(filter.contains(&second));

        // Every bit of `second` is protected, so it cannot be removed.
        assert!(!filter.remove(&second));
        assert!(filter.contains(&second));
        assert_eq!(filter.count_ones(), 7);
    }

    #[test]
    fn test_remove_absent_item() {
        let filter = offset_filter();
        assert!(!filter.remove(&[1u8, 2, 3, 4, 5, 6, 7]));
        assert_eq!(filter.count_ones(), 0);
    }

    #[test]
    fn test_remove_never_inserted_item_clears_shared_bits() {
        let filter = offset_filter();
        let present = [0u8, 10, 20, 30, 40, 50, 60];
        // Bits 0 and 900: bit 0 belongs to `present`, and region 0 is not flagged.
        let absent = [0u8, 90, 90, 90, 90, 90, 90];

        filter.insert(&present);
        assert!(!filter.contains(&absent));
        assert_eq!(filter.flagged_region_count(), 0);

        assert!(filter.remove(&absent));
        assert!(!filter.contains(&present));
        assert_eq!(filter.count_ones(), 6);
    }

    #[test]
    fn test_clear() {
        let filter = offset_filter();
        filter.insert(&[0u8, 0, 0, 0, 0, 0, 0]);
        assert_eq!(filter.count_ones(), 1);
        assert_eq!(filter.collisions(), 6);
        assert_eq!(filter.flagged_region_count(), 1);

        filter.clear();
        assert_eq!(filter.count_ones(), 0);
        assert_eq!(filter.collisions(), 0);
        assert_eq!(filter.flagged_region_count(), 0);
        assert!(filter.estimated_fpp() < std::f64::EPSILON);
    }

    #[test]
    fn test_no_false_negatives_after_removals() {
        let mut rng = rng();
        let filter =
            DeletableBloomFilter::with_hash_family(2000, 0.01, 200, SipHashFamily, 7).unwrap();
        let items = random_items(&mut rng, 2000);
        for item in &items {
            filter.insert(item);
        }

        let (removed, kept) = items.split_at(1000);
        for item in removed {
            filter.remove(item);
        }
        assert!(kept.iter().all(|item| filter.contains(item)));
        assert_eq!(filter.count_ones(), filter.state.lock().bit_array.count_ones());
    }

    #[test]
    fn test_region_of() {
        assert_eq!(region_of(958, 96, 10), 9);
        assert_eq!(region_of(95, 96, 10), 0);
        assert_eq!(region_of(96, 96, 10), 1);
        assert_eq!(region_of(9, 1, 10), 9);
        assert_eq!(region_of(10, 1, 10), 9);
    }

    proptest! {
        #[test]
        fn prop_region_in_range(bit_count in 1usize..100_000, region_count in 1usize..200_000) {
            let region_width = (bit_count + region_count - 1) / region_count;
            prop_assert!(region_of(bit_count - 1, region_width, region_count) < region_count);
        }
    }
}

use crate::bloom::{BloomFilter, MembershipFilter, ScalableBloomFilterBuilder};
use crate::error::Result;
use crate::{HashFamily, SipHashFamily};
use parking_lot::RwLock;
use rand::Rng;
use tracing::{debug, warn};

#[derive(Debug)]
struct Chain<H> {
    filters: Vec<BloomFilter<H>>,
    fpp: f64,
    current_filter_size: usize,
    inserted_since_growth: usize,
    total_inserted: usize,
    // Set once the next filter could not be constructed.
    growth_failed: bool,
    // Set once the chain reached its cap with the estimate above target.
    capped: bool,
}

impl<H> Chain<H>
where
    H: HashFamily,
{
    fn newest(&self) -> &BloomFilter<H> {
        self.filters.last().expect("Expected non-empty filters.")
    }
}

/// A growable, space-efficient probabilistic data structure to test for membership in a set.
///
/// A scalable bloom filter is a chain of bloom filters, oldest first. Every insert goes into every
/// filter in the chain. Afterwards, if the newest filter's estimated false positive probability
/// exceeds the current target and the chain is shorter than its cap, a new filter is appended:
/// the target is multiplied by the false positive growth rate, and the new filter expects
/// `max(previous_size * size_growth_rate, min_filter_size, 1)` items. Once the chain reaches its cap
/// it stops growing and the target stops changing, however far the estimate drifts.
///
/// An element is reported present if any filter in the chain reports it present.
///
/// The chain sits behind a read-write lock: inserts hold it exclusively from replication through
/// growth, while lookups share it.
///
/// # Examples
///
/// ```
/// use autobloom::bloom::ScalableBloomFilter;
///
/// let filter = ScalableBloomFilter::new(100, 0.01).unwrap();
///
/// assert!(!filter.contains("foo"));
/// filter.insert("foo");
/// assert!(filter.contains("foo"));
///
/// assert_eq!(filter.len(), 959);
/// assert_eq!(filter.filter_count(), 1);
/// ```
#[derive(Debug)]
pub struct ScalableBloomFilter<H = SipHashFamily> {
    chain: RwLock<Chain<H>>,
    hash_family: H,
    min_filter_size: usize,
    max_filter_count: usize,
    size_growth_rate: f64,
    fpp_growth_rate: f64,
    seed: u64,
}

impl ScalableBloomFilter {
    /// Constructs a new, empty `ScalableBloomFilter` whose first filter expects `initial_size`
    /// items with a false positive probability of `fpp`. Growth parameters take their defaults and
    /// the seed is random.
    ///
    /// # Errors
    ///
    /// Fails if `initial_size` is 0 or `fpp` is outside (0, 1).
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::ScalableBloomFilter;
    ///
    /// let filter = ScalableBloomFilter::new(100, 0.01).unwrap();
    /// ```
    pub fn new(initial_size: usize, fpp: f64) -> Result<Self> {
        ScalableBloomFilterBuilder::new(initial_size, fpp)
            .hash_family(SipHashFamily)
            .seed(rand::thread_rng().gen())
            .build()
    }
}

impl<H> ScalableBloomFilter<H>
where
    H: HashFamily + Clone,
{
    /// Constructs a new, empty `ScalableBloomFilter`.
    ///
    /// `min_filter_size` is a floor on the item count of every grown filter, `max_filter_count`
    /// caps the chain length, `size_growth_rate` multiplies the item count of each new filter, and
    /// `fpp_growth_rate` multiplies the target false positive probability on each growth.
    ///
    /// # Errors
    ///
    /// Fails if `initial_size` is 0, `fpp` is outside (0, 1), either growth rate is not positive,
    /// or `max_filter_count` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::ScalableBloomFilter;
    /// use autobloom::Fnv1aHashFamily;
    ///
    /// let filter = ScalableBloomFilter::with_hash_family(
    ///     1000,
    ///     1000,
    ///     10,
    ///     1.0,
    ///     0.01,
    ///     1.01,
    ///     Fnv1aHashFamily,
    ///     1234,
    /// )
    /// .unwrap();
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn with_hash_family(
        initial_size: usize,
        min_filter_size: usize,
        max_filter_count: usize,
        size_growth_rate: f64,
        fpp: f64,
        fpp_growth_rate: f64,
        hash_family: H,
        seed: u64,
    ) -> Result<Self> {
        ScalableBloomFilterBuilder::new(initial_size, fpp)
            .hash_family(hash_family)
            .min_filter_size(min_filter_size)
            .max_filter_count(max_filter_count)
            .size_growth_rate(size_growth_rate)
            .fpp_growth_rate(fpp_growth_rate)
            .seed(seed)
            .build()
    }

    pub(crate) fn from_builder(builder: &ScalableBloomFilterBuilder<H>, hash_family: H) -> Self {
        let filter = BloomFilter::from_parts(
            builder.initial_size,
            builder.fpp,
            hash_family.clone(),
            builder.seed,
        );
        ScalableBloomFilter {
            chain: RwLock::new(Chain {
                filters: vec![filter],
                fpp: builder.fpp,
                current_filter_size: builder.initial_size,
                inserted_since_growth: 0,
                total_inserted: 0,
                growth_failed: false,
                capped: false,
            }),
            hash_family,
            min_filter_size: builder.min_filter_size,
            max_filter_count: builder.max_filter_count,
            size_growth_rate: builder.size_growth_rate,
            fpp_growth_rate: builder.fpp_growth_rate,
            seed: builder.seed,
        }
    }

    fn try_grow(&self, chain: &mut Chain<H>) -> bool {
        let item_count = ((chain.current_filter_size as f64 * self.size_growth_rate) as usize)
            .max(self.min_filter_size)
            .max(1);
        let fpp = chain.fpp * self.fpp_growth_rate;

        let hash_family = self.hash_family.clone();
        let filter = match BloomFilter::with_hash_family(item_count, fpp, hash_family, self.seed) {
            Ok(filter) => filter,
            Err(err) => {
                if !chain.growth_failed {
                    warn!(error = %err, item_count, fpp, "cannot construct next bloom filter");
                    chain.growth_failed = true;
                }
                return false;
            }
        };

        debug!(
            generation = chain.filters.len(),
            item_count,
            fpp,
            bit_count = filter.len(),
            inserted_since_growth = chain.inserted_since_growth,
            "appending bloom filter"
        );
        chain.filters.push(filter);
        chain.fpp = fpp;
        chain.current_filter_size = item_count;
        true
    }

    fn insert_bytes(&self, item: &[u8]) {
        let mut chain = self.chain.write();
        for filter in &chain.filters {
            filter.insert(item);
        }

        let estimated_fpp = chain.newest().estimated_fpp();
        let grown = if estimated_fpp > chain.fpp {
            if chain.filters.len() < self.max_filter_count {
                self.try_grow(&mut chain)
            } else {
                if !chain.capped {
                    warn!(
                        filter_count = chain.filters.len(),
                        estimated_fpp,
                        fpp = chain.fpp,
                        "bloom filter chain is full, false positive rate will exceed target"
                    );
                    chain.capped = true;
                }
                false
            }
        } else {
            false
        };

        if grown {
            chain.inserted_since_growth = 0;
        } else {
            chain.inserted_since_growth += 1;
        }
        chain.total_inserted += 1;
    }

    fn contains_bytes(&self, item: &[u8]) -> bool {
        let chain = self.chain.read();
        chain.filters.iter().any(|filter| filter.contains(item))
    }

    /// Inserts an element into every filter in the chain, then grows the chain if the newest
    /// filter's estimated false positive probability exceeds the current target.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::ScalableBloomFilter;
    ///
    /// let filter = ScalableBloomFilter::new(100, 0.01).unwrap();
    ///
    /// filter.insert("foo");
    /// assert_eq!(filter.total_inserted(), 1);
    /// ```
    pub fn insert<U>(&self, item: &U)
    where
        U: AsRef<[u8]> + ?Sized,
    {
        self.insert_bytes(item.as_ref())
    }

    /// Checks if an element is possibly in any filter of the chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bloom::ScalableBloomFilter;
    ///
    /// let filter = ScalableBloomFilter::new(100, 0.01).unwrap();
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

    /// Returns the total number of bits across the chain.
    pub fn len(&self) -> usize {
        self.chain.read().filters.iter().map(BloomFilter::len).sum()
    }

    /// Returns `true` if the chain has no bits. Constructed chains always have at least one.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of filters in the chain.
    pub fn filter_count(&self) -> usize {
        self.chain.read().filters.len()
    }

    /// Returns the maximum number of filters the chain may hold.
    pub fn max_filter_count(&self) -> usize {
        self.max_filter_count
    }

    /// Returns the total number of set bits across the chain.
    pub fn count_ones(&self) -> usize {
        self.chain.read().filters.iter().map(BloomFilter::count_ones).sum()
    }

    /// Returns the current target false positive probability, which the newest filter was sized
    /// for.
    pub fn fpp(&self) -> f64 {
        self.chain.read().fpp
    }

    /// Returns the newest filter's estimated false positive probability, the value compared
    /// against the target when deciding to grow.
    pub fn estimated_fpp(&self) -> f64 {
        self.chain.read().newest().estimated_fpp()
    }

    /// Returns the number of inserts since the chain last grew.
    pub fn inserted_since_growth(&self) -> usize {
        self.chain.read().inserted_since_growth
    }

    /// Returns the number of inserts over the lifetime of the chain.
    pub fn total_inserted(&self) -> usize {
        self.chain.read().total_inserted
    }
}

impl<H> MembershipFilter for ScalableBloomFilter<H>
where
    H: HashFamily + Clone,
{
    fn insert(&self, item: &[u8]) {
        self.insert_bytes(item)
    }

    fn contains(&self, item: &[u8]) -> bool {
        self.contains_bytes(item)
    }
}

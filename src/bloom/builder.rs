//! Construction-time configuration for every filter.
//!
//! Builders collect the parameters, validate them all at once in `build`, and only then allocate
//! the filter. A builder starts without a hash family; supplying one is mandatory, and building
//! without it fails with [`FilterError::MissingHasher`].
//!
//! # Examples
//!
//! ```
//! use autobloom::bloom::{BloomFilterBuilder, ScalableBloomFilterBuilder};
//! use autobloom::{FilterError, SipHashFamily};
//!
//! let filter = BloomFilterBuilder::new(1000, 0.01)
//!     .hash_family(SipHashFamily)
//!     .seed(1234)
//!     .build()
//!     .unwrap();
//! assert_eq!(filter.len(), 9586);
//!
//! let result = ScalableBloomFilterBuilder::new(1000, 0.01).build();
//! assert_eq!(result.err(), Some(FilterError::MissingHasher));
//! ```

use crate::bloom::{BloomFilter, DeletableBloomFilter, ScalableBloomFilter};
use crate::error::{self, FilterError, Result};
use crate::{HashFamily, SipHashFamily};

/// Default cap on the number of generations in a scalable filter.
pub const DEFAULT_MAX_FILTER_COUNT: usize = 10;

/// Default per-generation size multiplier of a scalable filter.
pub const DEFAULT_SIZE_GROWTH_RATE: f64 = 2.0;

/// Default per-generation false positive rate multiplier of a scalable filter.
pub const DEFAULT_FPP_GROWTH_RATE: f64 = 0.5;

/// Builder for [`BloomFilter`] and [`DeletableBloomFilter`].
#[derive(Clone, Debug)]
pub struct BloomFilterBuilder<H = SipHashFamily> {
    pub(crate) item_count: usize,
    pub(crate) fpp: f64,
    pub(crate) seed: u64,
    pub(crate) hash_family: Option<H>,
}

impl BloomFilterBuilder {
    /// Starts a builder for a filter expected to hold `item_count` items with a false positive
    /// probability of `fpp`. The seed defaults to 0.
    pub fn new(item_count: usize, fpp: f64) -> Self {
        BloomFilterBuilder {
            item_count,
            fpp,
            seed: 0,
            hash_family: None,
        }
    }
}

impl<H> BloomFilterBuilder<H>
where
    H: HashFamily,
{
    /// Sets the hash family the filter derives its `k` digests from.
    pub fn hash_family<G>(self, hash_family: G) -> BloomFilterBuilder<G>
    where
        G: HashFamily,
    {
        BloomFilterBuilder {
            item_count: self.item_count,
            fpp: self.fpp,
            seed: self.seed,
            hash_family: Some(hash_family),
        }
    }

    /// Sets the seed mixed into every digest.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(self) -> Result<(usize, f64, u64, H)> {
        error::check_item_count(self.item_count)?;
        error::check_fpp(self.fpp)?;
        let hash_family = self.hash_family.ok_or(FilterError::MissingHasher)?;
        Ok((self.item_count, self.fpp, self.seed, hash_family))
    }

    /// Builds a [`BloomFilter`].
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidElementCount`] if the item count is 0,
    /// [`FilterError::InvalidFalsePositiveRate`] if the rate is outside (0, 1), and
    /// [`FilterError::MissingHasher`] if no hash family was set.
    pub fn build(self) -> Result<BloomFilter<H>> {
        let (item_count, fpp, seed, hash_family) = self.validate()?;
        Ok(BloomFilter::from_parts(item_count, fpp, hash_family, seed))
    }

    /// Builds a [`DeletableBloomFilter`] whose bits are split into `region_count` regions.
    ///
    /// # Errors
    ///
    /// Fails like [`build`](Self::build), and with [`FilterError::InvalidRegionCount`] if
    /// `region_count` is 0.
    pub fn build_deletable(self, region_count: usize) -> Result<DeletableBloomFilter<H>> {
        let (item_count, fpp, seed, hash_family) = self.validate()?;
        if region_count == 0 {
            return Err(FilterError::InvalidRegionCount);
        }
        Ok(DeletableBloomFilter::from_parts(
            item_count,
            fpp,
            region_count,
            hash_family,
            seed,
        ))
    }
}

/// Builder for [`ScalableBloomFilter`].
#[derive(Clone, Debug)]
pub struct ScalableBloomFilterBuilder<H = SipHashFamily> {
    pub(crate) initial_size: usize,
    pub(crate) min_filter_size: usize,
    pub(crate) max_filter_count: usize,
    pub(crate) size_growth_rate: f64,
    pub(crate) fpp: f64,
    pub(crate) fpp_growth_rate: f64,
    pub(crate) seed: u64,
    pub(crate) hash_family: Option<H>,
}

impl ScalableBloomFilterBuilder {
    /// Starts a builder for a chain whose first generation expects `initial_size` items with a
    /// false positive probability of `fpp`.
    pub fn new(initial_size: usize, fpp: f64) -> Self {
        ScalableBloomFilterBuilder {
            initial_size,
            min_filter_size: 0,
            max_filter_count: DEFAULT_MAX_FILTER_COUNT,
            size_growth_rate: DEFAULT_SIZE_GROWTH_RATE,
            fpp,
            fpp_growth_rate: DEFAULT_FPP_GROWTH_RATE,
            seed: 0,
            hash_family: None,
        }
    }
}

impl<H> ScalableBloomFilterBuilder<H>
where
    H: HashFamily + Clone,
{
    /// Sets the hash family every generation derives its digests from.
    pub fn hash_family<G>(self, hash_family: G) -> ScalableBloomFilterBuilder<G>
    where
        G: HashFamily + Clone,
    {
        ScalableBloomFilterBuilder {
            initial_size: self.initial_size,
            min_filter_size: self.min_filter_size,
            max_filter_count: self.max_filter_count,
            size_growth_rate: self.size_growth_rate,
            fpp: self.fpp,
            fpp_growth_rate: self.fpp_growth_rate,
            seed: self.seed,
            hash_family: Some(hash_family),
        }
    }

    /// Sets the smallest item count a new generation may be sized for.
    ///
    /// A grown generation holds `max(previous_size * size_growth_rate, min_filter_size, 1)` items.
    /// This is a floor, not a cap: a large value makes every new generation at least that big.
    pub fn min_filter_size(mut self, min_filter_size: usize) -> Self {
        self.min_filter_size = min_filter_size;
        self
    }

    /// Sets the maximum number of generations in the chain.
    pub fn max_filter_count(mut self, max_filter_count: usize) -> Self {
        self.max_filter_count = max_filter_count;
        self
    }

    /// Sets the multiplier applied to the item count of each new generation.
    pub fn size_growth_rate(mut self, size_growth_rate: f64) -> Self {
        self.size_growth_rate = size_growth_rate;
        self
    }

    /// Sets the multiplier applied to the target false positive rate on each growth.
    pub fn fpp_growth_rate(mut self, fpp_growth_rate: f64) -> Self {
        self.fpp_growth_rate = fpp_growth_rate;
        self
    }

    /// Sets the seed shared by every generation.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds a [`ScalableBloomFilter`] holding its first generation.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidInitialSize`], [`FilterError::InvalidFalsePositiveRate`],
    /// [`FilterError::InvalidGrowthRate`], [`FilterError::InvalidSizeGrowthRate`],
    /// [`FilterError::InvalidMaxFilterCount`] or [`FilterError::MissingHasher`], checked in that
    /// order.
    pub fn build(self) -> Result<ScalableBloomFilter<H>> {
        if self.initial_size == 0 {
            return Err(FilterError::InvalidInitialSize);
        }
        error::check_fpp(self.fpp)?;
        if !error::is_positive_rate(self.fpp_growth_rate) {
            return Err(FilterError::InvalidGrowthRate(self.fpp_growth_rate));
        }
        if !error::is_positive_rate(self.size_growth_rate) {
            return Err(FilterError::InvalidSizeGrowthRate(self.size_growth_rate));
        }
        if self.max_filter_count == 0 {
            return Err(FilterError::InvalidMaxFilterCount);
        }
        let hash_family = self.hash_family.clone().ok_or(FilterError::MissingHasher)?;
        Ok(ScalableBloomFilter::from_builder(&self, hash_family))
    }
}

#[cfg(test)]
mod tests {
    use super::{BloomFilterBuilder, ScalableBloomFilterBuilder};
    use crate::{FilterError, Fnv1aHashFamily, SipHashFamily};

    #[test]
    fn test_build() {
        let filter = BloomFilterBuilder::new(100, 0.01)
            .hash_family(Fnv1aHashFamily)
            .seed(7)
            .build()
            .unwrap();
        assert_eq!(filter.len(), 959);
        assert_eq!(filter.hasher_count(), 7);
        assert_eq!(filter.seed(), 7);
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(
            BloomFilterBuilder::new(0, 0.01)
                .hash_family(SipHashFamily)
                .build()
                .err(),
            Some(FilterError::InvalidElementCount)
        );
        assert_eq!(
            BloomFilterBuilder::new(10, 1.0)
                .hash_family(SipHashFamily)
                .build()
                .err(),
            Some(FilterError::InvalidFalsePositiveRate(1.0))
        );
        assert_eq!(
            BloomFilterBuilder::new(10, 0.01).build().err(),
            Some(FilterError::MissingHasher)
        );
        // Element count is checked before the hasher.
        assert_eq!(
            BloomFilterBuilder::new(0, 0.01).build().err(),
            Some(FilterError::InvalidElementCount)
        );
    }

    #[test]
    fn test_build_deletable_errors() {
        assert_eq!(
            BloomFilterBuilder::new(10, 0.01)
                .hash_family(SipHashFamily)
                .build_deletable(0)
                .err(),
            Some(FilterError::InvalidRegionCount)
        );
        assert_eq!(
            BloomFilterBuilder::new(10, 0.01).build_deletable(0).err(),
            Some(FilterError::MissingHasher)
        );
        assert!(BloomFilterBuilder::new(10, 0.01)
            .hash_family(SipHashFamily)
            .build_deletable(3)
            .is_ok());
    }

    #[test]
    fn test_build_scalable_errors() {
        let builder = ScalableBloomFilterBuilder::new(100, 0.01).hash_family(SipHashFamily);

        assert_eq!(
            ScalableBloomFilterBuilder::new(0, 0.01)
                .hash_family(SipHashFamily)
                .build()
                .err(),
            Some(FilterError::InvalidInitialSize)
        );
        assert_eq!(
            ScalableBloomFilterBuilder::new(100, 0.0)
                .hash_family(SipHashFamily)
                .build()
                .err(),
            Some(FilterError::InvalidFalsePositiveRate(0.0))
        );
        assert_eq!(
            builder.clone().fpp_growth_rate(0.0).build().err(),
            Some(FilterError::InvalidGrowthRate(0.0))
        );
        assert_eq!(
            builder.clone().size_growth_rate(-1.0).build().err(),
            Some(FilterError::InvalidSizeGrowthRate(-1.0))
        );
        assert_eq!(
            builder.clone().max_filter_count(0).build().err(),
            Some(FilterError::InvalidMaxFilterCount)
        );
        assert_eq!(
            ScalableBloomFilterBuilder::new(100, 0.01).build().err(),
            Some(FilterError::MissingHasher)
        );
        assert!(builder.build().is_ok());
    }
}

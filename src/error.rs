//! Errors raised while constructing filters.
//!
//! Every check happens up front, so a constructor either returns a fully usable filter or one of
//! these errors. Inserting, testing and removing never fail afterwards.

use thiserror::Error;

/// Result type alias for filter construction.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while constructing a filter.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FilterError {
    /// The expected element count was 0.
    #[error("expected element count must be greater than 0")]
    InvalidElementCount,

    /// The false positive rate was not inside the open interval (0, 1).
    #[error("invalid false positive rate: {0} (must be between 0 and 1, exclusive)")]
    InvalidFalsePositiveRate(f64),

    /// No hash family was supplied to a builder.
    #[error("no hash family was supplied")]
    MissingHasher,

    /// A deletable filter was asked for 0 regions.
    #[error("region count must be greater than 0")]
    InvalidRegionCount,

    /// A scalable filter was asked for an initial size of 0.
    #[error("initial filter size must be greater than 0")]
    InvalidInitialSize,

    /// The per-generation false positive rate multiplier was not positive.
    #[error("invalid false positive growth rate: {0} (must be greater than 0)")]
    InvalidGrowthRate(f64),

    /// The per-generation size multiplier was not positive.
    #[error("invalid size growth rate: {0} (must be greater than 0)")]
    InvalidSizeGrowthRate(f64),

    /// A scalable filter was allowed 0 generations.
    #[error("maximum filter count must be greater than 0")]
    InvalidMaxFilterCount,
}

pub(crate) fn check_item_count(item_count: usize) -> Result<()> {
    if item_count == 0 {
        return Err(FilterError::InvalidElementCount);
    }
    Ok(())
}

pub(crate) fn check_fpp(fpp: f64) -> Result<()> {
    // Written so that NaN fails too.
    if !(fpp > 0.0 && fpp < 1.0) {
        return Err(FilterError::InvalidFalsePositiveRate(fpp));
    }
    Ok(())
}

pub(crate) fn is_positive_rate(rate: f64) -> bool {
    rate > 0.0 && rate.is_finite()
}

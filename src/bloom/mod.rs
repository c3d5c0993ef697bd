//! Space-efficient probabilistic data structures for approximate membership queries in a set.

mod bloom_filter;
mod builder;
mod deletable_bloom_filter;
mod params;
mod scalable_bloom_filter;

pub use self::bloom_filter::BloomFilter;
pub use self::builder::{
    BloomFilterBuilder, ScalableBloomFilterBuilder, DEFAULT_FPP_GROWTH_RATE,
    DEFAULT_MAX_FILTER_COUNT, DEFAULT_SIZE_GROWTH_RATE,
};
pub use self::deletable_bloom_filter::DeletableBloomFilter;
pub use self::params::{estimate_capacity, optimal_hash_count};
pub use self::scalable_bloom_filter::ScalableBloomFilter;

/// The insert and lookup surface shared by every filter.
///
/// # Examples
///
/// ```
/// use autobloom::bloom::{BloomFilter, DeletableBloomFilter, MembershipFilter, ScalableBloomFilter};
///
/// let filters: Vec<Box<dyn MembershipFilter>> = vec![
///     Box::new(BloomFilter::new(100, 0.01).unwrap()),
///     Box::new(DeletableBloomFilter::new(100, 0.01, 10).unwrap()),
///     Box::new(ScalableBloomFilter::new(100, 0.01).unwrap()),
/// ];
///
/// for filter in &filters {
///     filter.insert(b"foo");
///     assert!(filter.contains(b"foo"));
/// }
/// ```
pub trait MembershipFilter: Send + Sync {
    /// Inserts an element.
    fn insert(&self, item: &[u8]);

    /// Checks if an element is possibly present. Never returns `false` for an inserted element,
    /// unless a deletable filter removed it.
    fn contains(&self, item: &[u8]) -> bool;
}

//! Sizing formulas shared by every filter.

use std::f64::consts::LN_2;

/// Returns the optimal number of bits `m` and hash functions `k` for a bloom filter expected to
/// hold `item_count` items with a false positive probability of `fpp`.
///
/// `m = ceil(-n * ln(p) / ln(2)^2)` and `k = ceil(m / n * ln(2))`, each floored to 1.
///
/// `item_count` must be greater than 0 and `fpp` must lie in (0, 1); the filter constructors
/// validate both before calling this.
///
/// # Examples
///
/// ```
/// use autobloom::bloom::optimal_hash_count;
///
/// assert_eq!(optimal_hash_count(1000, 0.01), (9586, 7));
/// ```
pub fn optimal_hash_count(item_count: usize, fpp: f64) -> (usize, usize) {
    let item_count = item_count as f64;
    let bit_count = ((-item_count * fpp.ln() / LN_2.powi(2)).ceil() as usize).max(1);
    let hasher_count = ((bit_count as f64 / item_count * LN_2).ceil() as usize).max(1);
    (bit_count, hasher_count)
}

/// Returns how many items a filter of `bit_count` bits and `hasher_count` hash functions can hold
/// before its false positive probability reaches `fpp`.
///
/// This inverts the usual fill formula and is informational only: no filter consults it when
/// deciding to grow.
///
/// # Examples
///
/// ```
/// use autobloom::bloom::estimate_capacity;
///
/// assert_eq!(estimate_capacity(9586, 7, 0.01), 1000.0);
/// ```
pub fn estimate_capacity(bit_count: usize, hasher_count: usize, fpp: f64) -> f64 {
    let hasher_count = hasher_count as f64;
    let single_fpp = (fpp.ln() / hasher_count).exp();
    let bits_per_item = -hasher_count / (1.0 - single_fpp).ln();
    (bit_count as f64 / bits_per_item).ceil()
}

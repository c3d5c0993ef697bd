//! # autobloom
//!
//! `autobloom` contains bloom filters that size themselves from an expected element count and a
//! target false positive probability:
//!
//!  - [`BloomFilter`](bloom::BloomFilter): a fixed-size filter using the optimal number of bits
//!    and hash functions.
//!  - [`DeletableBloomFilter`](bloom::DeletableBloomFilter): a filter that tracks collisions per
//!    region of its bit array, so elements can be removed without introducing false negatives.
//!  - [`ScalableBloomFilter`](bloom::ScalableBloomFilter): a chain of filters that appends a
//!    larger, differently-targeted filter whenever the newest one's estimated false positive
//!    probability exceeds the target.
//!
//! Every filter hashes bytes through a [`HashFamily`] and is safe to share between threads.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! autobloom = "*"
//! ```
//!
//! ```rust
//! use autobloom::bloom::BloomFilter;
//!
//! let filter = BloomFilter::new(1000, 0.01).unwrap();
//! filter.insert("foo");
//! assert!(filter.contains("foo"));
//! ```
//!
//! ## References
//!
//!  - [Scalable Bloom Filters](https://dl.acm.org/citation.cfm?id=1224501)
//!  > Almeida, Paulo Sérgio, Carlos Baquero, Nuno Preguiça, and David Hutchison. 2007. “Scalable Bloom Filters.” *Inf. Process. Lett.* 101 (6). Amsterdam, The Netherlands, The Netherlands: Elsevier North-Holland, Inc.: 255–61. doi:[10.1016/j.ipl.2006.10.007](https://doi.org/10.1016/j.ipl.2006.10.007).
//!  - [The Deletable Bloom filter: A new member of the Bloom family](https://arxiv.org/abs/1005.0352)
//!  > Rothenberg, Christian Esteve, Carlos A. B. Macapuna, Fábio L. Verdi, and Maurício F. Magalhães. 2010. “The Deletable Bloom Filter: A New Member of the Bloom Family.” *IEEE Communications Letters* 14 (6): 557–59. doi:[10.1109/LCOMM.2010.06.100344](https://doi.org/10.1109/LCOMM.2010.06.100344).

#![warn(missing_docs)]

pub mod bit_array;
pub mod bloom;
mod error;
mod util;

pub use self::error::{FilterError, Result};
pub use self::util::{Fnv1aHashFamily, HashFamily, SipHashFamily};

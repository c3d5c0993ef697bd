//! Fixed-length list of bits.

use std::mem;
use std::ops::Index;

/// A fixed-length list of bits implemented using a `Vec<u8>`.
///
/// Unlike a growable bit vector, the length is decided at construction and never changes. The
/// array does not track how many bits are set; filters keep that count themselves so it can be
/// updated in the same critical section as the bits.
///
/// # Examples
///
/// ```
/// use autobloom::bit_array::BitArray;
///
/// let mut ba = BitArray::new(5);
///
/// assert!(!ba.set(0, true));
/// assert!(ba.set(0, true));
/// ba.set(2, true);
/// assert_eq!(ba.count_ones(), 2);
///
/// ba.set_all(false);
/// assert_eq!(ba.count_zeros(), 5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BitArray {
    blocks: Vec<u8>,
    len: usize,
}

const BLOCK_BIT_COUNT: usize = mem::size_of::<u8>() * 8;

impl BitArray {
    fn get_block_count(len: usize) -> usize {
        (len + BLOCK_BIT_COUNT - 1) / BLOCK_BIT_COUNT
    }

    fn clear_extra_bits(&mut self) {
        let extra_bits = self.len() % BLOCK_BIT_COUNT;
        if extra_bits > 0 {
            let mask = (1 << extra_bits) - 1;
            let blocks_len = self.blocks.len();
            let block = &mut self.blocks[blocks_len - 1];
            *block &= mask;
        }
    }

    /// Constructs a new `BitArray` with a certain number of bits. All bits are initialized to
    /// false.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bit_array::BitArray;
    ///
    /// let ba = BitArray::new(5);
    /// assert_eq!(ba.get(4), Some(false));
    /// assert_eq!(ba.get(5), None);
    /// ```
    pub fn new(len: usize) -> Self {
        BitArray {
            blocks: vec![0; Self::get_block_count(len)],
            len,
        }
    }

    /// Sets the value at index `index` to `bit` and returns the previous value.
    ///
    /// # Panics
    ///
    /// Panics if attempt to set an index out-of-bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bit_array::BitArray;
    ///
    /// let mut ba = BitArray::new(5);
    ///
    /// assert_eq!(ba.set(1, true), false);
    /// assert_eq!(ba.set(1, false), true);
    /// assert_eq!(ba.get(1), Some(false));
    /// ```
    pub fn set(&mut self, index: usize, bit: bool) -> bool {
        assert!(index < self.len);
        let block_index = index / BLOCK_BIT_COUNT;
        let bit_index = index % BLOCK_BIT_COUNT;
        let mask = 1 << bit_index;
        let prev = ((self.blocks[block_index] >> bit_index) & 1) != 0;
        if bit {
            self.blocks[block_index] |= mask;
        } else {
            self.blocks[block_index] &= !mask;
        }
        prev
    }

    /// Returns the value at index `index`, or `None` if index is out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bit_array::BitArray;
    ///
    /// let mut ba = BitArray::new(5);
    /// ba.set(1, true);
    ///
    /// assert_eq!(ba.get(0), Some(false));
    /// assert_eq!(ba.get(1), Some(true));
    /// ```
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            None
        } else {
            let block_index = index / BLOCK_BIT_COUNT;
            let bit_index = index % BLOCK_BIT_COUNT;
            self.blocks
                .get(block_index)
                .map(|block| ((block >> bit_index) & 1) != 0)
        }
    }

    /// Sets all values in the `BitArray` to `bit`.
    ///
    /// # Examples
    ///
    /// ```
    /// use autobloom::bit_array::BitArray;
    ///
    /// let mut ba = BitArray::new(5);
    /// ba.set_all(true);
    ///
    /// assert_eq!(ba.count_ones(), 5);
    /// ```
    pub fn set_all(&mut self, bit: bool) {
        let mask = if bit { !0 } else { 0 };
        for block in &mut self.blocks {
            *block = mask;
        }
        self.clear_extra_bits();
    }

    /// Returns `true` if the `BitArray` holds no bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bits in the `BitArray`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of set bits in the `BitArray`.
    ///
    /// This walks every block, so filters use their own counters on hot paths.
    pub fn count_ones(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| block.count_ones() as usize)
            .sum()
    }

    /// Returns the number of unset bits in the `BitArray`.
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }
}

static TRUE: bool = true;
static FALSE: bool = false;

impl Index<usize> for BitArray {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        if self.get(index).expect("Error: index out of bounds.") {
            &TRUE
        } else {
            &FALSE
        }
    }
}

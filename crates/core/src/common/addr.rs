//! Address decomposition.
//!
//! Splits a byte address into the set index and line tag used by the cache
//! models. It provides the following:
//! 1. **Index extraction:** `(addr >> idx_shift) & (sets - 1)`.
//! 2. **Tagging:** The tag is the whole line address (`addr >> idx_shift`), so it
//!    redundantly carries the index bits and is unique per line.
//! 3. **Reconstruction:** Line-aligned addresses for fills and writebacks.

/// Decomposes addresses for a fixed cache geometry.
///
/// The geometry must satisfy the power-of-two invariants enforced by
/// [`CacheConfig::validate`](crate::config::CacheConfig::validate); the decoder
/// itself performs no checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressDecoder {
    idx_shift: u32,
    set_mask: u64,
    line_bytes: u64,
}

impl AddressDecoder {
    /// Creates a decoder for `line_bytes`-byte lines spread over `sets` sets.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - Line size in bytes (power of two).
    /// * `sets` - Number of sets (power of two).
    pub fn new(line_bytes: usize, sets: usize) -> Self {
        Self {
            idx_shift: line_bytes.trailing_zeros(),
            set_mask: (sets as u64).wrapping_sub(1),
            line_bytes: line_bytes as u64,
        }
    }

    /// Returns `log2(line_bytes)`, the number of offset bits.
    #[inline(always)]
    pub const fn idx_shift(&self) -> u32 {
        self.idx_shift
    }

    /// Splits `addr` into `(set index, line tag)`.
    #[inline(always)]
    pub const fn decode(&self, addr: u64) -> (usize, u64) {
        let tag = addr >> self.idx_shift;
        ((tag & self.set_mask) as usize, tag)
    }

    /// Returns the address of the first byte of the line containing `addr`.
    #[inline(always)]
    pub const fn line_base(&self, addr: u64) -> u64 {
        addr & !(self.line_bytes - 1)
    }

    /// Rebuilds the line-aligned address of a line from its tag.
    #[inline(always)]
    pub const fn line_addr(&self, tag: u64) -> u64 {
        tag << self.idx_shift
    }
}

/// Splits `addr` into `(set index, line tag)` for a one-off geometry.
///
/// Equivalent to `AddressDecoder::new(line_bytes, sets).decode(addr)`.
pub fn decode(addr: u64, line_bytes: usize, sets: usize) -> (usize, u64) {
    AddressDecoder::new(line_bytes, sets).decode(addr)
}

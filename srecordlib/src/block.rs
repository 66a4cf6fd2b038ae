//! The `block` module provides [`Block`], one contiguous run of bytes at a start address.

/// A contiguous run of bytes starting at `sadr()`. The end address `eadr()` is one
/// past the last byte (half-open range).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    address: u64,
    bytes: Vec<u8>,
}

impl Block {
    /// Creates a block holding `bytes` at `address`.
    ///
    /// # Example
    /// ```
    /// use srecordlib::Block;
    ///
    /// let blk = Block::new(0x20, vec![0, 1, 2, 3]);
    /// assert_eq!(blk.sadr(), 0x20);
    /// assert_eq!(blk.eadr(), 0x24);
    /// ```
    #[must_use]
    pub const fn new(address: u64, bytes: Vec<u8>) -> Self {
        Self { address, bytes }
    }

    #[must_use]
    pub const fn sadr(&self) -> u64 {
        self.address
    }

    pub const fn set_sadr(&mut self, address: u64) {
        self.address = address;
    }

    /// First address behind the block (start address + size), saturating at
    /// `u64::MAX`.
    #[must_use]
    pub fn eadr(&self) -> u64 {
        self.address.saturating_add(self.bytes.len() as u64)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[allow(clippy::cast_possible_truncation)]
    /// Returns a copy of the bytes of this block that lie in `[start_address, end_address)`.
    /// The returned block covers only the matching part, so its address range may be
    /// narrower than requested (or empty).
    ///
    /// # Example
    /// ```
    /// use srecordlib::Block;
    ///
    /// let blk = Block::new(0x20, (0..16).collect());
    /// let part = blk.get_range(0x00, 0x24);
    ///
    /// assert_eq!(part.sadr(), 0x20);
    /// assert_eq!(part.bytes(), &[0, 1, 2, 3]);
    /// ```
    #[must_use]
    pub fn get_range(&self, start_address: u64, end_address: u64) -> Self {
        let start = start_address.max(self.sadr());
        let end = end_address.min(self.eadr());
        if start >= end {
            return Self::new(start, Vec::new());
        }
        let from = (start - self.sadr()) as usize;
        let to = (end - self.sadr()) as usize;
        Self::new(start, self.bytes[from..to].to_vec())
    }

    /// Returns true if at least one byte of the block lies in `[start_address, end_address)`.
    #[must_use]
    pub fn in_range(&self, start_address: u64, end_address: u64) -> bool {
        end_address >= start_address
            && !(start_address >= self.eadr() || end_address <= self.sadr())
    }
}

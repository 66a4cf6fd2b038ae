//! The `srecord` module provides the [`SRecord`] struct, a high-level API for
//! managing Motorola S-Record data.
//!
//! The data is held as a sparse memory image: an address-ordered list of
//! non-overlapping [`Block`]s. Every public mutation leaves the list canonical, i.e.
//! sorted, without empty blocks and with touching blocks coalesced into one. Any
//! block reference obtained before a mutating call must be considered stale after it.
//!
//! Parsing lives in the `parser` module and composition in the `composer` module;
//! both extend [`SRecord`] with further `impl` blocks.

use crate::block::Block;
use crate::error::{SRecordError, SRecordErrorKind};
use crate::record::AddressWidth;
use crate::search::{self, SearchType};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Byte order for multi-byte reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

/// Minimum S0 header payload: 10 bytes module name (+ version, revision, description).
pub(crate) const MIN_HEADER_LEN: usize = 10;
const MAX_HEADER_STR_LEN: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SRecord {
    /// S-Record file path (empty if not loaded from a file)
    pub filepath: PathBuf,
    /// Address width of the data lines (S1/S2/S3), `None` = infer on validation
    pub(crate) address_width: Option<AddressWidth>,
    /// Start address from the S7/S8/S9 line
    pub(crate) start_address: u64,
    /// S0 payload
    pub(crate) header: Vec<u8>,
    /// Canonical list of data blocks
    pub(crate) blocks: Vec<Block>,
    /// First error encountered, blocks further processing until `clear()`
    pub(crate) error: Option<SRecordError>,
    /// Value read from addresses that hold no data
    default_value: u8,
    /// Reject records lacking conventional elements (S0, matching S7/S8/S9, ...)
    strict_parsing: bool,
}

impl Default for SRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a SRecord {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;
    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl SRecord {
    /// Creates empty `SRecord` struct instance.
    ///
    /// # Examples
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::new();
    /// assert!(srec.good());
    /// assert!(srec.blocks().is_empty());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filepath: PathBuf::new(),
            address_width: None,
            start_address: 0,
            header: Vec::new(),
            blocks: Vec::new(),
            error: None,
            default_value: 0x00,
            strict_parsing: false,
        }
    }

    /// Clears loaded data and resets the error. Keeps the default value and
    /// the strict parsing setting.
    ///
    /// # Examples
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let mut srec = SRecord::from_srec("tests/fixtures/example.s19").unwrap();
    /// assert!(!srec.blocks().is_empty());
    ///
    /// srec.clear();
    /// assert!(srec.blocks().is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.filepath.clear();
        self.address_width = None;
        self.start_address = 0;
        self.header.clear();
        self.blocks.clear();
        self.error = None;
    }

    // ================================ ERROR STATE ================================

    /// Returns true if the instance has no error.
    #[must_use]
    pub const fn good(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the error latched on this instance, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&SRecordError> {
        self.error.as_ref()
    }

    /// Line number (1-based) of the last parse error, or 0.
    #[must_use]
    pub const fn parser_line(&self) -> usize {
        match self.error {
            Some(SRecordError::ParseRecordError(_, line)) => line,
            _ => 0,
        }
    }

    /// Address of the last validation error, or 0.
    #[must_use]
    pub const fn error_address(&self) -> u64 {
        match self.error {
            Some(SRecordError::ValidateError(_, address)) => address,
            _ => 0,
        }
    }

    /// Latches `err` unless an earlier error is already set, returns the latched error.
    pub(crate) fn fail(&mut self, err: SRecordError) -> SRecordError {
        let latched = self.error.get_or_insert(err).clone();
        tracing::warn!(error = %latched, "S-Record error latched");
        latched
    }

    pub(crate) fn ensure_good(&self) -> Result<(), SRecordError> {
        self.error.as_ref().map_or(Ok(()), |err| Err(err.clone()))
    }

    // ================================= SETTINGS =================================

    /// Value read in unassigned address ranges (e.g. 0x00 for zeroed RAM, 0xFF for
    /// erased flash).
    #[must_use]
    pub const fn default_value(&self) -> u8 {
        self.default_value
    }

    pub const fn set_default_value(&mut self, value: u8) {
        self.default_value = value;
    }

    #[must_use]
    pub const fn strict_parsing(&self) -> bool {
        self.strict_parsing
    }

    /// Strict parsing raises errors for incomplete records, e.g. a missing S0 or a
    /// termination line that does not match the data line type.
    pub const fn set_strict_parsing(&mut self, strict: bool) {
        self.strict_parsing = strict;
    }

    // ================================= METADATA =================================

    /// Address width of the data lines. `None` until set or inferred.
    #[must_use]
    pub const fn address_width(&self) -> Option<AddressWidth> {
        self.address_width
    }

    pub const fn set_address_width(&mut self, width: Option<AddressWidth>) {
        self.address_width = width;
    }

    /// Start address written to / read from the S7/S8/S9 line.
    #[must_use]
    pub const fn start_address_definition(&self) -> u64 {
        self.start_address
    }

    pub const fn set_start_address_definition(&mut self, address: u64) {
        self.start_address = address;
    }

    /// S0 payload bytes.
    #[must_use]
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Sets the S0 payload, padded with zeros to at least 10 bytes
    /// (module name 10 bytes, version, revision, description).
    pub fn set_header(&mut self, header: &[u8]) {
        self.header = header.to_vec();
        if self.header.len() < MIN_HEADER_LEN {
            self.header.resize(MIN_HEADER_LEN, 0);
        }
    }

    /// S0 payload as text, up to the first NUL, trailing whitespace removed.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::from_srec("tests/fixtures/example.s19").unwrap();
    /// assert_eq!(srec.header_str(), "hello!");
    /// ```
    #[must_use]
    pub fn header_str(&self) -> String {
        let end = self
            .header
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.header.len());
        let text: String = self.header[..end].iter().map(|&b| char::from(b)).collect();
        text.trim_end().to_string()
    }

    /// Sets the S0 payload from text, keeping at most 25 characters.
    pub fn set_header_str(&mut self, text: &str) {
        let bytes: Vec<u8> = text.bytes().take(MAX_HEADER_STR_LEN).collect();
        self.set_header(&bytes);
    }

    // ================================== BLOCKS ==================================

    /// Canonical, address-ordered data blocks.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Get an iterator over the data blocks.
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.into_iter()
    }

    /// First address holding data, 0 if there is none.
    #[must_use]
    pub fn sadr(&self) -> u64 {
        self.blocks.first().map_or(0, Block::sadr)
    }

    /// One past the last address holding data, 0 if there is none.
    #[must_use]
    pub fn eadr(&self) -> u64 {
        self.blocks.last().map_or(0, Block::eadr)
    }

    /// Total number of stored bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// Sorts blocks, drops empty ones and coalesces touching neighbours.
    pub(crate) fn canonicalize(&mut self) {
        let mut blocks = std::mem::take(&mut self.blocks);
        blocks.retain(|b| !b.is_empty());
        blocks.sort_by_key(Block::sadr);

        let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(last) = out.last_mut()
                && last.eadr() == block.sadr()
            {
                last.bytes_mut().extend(block.into_bytes());
                continue;
            }
            out.push(block);
        }
        self.blocks = out;
    }

    /// Checks the data image. If no address width is set, it is set to the smallest
    /// one fitting the data. A width that is set but too small is an error in strict
    /// mode and silently widened otherwise.
    ///
    /// # Errors
    /// - `RecordRangeExceeded` if data lies beyond the 32-bit address space
    /// - `RecordTypeTooSmall` if the set address width cannot hold the data (strict)
    /// - `NoBinaryData` if there are no blocks
    /// - `BlocksUnordered` / `OverlappingBlocks` if the block list is inconsistent
    pub fn validate(&mut self, strict: bool) -> Result<(), SRecordError> {
        self.ensure_good()?;

        // Check/set address width
        if let Some(block) = self
            .blocks
            .iter()
            .find(|b| AddressWidth::for_end_address(b.eadr()).is_none())
        {
            let address = block.sadr().max(AddressWidth::Bits32.limit());
            return Err(self.fail(SRecordError::ValidateError(
                SRecordErrorKind::RecordRangeExceeded,
                address,
            )));
        }
        let needed = self
            .blocks
            .iter()
            .filter_map(|b| AddressWidth::for_end_address(b.eadr()))
            .max()
            .unwrap_or(AddressWidth::Bits16);
        match self.address_width {
            Some(width) if width < needed => {
                if strict {
                    let address = self
                        .blocks
                        .iter()
                        .find(|b| b.eadr() > width.limit())
                        .map_or(0, |b| b.sadr().max(width.limit()));
                    return Err(self.fail(SRecordError::ValidateError(
                        SRecordErrorKind::RecordTypeTooSmall,
                        address,
                    )));
                }
                self.address_width = Some(needed);
            }
            Some(_) => {}
            None => self.address_width = Some(needed),
        }

        if self.blocks.is_empty() {
            return Err(self.fail(SRecordError::ValidateError(
                SRecordErrorKind::NoBinaryData,
                0,
            )));
        }

        // Block range check
        let collision = self.blocks.windows(2).find_map(|pair| {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.sadr() < prev.sadr() {
                Some((SRecordErrorKind::BlocksUnordered, next.sadr()))
            } else if prev.eadr() > next.sadr() {
                Some((SRecordErrorKind::OverlappingBlocks, next.sadr()))
            } else {
                None
            }
        });
        if let Some((kind, address)) = collision {
            return Err(self.fail(SRecordError::ValidateError(kind, address)));
        }
        Ok(())
    }

    // ============================== RANGE ACCESS ===============================

    /// Returns copies of the stored data intersecting `[start_address, end_address)`,
    /// ordered by address. Gaps stay gaps.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::new(0x20, vec![0; 16])).unwrap();
    /// srec.set_range(Block::new(0x40, vec![0; 16])).unwrap();
    ///
    /// assert_eq!(srec.get_ranges(0x00, 0x20).len(), 0);
    /// assert_eq!(srec.get_ranges(0x00, 0x41).len(), 2);
    /// ```
    #[must_use]
    pub fn get_ranges(&self, start_address: u64, end_address: u64) -> Vec<Block> {
        if start_address >= end_address {
            return Vec::new();
        }
        let mut ranges: Vec<Block> = self
            .blocks
            .iter()
            .map(|b| b.get_range(start_address, end_address))
            .filter(|b| !b.is_empty())
            .collect();
        ranges.sort_by_key(Block::sadr);
        ranges
    }

    #[allow(clippy::cast_possible_truncation)]
    /// Returns one block covering exactly `[start_address, end_address)`. Addresses
    /// without data read as `fill_value`.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::new(0x02, vec![0xAA, 0xBB])).unwrap();
    ///
    /// let blk = srec.get_range(0x00, 0x06, 0xFF);
    /// assert_eq!(blk.bytes(), &[0xFF, 0xFF, 0xAA, 0xBB, 0xFF, 0xFF]);
    /// ```
    #[must_use]
    pub fn get_range(&self, start_address: u64, end_address: u64, fill_value: u8) -> Block {
        if start_address >= end_address {
            return Block::new(start_address, Vec::new());
        }
        let mut bytes = vec![fill_value; (end_address - start_address) as usize];
        for part in self.get_ranges(start_address, end_address) {
            let offset = (part.sadr() - start_address) as usize;
            bytes[offset..offset + part.len()].copy_from_slice(part.bytes());
        }
        Block::new(start_address, bytes)
    }

    /// Like [`SRecord::get_range`], filling with the instance default value.
    #[must_use]
    pub fn get_range_default(&self, start_address: u64, end_address: u64) -> Block {
        self.get_range(start_address, end_address, self.default_value)
    }

    /// Copies `block` into the image, overwriting existing data in its span and
    /// extending the image where needed. Touching blocks are merged afterwards.
    ///
    /// # Errors
    /// Returns the latched error if the instance is not `good()`, or
    /// `InvalidAddress` if the block runs past the end of the address space.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::new(0x00, vec![1, 2, 3, 4])).unwrap();
    /// srec.set_range(Block::new(0x04, vec![5, 6])).unwrap();
    ///
    /// assert_eq!(srec.blocks().len(), 1);
    /// assert_eq!(srec.eadr(), 0x06);
    /// ```
    pub fn set_range(&mut self, block: Block) -> Result<(), SRecordError> {
        self.ensure_good()?;
        if block.is_empty() {
            return Ok(());
        }
        if block.sadr().checked_add(block.len() as u64).is_none() {
            return Err(self.fail(SRecordError::UpdateError(
                SRecordErrorKind::InvalidAddress(block.sadr()),
            )));
        }

        let (start, end) = (block.sadr(), block.eadr());
        let mut kept = Vec::with_capacity(self.blocks.len() + 2);
        for existing in std::mem::take(&mut self.blocks) {
            if existing.in_range(start, end) {
                // Keep what sticks out in front of and behind the new span
                kept.push(existing.get_range(existing.sadr(), start));
                kept.push(existing.get_range(end, existing.eadr()));
            } else {
                kept.push(existing);
            }
        }
        kept.push(block);

        self.blocks = kept;
        self.canonicalize();
        Ok(())
    }

    /// Copies `bytes` into the image starting at `address`.
    ///
    /// # Errors
    /// Same as [`SRecord::set_range`].
    pub fn set_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<(), SRecordError> {
        self.set_range(Block::new(address, bytes.to_vec()))
    }

    /// Removes all data in `[start_address, end_address)`, trimming or splitting the
    /// affected blocks.
    ///
    /// # Errors
    /// Returns the latched error if the instance is not `good()`.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::new(0x20, vec![0; 0x70])).unwrap();
    /// srec.remove_range(0x24, 0x28).unwrap();
    ///
    /// assert_eq!(srec.blocks().len(), 2);
    /// assert_eq!(srec.blocks()[0].eadr(), 0x24);
    /// assert_eq!(srec.blocks()[1].sadr(), 0x28);
    /// ```
    pub fn remove_range(&mut self, start_address: u64, end_address: u64) -> Result<(), SRecordError> {
        self.ensure_good()?;
        if start_address >= end_address
            || !self.blocks.iter().any(|b| b.in_range(start_address, end_address))
        {
            return Ok(());
        }

        let mut kept = Vec::with_capacity(self.blocks.len() + 1);
        for existing in std::mem::take(&mut self.blocks) {
            if existing.in_range(start_address, end_address) {
                kept.push(existing.get_range(existing.sadr(), start_address));
                kept.push(existing.get_range(end_address, existing.eadr()));
            } else {
                kept.push(existing);
            }
        }

        self.blocks = kept;
        self.canonicalize();
        Ok(())
    }

    /// Connects all blocks into one, filling gaps with `fill_value`. Where blocks
    /// overlap, the block with the higher start address wins. Returns a copy of the
    /// resulting block (empty if the image holds no data).
    ///
    /// # Errors
    /// Returns the latched error if the instance is not `good()`.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::new(0x20, vec![1; 16])).unwrap();
    /// srec.set_range(Block::new(0x40, vec![2; 16])).unwrap();
    ///
    /// let merged = srec.merge(0xFE).unwrap();
    /// assert_eq!(merged.len(), 0x30);
    /// assert_eq!(srec.get_byte(0x30), Some(0xFE));
    /// ```
    pub fn merge(&mut self, fill_value: u8) -> Result<Block, SRecordError> {
        self.ensure_good()?;
        let merged = connect(std::mem::take(&mut self.blocks), fill_value);
        if !merged.is_empty() {
            self.blocks.push(merged.clone());
        }
        Ok(merged)
    }

    /// Like [`SRecord::merge`], filling with the instance default value.
    ///
    /// # Errors
    /// Returns the latched error if the instance is not `good()`.
    pub fn merge_default(&mut self) -> Result<Block, SRecordError> {
        self.merge(self.default_value)
    }

    /// Returns the lowest address at or after `start_address` where `sequence` is
    /// stored contiguously, or `eadr()` if it is not found (or empty). Matches never
    /// span a gap between blocks.
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_range(Block::new(0x20, (0..8).collect())).unwrap();
    ///
    /// assert_eq!(srec.find(&[0x01, 0x02], 0), 0x21);
    /// assert_eq!(srec.find(&[0x01, 0x02], 0x22), srec.eadr());
    /// ```
    #[must_use]
    pub fn find(&self, sequence: &[u8], start_address: u64) -> u64 {
        search::find_first(self.blocks.iter(), sequence, start_address).unwrap_or_else(|| self.eadr())
    }

    /// Returns the addresses of all matches of a hex, ASCII or regex pattern.
    #[must_use]
    pub fn search(&self, search_type: &SearchType) -> Vec<u64> {
        search::search(self.blocks.iter(), search_type)
    }

    // =============================== TYPED READS ================================

    #[allow(clippy::cast_possible_truncation)]
    /// Get byte at the provided address, `None` if no data is stored there.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::from_srec("tests/fixtures/example.s19").unwrap();
    /// assert_eq!(srec.get_byte(0x0), Some(0x7C));
    /// assert_eq!(srec.get_byte(0x46), None);
    /// ```
    #[must_use]
    pub fn get_byte(&self, address: u64) -> Option<u8> {
        let idx = self.blocks.partition_point(|b| b.eadr() <= address);
        let block = self.blocks.get(idx)?;
        if address < block.sadr() {
            return None;
        }
        block.bytes().get((address - block.sadr()) as usize).copied()
    }

    #[allow(clippy::cast_possible_truncation)]
    /// Get `len` bytes starting at `address`. Returns `None` unless every byte in the
    /// span holds data.
    #[must_use]
    pub fn get_bytes(&self, address: u64, len: usize) -> Option<Vec<u8>> {
        let idx = self.blocks.partition_point(|b| b.eadr() <= address);
        let block = self.blocks.get(idx)?;
        if address < block.sadr() {
            return None;
        }
        let from = (address - block.sadr()) as usize;
        block.bytes().get(from..from.checked_add(len)?).map(<[u8]>::to_vec)
    }

    fn get_array<const N: usize>(&self, address: u64) -> Option<[u8; N]> {
        self.get_bytes(address, N)?.try_into().ok()
    }

    #[must_use]
    pub fn get_u16(&self, address: u64, endianness: Endianness) -> Option<u16> {
        let raw = self.get_array::<2>(address)?;
        Some(match endianness {
            Endianness::Big => u16::from_be_bytes(raw),
            Endianness::Little => u16::from_le_bytes(raw),
        })
    }

    #[must_use]
    pub fn get_u32(&self, address: u64, endianness: Endianness) -> Option<u32> {
        let raw = self.get_array::<4>(address)?;
        Some(match endianness {
            Endianness::Big => u32::from_be_bytes(raw),
            Endianness::Little => u32::from_le_bytes(raw),
        })
    }

    #[must_use]
    pub fn get_u64(&self, address: u64, endianness: Endianness) -> Option<u64> {
        let raw = self.get_array::<8>(address)?;
        Some(match endianness {
            Endianness::Big => u64::from_be_bytes(raw),
            Endianness::Little => u64::from_le_bytes(raw),
        })
    }

    // ================================ BINARY I/O ================================

    /// Creates an `SRecord` instance and fills it with data from the provided binary.
    ///
    /// # Errors
    /// Returns `LoadError(OpenFailed)` if the file cannot be read.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let base_addr = 0x1000;
    /// let srec = SRecord::from_bin("tests/fixtures/example.bin", base_addr).unwrap();
    ///
    /// assert_eq!(srec.sadr(), 0x1000);
    /// assert_eq!(srec.size(), 70);
    /// ```
    pub fn from_bin<P: AsRef<Path>>(filepath: P, base_address: u64) -> Result<Self, SRecordError> {
        let mut srec = Self::new();
        srec.load_bin(filepath, base_address)?;
        Ok(srec)
    }

    /// Fills an `SRecord` instance with data from the provided binary.
    ///
    /// # Errors
    /// Returns `LoadError(OpenFailed)` if the file cannot be read.
    pub fn load_bin<P: AsRef<Path>>(
        &mut self,
        filepath: P,
        base_address: u64,
    ) -> Result<(), SRecordError> {
        // Clear provided SRecord instance
        self.clear();

        // Bin only contains data bytes, thus read as Vec<u8>
        let data = match std::fs::read(&filepath) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(path = %filepath.as_ref().display(), %err, "reading binary failed");
                return Err(self.fail(SRecordError::LoadError(SRecordErrorKind::OpenFailed)));
            }
        };

        self.filepath = filepath.as_ref().to_path_buf();
        self.blocks.push(Block::new(base_address, data));
        self.canonicalize();

        tracing::debug!(path = %self.filepath.display(), size = self.size(), "binary loaded");
        Ok(())
    }

    /// Generates a binary file at the specified path.
    /// Address gaps are filled with the provided `gap_fill` byte (usually 0x00 or 0xFF).
    ///
    /// # Errors
    /// Returns an error if the instance is not `good()` or the file cannot be written.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::from_srec("tests/fixtures/example.s19").unwrap();
    /// srec.write_bin("build/ex3/example.bin", 0x00).unwrap();
    ///
    /// assert_eq!(std::fs::metadata("build/ex3/example.bin").unwrap().len(), 70);
    /// ```
    pub fn write_bin<P: AsRef<Path>>(&self, filepath: P, gap_fill: u8) -> Result<(), Box<dyn Error>> {
        self.ensure_good()?;

        // Ensure the parent directory exists
        if let Some(parent) = filepath.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(filepath)?;

        let mut writer = std::io::BufWriter::new(file);

        let image = self.get_range(self.sadr(), self.eadr(), gap_fill);
        writer.write_all(image.bytes())?;
        writer.flush()?;

        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
/// Connects blocks in address order into one, filling gaps with `fill_value` and
/// truncating the tail of a block that overlaps its successor.
fn connect(mut blocks: Vec<Block>, fill_value: u8) -> Block {
    blocks.sort_by_key(Block::sadr);
    let mut iter = blocks.into_iter();
    let Some(mut merged) = iter.next() else {
        return Block::default();
    };
    for block in iter {
        let offset = (block.sadr() - merged.sadr()) as usize;
        merged.bytes_mut().resize(offset, fill_value);
        merged.bytes_mut().extend_from_slice(block.bytes());
    }
    merged
}

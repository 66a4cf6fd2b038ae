//! The `composer` module generates S-Record text from an [`SRecord`] image.
//!
//! Output layout: one S0 line, the data lines of all blocks in address order, one
//! S5/S6 line count and one S7/S8/S9 termination line. Every line ends with `\n`.

use crate::error::{SRecordError, SRecordErrorKind};
use crate::record::{AddressWidth, LARGEST_LINE, Record, RecordType};
use crate::srecord::{MIN_HEADER_LEN, SRecord};
use std::error::Error;
use std::io::Write;
use std::path::Path;

/// Data bytes per line when no line length is requested.
const DEFAULT_DATA_BYTES: usize = 32;
const MIN_DATA_BYTES: usize = 4;

/// Number of data bytes per line for a requested total line length (in characters).
fn data_bytes_per_line(width: AddressWidth, line_length: Option<usize>) -> usize {
    // "Sx" + length byte + address + checksum byte
    let frame = 2 + 2 + 2 * width.data_record().address_len() + 2;
    line_length.map_or(DEFAULT_DATA_BYTES, |len| {
        (len.clamp(frame + 2 * MIN_DATA_BYTES, LARGEST_LINE) - frame) / 2
    })
}

/// Count line type holding `lines` data lines.
fn count_record(lines: u64) -> Result<RecordType, SRecordErrorKind> {
    match lines {
        0..=0xFFFF => Ok(RecordType::Count16),
        0x1_0000..=0xFF_FFFF => Ok(RecordType::Count24),
        _ => Err(SRecordErrorKind::TooManyDataLines),
    }
}

fn push_line(
    out: &mut String,
    rtype: RecordType,
    address: u64,
    data: &[u8],
) -> Result<(), SRecordErrorKind> {
    out.push_str(&Record::create(rtype, address, data)?);
    out.push('\n');
    Ok(())
}

impl SRecord {
    /// Generates the S-Record text of this instance. `line_length` is the total number
    /// of characters per data line (without line feed); `None` gives 32 data bytes per
    /// line. The image is validated first (see [`SRecord::validate`]) using the
    /// instance's strict parsing setting.
    ///
    /// # Errors
    /// - the latched error if the instance is not `good()`
    /// - any validation error
    /// - `ComposeError(TooManyDataLines)` if the line count does not fit an S6 line
    ///
    /// # Example
    /// ```
    /// use srecordlib::{Block, SRecord};
    ///
    /// let mut srec = SRecord::new();
    /// srec.set_header_str("hello!");
    /// srec.set_range(Block::new(0x0000, vec![0xAB, 0xCD])).unwrap();
    ///
    /// let text = srec.compose(None).unwrap();
    /// assert_eq!(
    ///     text,
    ///     "S00D000068656C6C6F2100000000BD\nS1050000ABCD82\nS5030001FB\nS9030000FC\n"
    /// );
    /// ```
    pub fn compose(&mut self, line_length: Option<usize>) -> Result<String, SRecordError> {
        self.ensure_good()?;
        self.validate(self.strict_parsing())?;

        // Set by validate()
        let width = self.address_width.unwrap_or(AddressWidth::Bits32);
        let data_per_line = data_bytes_per_line(width, line_length);

        let (text, data_lines) = self
            .compose_lines(width, data_per_line)
            .map_err(|kind| self.fail(SRecordError::ComposeError(kind)))?;

        tracing::debug!(data_lines, data_per_line, ?width, "S-Record composed");
        Ok(text)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn compose_lines(
        &self,
        width: AddressWidth,
        data_per_line: usize,
    ) -> Result<(String, u64), SRecordErrorKind> {
        let data_lines: u64 = self
            .blocks
            .iter()
            .map(|block| block.len().div_ceil(data_per_line) as u64)
            .sum();
        let count_type = count_record(data_lines)?;

        let mut out = String::new();

        // Header
        let mut header = self.header.clone();
        if header.len() < MIN_HEADER_LEN {
            header.resize(MIN_HEADER_LEN, 0);
        }
        push_line(&mut out, RecordType::Header, 0, &header)?;

        // Data
        for block in &self.blocks {
            let mut address = block.sadr();
            for chunk in block.bytes().chunks(data_per_line) {
                push_line(&mut out, width.data_record(), address, chunk)?;
                address += chunk.len() as u64;
            }
        }

        // Line count
        push_line(&mut out, count_type, data_lines, &[])?;

        // Start address, truncated to the address width
        push_line(
            &mut out,
            width.termination_record(),
            self.start_address,
            &[],
        )?;

        Ok((out, data_lines))
    }

    /// Generates an S-Record file at the specified path.
    ///
    /// # Errors
    /// Returns an error if composing fails or the file cannot be written.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let mut srec = SRecord::from_srec("tests/fixtures/example.s19").unwrap();
    /// srec.write_srec("build/ex1/example.s19", Some(26)).unwrap();
    ///
    /// let reread = SRecord::from_srec("build/ex1/example.s19").unwrap();
    /// assert_eq!(reread.blocks(), srec.blocks());
    /// ```
    pub fn write_srec<P: AsRef<Path>>(
        &mut self,
        filepath: P,
        line_length: Option<usize>,
    ) -> Result<(), Box<dyn Error>> {
        let text = self.compose(line_length)?;

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
        writer.write_all(text.as_bytes())?;
        writer.flush()?;

        Ok(())
    }
}

//! The `parser` module turns S-Record text into an [`SRecord`] image.
//!
//! Lines are classified one by one and collected for the current record. A record
//! ends at the end of input, at a line that does not start with 'S' (unless the whole
//! input must be consumed), or at an S0 line that does not open the record. The line
//! ending a record is only peeked at, never consumed, so the next record can be parsed
//! from the returned remainder (see [`SRecordStream`]).

use crate::block::Block;
use crate::error::{SRecordError, SRecordErrorKind};
use crate::record::{Record, RecordType};
use crate::srecord::SRecord;
use std::path::Path;

/// Line-wise view of the input with one line of lookahead.
#[derive(Debug, Clone)]
pub(crate) struct LineCursor<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> LineCursor<'a> {
    pub(crate) const fn new(text: &'a str) -> Self {
        Self {
            rest: text,
            line: 0,
        }
    }

    /// Next line (without line feed) and its 1-based line number. Not consumed.
    fn peek(&self) -> Option<(&'a str, usize)> {
        if self.rest.is_empty() {
            return None;
        }
        let line = self.rest.split_once('\n').map_or(self.rest, |(line, _)| line);
        Some((line, self.line + 1))
    }

    fn advance(&mut self) {
        self.rest = self.rest.split_once('\n').map_or("", |(_, rest)| rest);
        self.line += 1;
    }

    /// Skips lines holding only whitespace, returns the next non-blank line stripped.
    fn skip_blank(&mut self) -> Option<(String, usize)> {
        while let Some((raw, line)) = self.peek() {
            let stripped = strip_whitespace(raw);
            if !stripped.is_empty() {
                return Some((stripped, line));
            }
            self.advance();
        }
        None
    }

    pub(crate) const fn rest(&self) -> &'a str {
        self.rest
    }
}

fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn starts_with_s(line: &str) -> bool {
    line.starts_with(['S', 's'])
}

/// Classified line with its position in the input.
#[derive(Debug)]
struct ParsedLine {
    record: Record,
    line: usize,
}

impl SRecord {
    /// Creates an `SRecord` instance from S-Record text. The whole text must form
    /// exactly one record.
    ///
    /// # Errors
    /// See [`SRecord::parse`].
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let text = "S00F000068656C6C6F212020202000003B\nS111003848656C6C6F20776F726C642E0A0042\nS9030000FC\n";
    /// let srec = SRecord::from_srec_str(text).unwrap();
    ///
    /// assert_eq!(srec.sadr(), 0x38);
    /// assert_eq!(srec.get_bytes(0x38, 5).unwrap(), b"Hello");
    /// ```
    pub fn from_srec_str(text: &str) -> Result<Self, SRecordError> {
        let mut srec = Self::new();
        srec.parse(text)?;
        Ok(srec)
    }

    /// Parses S-Record text into this instance, consuming all of it. The strict
    /// parsing setting and default value are kept, everything else is replaced.
    ///
    /// # Errors
    /// Returns the first parse or validation error, or
    /// `ParseRecordError(UnconsumedInput, line)` if another record starts at `line`.
    /// The error is latched as well.
    pub fn parse(&mut self, text: &str) -> Result<(), SRecordError> {
        let mut cursor = LineCursor::new(text);
        self.parse_from(&mut cursor, true)?;
        if let Some((_, line)) = cursor.skip_blank() {
            return Err(self.fail(SRecordError::ParseRecordError(
                SRecordErrorKind::UnconsumedInput,
                line,
            )));
        }
        Ok(())
    }

    /// Parses one record from the start of `text` and returns the unparsed remainder.
    ///
    /// With `consume_to_end == false` a non-blank line not starting with 'S' ends the
    /// record without error. With `consume_to_end == true` such a line is an error.
    /// In both modes an S0 line after the first line of a record starts the next one.
    ///
    /// # Errors
    /// Returns the first parse or validation error; the error is latched as well.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let text = "S1050000ABCD82\nS9030000FC\n-- trailer --\n";
    /// let mut srec = SRecord::new();
    /// let rest = srec.parse_with(text, false).unwrap();
    ///
    /// assert_eq!(rest, "-- trailer --\n");
    /// assert_eq!(srec.get_u16(0, srecordlib::Endianness::Big), Some(0xABCD));
    /// ```
    pub fn parse_with<'t>(&mut self, text: &'t str, consume_to_end: bool) -> Result<&'t str, SRecordError> {
        let mut cursor = LineCursor::new(text);
        self.parse_from(&mut cursor, consume_to_end)?;
        Ok(cursor.rest())
    }

    /// Parses one record from the cursor position, leaving the cursor at the first line
    /// that does not belong to the record.
    pub(crate) fn parse_from(
        &mut self,
        cursor: &mut LineCursor<'_>,
        consume_to_end: bool,
    ) -> Result<(), SRecordError> {
        self.clear();

        let mut lines: Vec<ParsedLine> = Vec::new();
        while let Some((stripped, line)) = cursor.skip_blank() {
            if !consume_to_end && !starts_with_s(&stripped) {
                break;
            }
            let record = Record::parse(stripped.as_bytes())
                .map_err(|kind| self.fail(SRecordError::ParseRecordError(kind, line)))?;
            tracing::trace!(line, rtype = ?record.rtype, address = record.address, "line classified");

            // S0 past the first line belongs to the next record
            if record.rtype == RecordType::Header && !lines.is_empty() {
                break;
            }
            lines.push(ParsedLine { record, line });
            cursor.advance();
        }

        self.analyze(&lines, cursor.line.max(1))?;
        self.validate(self.strict_parsing())?;
        self.canonicalize();

        tracing::debug!(
            lines = lines.len(),
            blocks = self.blocks.len(),
            width = ?self.address_width,
            "S-Record parsed"
        );
        Ok(())
    }

    /// Folds the classified lines of one record into this instance and runs the
    /// cross-line checks.
    fn analyze(&mut self, lines: &[ParsedLine], end_line: usize) -> Result<(), SRecordError> {
        let strict = self.strict_parsing();
        let parse_err = |kind, line| SRecordError::ParseRecordError(kind, line);

        // Header
        let Some(first) = lines.first() else {
            return Err(self.fail(parse_err(SRecordErrorKind::MissingDataLines, end_line)));
        };
        let mut lines = lines;
        if first.record.rtype == RecordType::Header {
            self.header.clone_from(&first.record.data);
            lines = &lines[1..];
        } else if strict {
            return Err(self.fail(parse_err(SRecordErrorKind::MissingS0, first.line)));
        }

        // The first data line determines the data line type
        let Some(width) = lines
            .iter()
            .find(|l| l.record.rtype.is_data())
            .and_then(|l| l.record.rtype.address_width())
        else {
            return Err(self.fail(parse_err(SRecordErrorKind::MissingDataLines, end_line)));
        };
        self.address_width = Some(width);

        let mut data_lines: u64 = 0;
        let mut declared_count: Option<(u64, usize)> = None;
        let mut have_start_address = false;

        for parsed in lines {
            let line = parsed.line;
            let record = &parsed.record;
            match record.rtype {
                RecordType::Data16 | RecordType::Data24 | RecordType::Data32 => {
                    if strict && record.rtype != width.data_record() {
                        return Err(self.fail(parse_err(SRecordErrorKind::MixedDataLineTypes, line)));
                    }
                    self.push_data_line(record.address, &record.data);
                    data_lines += 1;
                }
                RecordType::Count16 | RecordType::Count24 => {
                    if declared_count.is_some() {
                        return Err(self.fail(parse_err(SRecordErrorKind::DuplicateDataCount, line)));
                    }
                    declared_count = Some((record.address, line));
                }
                RecordType::Start32 | RecordType::Start24 | RecordType::Start16 => {
                    if have_start_address {
                        return Err(self.fail(parse_err(SRecordErrorKind::DuplicateStartAddress, line)));
                    }
                    have_start_address = true;
                    if strict && record.rtype != width.termination_record() {
                        return Err(self.fail(parse_err(
                            SRecordErrorKind::StartAddressTypeMismatch,
                            line,
                        )));
                    }
                    self.start_address = record.address;
                }
                // Only possible as the first line, taken above
                RecordType::Header => {}
            }
        }

        if let Some((declared, line)) = declared_count
            && declared != data_lines
        {
            return Err(self.fail(parse_err(
                SRecordErrorKind::LineCountMismatch(declared, data_lines),
                line,
            )));
        }
        Ok(())
    }

    /// Appends a data line to the last block if it continues it, otherwise inserts it
    /// as a new block behind all blocks starting at or before its address.
    fn push_data_line(&mut self, address: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        if let Some(last) = self.blocks.last_mut()
            && last.eadr() == address
        {
            last.bytes_mut().extend_from_slice(data);
            return;
        }
        let idx = self.blocks.partition_point(|b| b.sadr() <= address);
        self.blocks.insert(idx, Block::new(address, data.to_vec()));
    }

    /// Creates an `SRecord` instance and fills it with data from the provided S-Record file.
    ///
    /// # Errors
    /// Returns `LoadError(OpenFailed)` if the file cannot be read, the parse or
    /// validation error if its content is invalid, and `LoadError(UnconsumedInput)` if
    /// the file holds more than one record.
    ///
    /// # Example
    /// ```
    /// use srecordlib::SRecord;
    ///
    /// let srec = SRecord::from_srec("tests/fixtures/example.s19").unwrap();
    ///
    /// assert_eq!(srec.sadr(), 0x0000);
    /// assert_eq!(srec.eadr(), 0x0046);
    /// ```
    pub fn from_srec<P: AsRef<Path>>(filepath: P) -> Result<Self, SRecordError> {
        let mut srec = Self::new();
        srec.load_srec(filepath)?;
        Ok(srec)
    }

    /// Fills an `SRecord` instance with data from the provided S-Record file.
    ///
    /// # Errors
    /// See [`SRecord::from_srec`].
    pub fn load_srec<P: AsRef<Path>>(&mut self, filepath: P) -> Result<(), SRecordError> {
        self.clear();

        let raw = match std::fs::read(&filepath) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(path = %filepath.as_ref().display(), %err, "reading S-Record failed");
                return Err(self.fail(SRecordError::LoadError(SRecordErrorKind::OpenFailed)));
            }
        };
        let text = String::from_utf8_lossy(&raw);

        let rest = self.parse_with(&text, true)?;
        if !rest.trim().is_empty() {
            return Err(self.fail(SRecordError::LoadError(SRecordErrorKind::UnconsumedInput)));
        }

        self.filepath = filepath.as_ref().to_path_buf();
        tracing::debug!(path = %self.filepath.display(), size = self.size(), "S-Record loaded");
        Ok(())
    }
}

/// Iterator over the records of a text holding several concatenated S-Records.
///
/// Each record is parsed into its own [`SRecord`]. Iteration stops after the first
/// error; a non-blank line not starting with 'S' between records is reported as
/// `LineNotStartingWithS`.
///
/// # Example
/// ```
/// use srecordlib::SRecordStream;
///
/// let text = "S0030000FC\nS1050000ABCD82\nS0030000FC\nS1050100ABCD81\n";
/// let records: Vec<_> = SRecordStream::new(text).collect::<Result<_, _>>().unwrap();
///
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].sadr(), 0x100);
/// ```
#[derive(Debug, Clone)]
pub struct SRecordStream<'a> {
    cursor: LineCursor<'a>,
    strict: bool,
    done: bool,
}

impl<'a> SRecordStream<'a> {
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self {
            cursor: LineCursor::new(text),
            strict: false,
            done: false,
        }
    }

    /// Parse every record in strict mode.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Input not yet parsed.
    #[must_use]
    pub const fn remainder(&self) -> &'a str {
        self.cursor.rest()
    }
}

impl Iterator for SRecordStream<'_> {
    type Item = Result<SRecord, SRecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some((head, line)) = self.cursor.skip_blank() else {
            self.done = true;
            return None;
        };
        if !starts_with_s(&head) {
            self.done = true;
            return Some(Err(SRecordError::ParseRecordError(
                SRecordErrorKind::LineNotStartingWithS,
                line,
            )));
        }

        let mut srec = SRecord::new();
        srec.set_strict_parsing(self.strict);
        match srec.parse_from(&mut self.cursor, false) {
            Ok(()) => Some(Ok(srec)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

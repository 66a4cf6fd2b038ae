//! The `error` module defines the [`SRecordError`] enum that describes the errors that
//! can occur when parsing, validating, modifying, or composing S-Records via [`SRecord`].
//! It carries three pieces of information:
//! 1. When the error occurs, e.g., during parsing, validation or composition.
//! 2. What kind of error was encountered (via [`SRecordErrorKind`] enum).
//! 3. Where it happened (if applicable): the 1-based line number for parse errors or
//!    the offending address for validation errors.
//!
//! [`SRecord`]: crate::SRecord

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SRecordError {
    ParseRecordError(SRecordErrorKind, usize),
    ValidateError(SRecordErrorKind, u64),
    ComposeError(SRecordErrorKind),
    UpdateError(SRecordErrorKind),
    LoadError(SRecordErrorKind),
}

impl SRecordError {
    /// Returns the kind of the error without its context.
    #[must_use]
    pub const fn kind(&self) -> SRecordErrorKind {
        match self {
            Self::ParseRecordError(kind, _)
            | Self::ValidateError(kind, _)
            | Self::ComposeError(kind)
            | Self::UpdateError(kind)
            | Self::LoadError(kind) => *kind,
        }
    }
}

impl fmt::Display for SRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseRecordError(base_err, line) => {
                write!(
                    f,
                    "Error encountered during record parsing at line #{line} of the S-Record:\n{base_err}",
                )
            }
            Self::ValidateError(base_err, address) => {
                write!(
                    f,
                    "Error encountered during validation of S-Record data at address 0x{address:X}:\n{base_err}",
                )
            }
            Self::ComposeError(base_err) => {
                write!(f, "Error encountered during S-Record composition:\n{base_err}")
            }
            Self::UpdateError(base_err) => {
                write!(
                    f,
                    "Error encountered during update of SRecord instance:\n{base_err}",
                )
            }
            Self::LoadError(base_err) => {
                write!(f, "Error encountered during loading of S-Record file:\n{base_err}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SRecordErrorKind {
    /// Line contains a character that is neither a hex digit nor the 'S' tag
    UnacceptableCharacter,
    /// Line does not begin with 'S'
    LineNotStartingWithS,
    /// Line length is odd, shorter than 10 or longer than 514 characters
    InvalidLineLength,
    /// Record type digit is S4 or not a digit at all
    InvalidRecordType,
    /// Record checksum mismatch (expected, found)
    ChecksumMismatch(u8, u8),
    /// Length byte disagrees with the number of bytes that follow it
    LengthMismatch,
    /// No S0 header line (strict parsing only)
    MissingS0,
    /// S0 address field is not zero
    S0AddressNonzero,
    /// Encountered second S5/S6 line
    DuplicateDataCount,
    /// S5/S6 line count differs from the data lines read (declared, actual)
    LineCountMismatch(u64, u64),
    /// Encountered second S7/S8/S9 line
    DuplicateStartAddress,
    /// S7/S8/S9 type does not match the S1/S2/S3 type (strict parsing only)
    StartAddressTypeMismatch,
    /// Record has no S1/S2/S3 lines
    MissingDataLines,
    /// Record mixes S1/S2/S3 lines (strict parsing only)
    MixedDataLineTypes,
    /// Data line count does not fit into an S6 line
    TooManyDataLines,
    /// Address width is too small for the stored data
    RecordTypeTooSmall,
    /// Data exceeds the 32-bit address space
    RecordRangeExceeded,
    /// `SRecord` instance has no data
    NoBinaryData,
    /// Blocks are not sorted by address
    BlocksUnordered,
    /// Blocks share addresses
    OverlappingBlocks,
    /// Address range overflows the 64-bit address space
    InvalidAddress(u64),
    /// File could not be opened or read
    OpenFailed,
    /// Input holds more data after the parsed record
    UnconsumedInput,
}

impl fmt::Display for SRecordErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnacceptableCharacter => {
                write!(f, "Unacceptable character")
            }
            Self::LineNotStartingWithS => {
                write!(f, "Line not starting with 'S'")
            }
            Self::InvalidLineLength => {
                write!(f, "Invalid line length")
            }
            Self::InvalidRecordType => {
                write!(f, "Invalid record type")
            }
            Self::ChecksumMismatch(expected, actual) => {
                write!(
                    f,
                    "Invalid line checksum - expected: 0x{expected:02X}, found: 0x{actual:02X}"
                )
            }
            Self::LengthMismatch => {
                write!(f, "Line data length mismatch")
            }
            Self::MissingS0 => {
                write!(f, "Missing record header (S0)")
            }
            Self::S0AddressNonzero => {
                write!(f, "S0 address field is nonzero")
            }
            Self::DuplicateDataCount => {
                write!(f, "Duplicate S5/S6 line found")
            }
            Self::LineCountMismatch(declared, actual) => {
                write!(
                    f,
                    "Number of data lines does not match the declaration (S5/S6) - declared: {declared}, found: {actual}"
                )
            }
            Self::DuplicateStartAddress => {
                write!(f, "Duplicate start address line (S7/S8/S9)")
            }
            Self::StartAddressTypeMismatch => {
                write!(f, "Start address line (S7/S8/S9) does not match the data line type")
            }
            Self::MissingDataLines => {
                write!(f, "Missing data lines (S1/S2/S3)")
            }
            Self::MixedDataLineTypes => {
                write!(f, "Mixed data types in one record (S1/S2/S3)")
            }
            Self::TooManyDataLines => {
                write!(f, "The output has too many data lines for the S5/S6 line")
            }
            Self::RecordTypeTooSmall => {
                write!(
                    f,
                    "The record type (S1/S2/S3) is too small for the needed address range"
                )
            }
            Self::RecordRangeExceeded => {
                write!(f, "The data range exceeds the greatest possible S-Record address")
            }
            Self::NoBinaryData => {
                write!(f, "SRecord instance has no data")
            }
            Self::BlocksUnordered => {
                write!(f, "Unordered data blocks detected")
            }
            Self::OverlappingBlocks => {
                write!(f, "Overlapping data blocks detected")
            }
            Self::InvalidAddress(address) => {
                write!(f, "Address range overflows at address: 0x{address:X}")
            }
            Self::OpenFailed => {
                write!(f, "Opening file failed")
            }
            Self::UnconsumedInput => {
                write!(f, "Input contains data after the end of the record")
            }
        }
    }
}

impl Error for SRecordError {}
impl Error for SRecordErrorKind {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strips_context() {
        // Arrange
        let err = SRecordError::ParseRecordError(SRecordErrorKind::ChecksumMismatch(0x26, 0x27), 2);

        // Act
        let kind = err.kind();

        // Assert
        assert_eq!(kind, SRecordErrorKind::ChecksumMismatch(0x26, 0x27));
    }

    #[test]
    fn test_display_contains_context() {
        // Arrange
        let parse_err = SRecordError::ParseRecordError(SRecordErrorKind::MissingS0, 7);
        let validate_err = SRecordError::ValidateError(SRecordErrorKind::OverlappingBlocks, 0x3A);

        // Act
        let parse_msg = parse_err.to_string();
        let validate_msg = validate_err.to_string();

        // Assert
        assert!(parse_msg.contains("line #7"));
        assert!(parse_msg.contains("S0"));
        assert!(validate_msg.contains("0x3A"));
    }

    #[test]
    fn test_display_address_overflow() {
        // Arrange
        let err = SRecordError::UpdateError(SRecordErrorKind::InvalidAddress(0xFFFF_FFFF_FFFF_FFFE));

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("update"));
        assert!(msg.contains("overflows"));
        assert!(msg.contains("0xFFFFFFFFFFFFFFFE"));
    }
}

//! The `record` module defines the [`Record`], [`RecordType`] and [`AddressWidth`] types
//! which are used for parsing (and generating) single S-Record lines.

use crate::error::SRecordErrorKind;

mod sizes {
    /// "S" + type digit + length byte + 2 address bytes + checksum byte
    pub const SMALLEST_LINE: usize = 10;
    /// "S" + type digit + 255 bytes (length byte excluded from its own count)
    pub const LARGEST_LINE: usize = 514;
    /// The length byte counts itself out, so at most 255 bytes follow it
    pub const MAX_LENGTH_FIELD: usize = 255;
}

pub(crate) use sizes::LARGEST_LINE;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// S-Record line type, given by the digit after the leading 'S'.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    Header = 0,
    Data16 = 1,
    Data24 = 2,
    Data32 = 3,
    Count16 = 5,
    Count24 = 6,
    Start32 = 7,
    Start24 = 8,
    Start16 = 9,
}

impl RecordType {
    /// Maps the type digit value (0-9) to the record type. S4 is reserved.
    ///
    /// # Errors
    /// Returns [`SRecordErrorKind::InvalidRecordType`] for S4 and values above 9.
    pub const fn from_digit(digit: u8) -> Result<Self, SRecordErrorKind> {
        match digit {
            0 => Ok(Self::Header),
            1 => Ok(Self::Data16),
            2 => Ok(Self::Data24),
            3 => Ok(Self::Data32),
            5 => Ok(Self::Count16),
            6 => Ok(Self::Count24),
            7 => Ok(Self::Start32),
            8 => Ok(Self::Start24),
            9 => Ok(Self::Start16),
            _ => Err(SRecordErrorKind::InvalidRecordType),
        }
    }

    /// Number of bytes in the address field of this line type.
    #[must_use]
    pub const fn address_len(self) -> usize {
        match self {
            Self::Header | Self::Data16 | Self::Count16 | Self::Start16 => 2,
            Self::Data24 | Self::Count24 | Self::Start24 => 3,
            Self::Data32 | Self::Start32 => 4,
        }
    }

    /// Address width of a data (S1/S2/S3) or termination (S7/S8/S9) line.
    #[must_use]
    pub const fn address_width(self) -> Option<AddressWidth> {
        match self {
            Self::Data16 | Self::Start16 => Some(AddressWidth::Bits16),
            Self::Data24 | Self::Start24 => Some(AddressWidth::Bits24),
            Self::Data32 | Self::Start32 => Some(AddressWidth::Bits32),
            Self::Header | Self::Count16 | Self::Count24 => None,
        }
    }

    #[must_use]
    pub const fn is_data(self) -> bool {
        matches!(self, Self::Data16 | Self::Data24 | Self::Data32)
    }

    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Count16 | Self::Count24)
    }

    #[must_use]
    pub const fn is_termination(self) -> bool {
        matches!(self, Self::Start32 | Self::Start24 | Self::Start16)
    }
}

/// Address width of the data lines in an S-Record (S1, S2 or S3).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AddressWidth {
    Bits16 = 1,
    Bits24 = 2,
    Bits32 = 3,
}

impl AddressWidth {
    /// Smallest width able to address every byte below `end_address`.
    /// Returns `None` if even 32 bits are not enough.
    #[must_use]
    pub const fn for_end_address(end_address: u64) -> Option<Self> {
        if end_address <= Self::Bits16.limit() {
            Some(Self::Bits16)
        } else if end_address <= Self::Bits24.limit() {
            Some(Self::Bits24)
        } else if end_address <= Self::Bits32.limit() {
            Some(Self::Bits32)
        } else {
            None
        }
    }

    /// One past the highest address representable with this width.
    #[must_use]
    pub const fn limit(self) -> u64 {
        match self {
            Self::Bits16 => 0x1_0000,
            Self::Bits24 => 0x100_0000,
            Self::Bits32 => 0x1_0000_0000,
        }
    }

    #[must_use]
    pub const fn data_record(self) -> RecordType {
        match self {
            Self::Bits16 => RecordType::Data16,
            Self::Bits24 => RecordType::Data24,
            Self::Bits32 => RecordType::Data32,
        }
    }

    /// Termination type is `10 - data type`, i.e. S9 for S1, S8 for S2, S7 for S3.
    #[must_use]
    pub const fn termination_record(self) -> RecordType {
        match self {
            Self::Bits16 => RecordType::Start16,
            Self::Bits24 => RecordType::Start24,
            Self::Bits32 => RecordType::Start32,
        }
    }
}

/// Encodes one byte as two uppercase hex characters.
#[must_use]
pub const fn encode_hex(byte: u8) -> [char; 2] {
    [
        HEX_DIGITS[(byte >> 4) as usize] as char,
        HEX_DIGITS[(byte & 0x0F) as usize] as char,
    ]
}

/// Decodes a pair of hex characters (either case) into one byte.
///
/// # Errors
/// Returns [`SRecordErrorKind::UnacceptableCharacter`] if a character is not a hex digit.
pub const fn decode_hex_pair(high: u8, low: u8) -> Result<u8, SRecordErrorKind> {
    const fn nibble(c: u8) -> Result<u8, SRecordErrorKind> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            _ => Err(SRecordErrorKind::UnacceptableCharacter),
        }
    }
    match (nibble(high), nibble(low)) {
        (Ok(h), Ok(l)) => Ok((h << 4) | l),
        _ => Err(SRecordErrorKind::UnacceptableCharacter),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) rtype: RecordType,
    pub(crate) address: u64,
    pub(crate) data: Vec<u8>,
}

impl Record {
    /// One's complement of the byte sum, truncated to one byte.
    pub(crate) fn calculate_checksum(bytes: &[u8]) -> u8 {
        !bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
    }

    #[allow(clippy::cast_possible_truncation)]
    /// Create the record line (without line terminator) from type, address and data.
    ///
    pub(crate) fn create(
        rtype: RecordType,
        address: u64,
        data: &[u8],
    ) -> Result<String, SRecordErrorKind> {
        let addr_len = rtype.address_len();
        let length = addr_len + data.len() + 1;
        if length > sizes::MAX_LENGTH_FIELD {
            return Err(SRecordErrorKind::InvalidLineLength);
        }

        // Length byte, big-endian address, payload
        let mut bytes = Vec::with_capacity(length + 1);
        bytes.push(length as u8);
        for shift in (0..addr_len).rev() {
            bytes.push((address >> (8 * shift)) as u8);
        }
        bytes.extend_from_slice(data);
        bytes.push(Self::calculate_checksum(&bytes));

        let mut line = String::with_capacity(2 + 2 * bytes.len());
        line.push('S');
        line.push(char::from(b'0' + rtype as u8));
        for b in bytes {
            line.extend(encode_hex(b));
        }
        Ok(line)
    }

    /// Parse one whitespace-free line into a Record.
    ///
    pub(crate) fn parse(line: &[u8]) -> Result<Self, SRecordErrorKind> {
        // Only hex digits and the leading tag are acceptable
        if !line
            .iter()
            .all(|c| c.is_ascii_hexdigit() || c.eq_ignore_ascii_case(&b'S'))
        {
            return Err(SRecordErrorKind::UnacceptableCharacter);
        }

        // Check for start tag
        if !line.first().is_some_and(|c| c.eq_ignore_ascii_case(&b'S')) {
            return Err(SRecordErrorKind::LineNotStartingWithS);
        }

        // Record type digit
        let Some(&type_char) = line.get(1) else {
            return Err(SRecordErrorKind::InvalidLineLength);
        };
        if !type_char.is_ascii_digit() {
            return Err(SRecordErrorKind::InvalidRecordType);
        }

        // Validate line's size
        if line.len() % 2 != 0
            || line.len() < sizes::SMALLEST_LINE
            || line.len() > sizes::LARGEST_LINE
        {
            return Err(SRecordErrorKind::InvalidLineLength);
        }

        // HEX -> bytes ('S' inside the hex part is rejected here)
        let bytes = line[2..]
            .chunks_exact(2)
            .map(|pair| decode_hex_pair(pair[0], pair[1]))
            .collect::<Result<Vec<u8>, _>>()?;

        // S4 is reserved
        let rtype = RecordType::from_digit(type_char - b'0')?;

        // Validate checksum over length, address and payload
        let (&checksum, body) = bytes
            .split_last()
            .ok_or(SRecordErrorKind::InvalidLineLength)?;
        let calc_checksum = Self::calculate_checksum(body);
        if calc_checksum != checksum {
            return Err(SRecordErrorKind::ChecksumMismatch(calc_checksum, checksum));
        }

        // Length byte counts address, payload and checksum
        let length = usize::from(body[0]);
        let addr_len = rtype.address_len();
        if length < 3 || length != bytes.len() - 1 || length < addr_len + 1 {
            return Err(SRecordErrorKind::LengthMismatch);
        }

        let (addr_bytes, data) = body[1..].split_at(addr_len);
        let address = addr_bytes
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

        if rtype == RecordType::Header && address != 0 {
            return Err(SRecordErrorKind::S0AddressNonzero);
        }

        Ok(Self {
            rtype,
            address,
            data: data.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns valid record lines and their decoded counterparts
    ///
    fn get_valid_records() -> [(&'static str, Record); 5] {
        [
            (
                "S00F000068656C6C6F212020202000003B",
                Record {
                    rtype: RecordType::Header,
                    address: 0,
                    data: b"hello!    \0\0".to_vec(),
                },
            ),
            (
                "S111003848656C6C6F20776F726C642E0A0042",
                Record {
                    rtype: RecordType::Data16,
                    address: 0x0038,
                    data: b"Hello world.\n\0".to_vec(),
                },
            ),
            (
                "S2080010007C0802A6BB",
                Record {
                    rtype: RecordType::Data24,
                    address: 0x1000,
                    data: vec![0x7C, 0x08, 0x02, 0xA6],
                },
            ),
            (
                "S5030003F9",
                Record {
                    rtype: RecordType::Count16,
                    address: 3,
                    data: vec![],
                },
            ),
            (
                "S9030000FC",
                Record {
                    rtype: RecordType::Start16,
                    address: 0,
                    data: vec![],
                },
            ),
        ]
    }

    /// Returns invalid record lines and corresponding errors
    ///
    fn get_invalid_records() -> [(&'static str, SRecordErrorKind); 10] {
        [
            // 'W' is not a hex digit
            ("S1050000W0FA", SRecordErrorKind::UnacceptableCharacter),
            // Tag replaced by a hex digit
            ("A11F00007C0802A6", SRecordErrorKind::LineNotStartingWithS),
            // 'C' is no record type digit
            ("SC1F00007C0802A6", SRecordErrorKind::InvalidRecordType),
            // S4 is reserved
            ("S4030000FC", SRecordErrorKind::InvalidRecordType),
            // Too short
            ("S00F0", SRecordErrorKind::InvalidLineLength),
            // Odd number of characters
            ("S00F000068656C6C6F21202020200000F3B", SRecordErrorKind::InvalidLineLength),
            // Checksum 0x26 -> 0x27
            (
                "S11F00007C0802A6900100049421FFF07C6C1B787C8C23783C6000003863000027",
                SRecordErrorKind::ChecksumMismatch(0x26, 0x27),
            ),
            // Length byte claims 4 bytes, 3 follow (checksum adjusted)
            ("S5040003F8", SRecordErrorKind::LengthMismatch),
            // S0 with address 0x0001
            ("S0030001FB", SRecordErrorKind::S0AddressNonzero),
            // 'S' inside the hex part
            ("S1030S00FC", SRecordErrorKind::UnacceptableCharacter),
        ]
    }

    #[test]
    fn test_record_type_from_digit() {
        assert_eq!(RecordType::from_digit(0), Ok(RecordType::Header));
        assert_eq!(RecordType::from_digit(3), Ok(RecordType::Data32));
        assert_eq!(RecordType::from_digit(6), Ok(RecordType::Count24));
        assert_eq!(RecordType::from_digit(9), Ok(RecordType::Start16));
        assert_eq!(
            RecordType::from_digit(4),
            Err(SRecordErrorKind::InvalidRecordType)
        );
        assert_eq!(
            RecordType::from_digit(10),
            Err(SRecordErrorKind::InvalidRecordType)
        );
    }

    #[test]
    fn test_address_width_for_end_address() {
        assert_eq!(AddressWidth::for_end_address(0), Some(AddressWidth::Bits16));
        assert_eq!(
            AddressWidth::for_end_address(0x1_0000),
            Some(AddressWidth::Bits16)
        );
        assert_eq!(
            AddressWidth::for_end_address(0x1_0001),
            Some(AddressWidth::Bits24)
        );
        assert_eq!(
            AddressWidth::for_end_address(0x100_0001),
            Some(AddressWidth::Bits32)
        );
        assert_eq!(AddressWidth::for_end_address(0x1_0000_0001), None);
    }

    #[test]
    fn test_termination_matches_data_type() {
        for width in [
            AddressWidth::Bits16,
            AddressWidth::Bits24,
            AddressWidth::Bits32,
        ] {
            assert_eq!(
                width.termination_record() as u8,
                10 - width.data_record() as u8
            );
        }
    }

    #[test]
    fn test_hex_codec() {
        assert_eq!(encode_hex(0x00), ['0', '0']);
        assert_eq!(encode_hex(0xA5), ['A', '5']);
        assert_eq!(decode_hex_pair(b'a', b'5'), Ok(0xA5));
        assert_eq!(decode_hex_pair(b'F', b'f'), Ok(0xFF));
        assert_eq!(
            decode_hex_pair(b'G', b'0'),
            Err(SRecordErrorKind::UnacceptableCharacter)
        );
    }

    #[test]
    fn test_calculate_checksum() {
        // Each tuple = (record line, expected checksum)
        let cases = [
            ("S00F000068656C6C6F212020202000003B", 0x3B),
            ("S5030003F9", 0xF9),
            ("S9030000FC", 0xFC),
        ];

        for (line, expected_checksum) in cases {
            // Strip tag, type and checksum
            let trimmed = &line.as_bytes()[2..line.len() - 2];
            let bytes: Vec<u8> = trimmed
                .chunks_exact(2)
                .map(|pair| decode_hex_pair(pair[0], pair[1]).unwrap())
                .collect();

            assert_eq!(expected_checksum, Record::calculate_checksum(&bytes));
        }
    }

    #[test]
    fn test_parse_valid_records() {
        for (line, expected) in get_valid_records() {
            assert_eq!(Record::parse(line.as_bytes()).unwrap(), expected);
        }
    }

    #[test]
    fn test_parse_lowercase_record() {
        let res = Record::parse(b"s5030003f9");
        assert_eq!(
            res,
            Ok(Record {
                rtype: RecordType::Count16,
                address: 3,
                data: vec![],
            })
        );
    }

    #[test]
    fn test_parse_invalid_records() {
        for (line, expected_error) in get_invalid_records() {
            assert_eq!(
                Record::parse(line.as_bytes()).unwrap_err(),
                expected_error,
                "line: {line}"
            );
        }
    }

    #[test]
    fn test_parse_line_too_long() {
        let mut line = String::from("S0");
        line.push_str(&"0".repeat(513));
        assert_eq!(
            Record::parse(line.as_bytes()),
            Err(SRecordErrorKind::InvalidLineLength)
        );
    }

    #[test]
    fn test_create_records() {
        for (line, record) in get_valid_records() {
            let created = Record::create(record.rtype, record.address, &record.data);
            assert_eq!(created.as_deref(), Ok(line));
        }
    }

    #[test]
    fn test_create_record_too_long() {
        let data = vec![0u8; 253];
        assert_eq!(
            Record::create(RecordType::Data16, 0, &data),
            Err(SRecordErrorKind::InvalidLineLength)
        );
    }
}

// psi/section.rs
//! Generic PSI section header reader (the 8 bytes shared by PAT and PMT).

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::constants::{CRC_SIZE, SECTION_HEADER_SIZE};
use crate::error::DecodeError;

/// How much a decoder trusts the length fields it reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Length fields are followed as-is; only reads past the packet fail.
    #[default]
    Permissive,
    /// Length fields must agree with each other and with the packet, the
    /// table_id must match, and PSI packets must not carry an adaptation field.
    Strict,
}

impl DecodeMode {
    pub fn is_strict(self) -> bool {
        self == DecodeMode::Strict
    }
}

/// Returned by [`SectionReader::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionReader {
    pub table_id: u8,
    pub section_syntax_indicator: bool,
    pub section_length: u16,
    /// transport_stream_id for a PAT, program_number for a PMT
    pub table_id_extension: u16,
    pub version_number: u8,
    pub current_next_indicator: bool,
    pub section_number: u8,
    pub last_section_number: u8,
}

impl SectionReader {
    /// Bytes taken by the fields above.
    pub const SIZE: usize = 8;

    /// Reads the common header from the first byte of `section` (pointer_field already skipped).
    pub fn new(section: &[u8]) -> Result<Self, DecodeError> {
        let mut br = BitReader::endian(section, BigEndian);

        let table_id = br.read::<8, u8>()?;
        let section_syntax_indicator = br.read_bit()?;
        br.skip(3)?; // '0' + reserved
        let section_length = br.read::<12, u16>()?;
        let table_id_extension = br.read::<16, u16>()?;
        br.skip(2)?; // reserved
        let version_number = br.read::<5, u8>()?;
        let current_next_indicator = br.read_bit()?;
        let section_number = br.read::<8, u8>()?;
        let last_section_number = br.read::<8, u8>()?;

        Ok(Self {
            table_id,
            section_syntax_indicator,
            section_length,
            table_id_extension,
            version_number,
            current_next_indicator,
            section_number,
            last_section_number,
        })
    }

    /// Strict-mode checks shared by every table: table_id and section_length
    /// against the bytes left in the packet.
    pub fn check(&self, expected_table_id: u8, available: usize) -> Result<(), DecodeError> {
        if self.table_id != expected_table_id {
            return Err(DecodeError::UnexpectedTableId {
                expected: expected_table_id,
                actual: self.table_id,
            });
        }
        let available = available.saturating_sub(SECTION_HEADER_SIZE);
        if self.section_length as usize > available {
            return Err(DecodeError::LengthMismatch {
                field: "section_length",
                declared: self.section_length as usize,
                available,
            });
        }
        Ok(())
    }
}

/// CRC_32 stored at byte `pos` of `section`. Extracted only, never verified.
pub fn read_crc(section: &[u8], pos: usize) -> Result<u32, DecodeError> {
    let bytes = section
        .get(pos..pos + CRC_SIZE)
        .ok_or(DecodeError::Truncated)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_header_fields() {
        let bytes = [0x02, 0xB0, 0x17, 0x00, 0x01, 0xC3, 0x04, 0x05];
        let sec = SectionReader::new(&bytes).unwrap();

        assert_eq!(sec.table_id, 0x02);
        assert!(sec.section_syntax_indicator);
        assert_eq!(sec.section_length, 0x17);
        assert_eq!(sec.table_id_extension, 1);
        assert_eq!(sec.version_number, 1);
        assert!(sec.current_next_indicator);
        assert_eq!(sec.section_number, 4);
        assert_eq!(sec.last_section_number, 5);
    }

    #[test]
    fn test_short_header_is_truncated() {
        assert_eq!(SectionReader::new(&[0x00, 0xB0]), Err(DecodeError::Truncated));
    }

    #[test]
    fn test_strict_check() {
        let sec = SectionReader::new(&[0x00, 0xB0, 0x0D, 0, 1, 0xC1, 0, 0]).unwrap();

        assert!(sec.check(0x00, 16).is_ok());
        assert_eq!(
            sec.check(0x02, 16),
            Err(DecodeError::UnexpectedTableId { expected: 0x02, actual: 0x00 })
        );
        assert_eq!(
            sec.check(0x00, 10),
            Err(DecodeError::LengthMismatch { field: "section_length", declared: 13, available: 7 })
        );
    }

    #[test]
    fn test_read_crc() {
        let bytes = [0xFF, 0x12, 0x34, 0x56, 0x78];
        assert_eq!(read_crc(&bytes, 1), Ok(0x1234_5678));
        assert_eq!(read_crc(&bytes, 2), Err(DecodeError::Truncated));
    }
}

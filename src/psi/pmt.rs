use bitstream_io::{BigEndian, BitRead, BitReader};
use serde::Serialize;

use crate::constants::{ES_INFO_HEADER_SIZE, PMT_FIXED_LENGTH, PMT_HEADER_SIZE, PMT_TABLE_ID};
use crate::error::DecodeError;
use crate::psi::descriptor::{decode_descriptors, Descriptor};
use crate::psi::section::{read_crc, DecodeMode, SectionReader};

/// ─────────── PMT ───────────
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PmtSection {
    pub table_id: u8,
    pub section_syntax_indicator: bool,
    pub section_length: u16,
    pub program_number: u16,
    pub version_number: u8,
    pub current_next_indicator: bool,
    pub section_number: u8,
    pub last_section_number: u8,
    pub pcr_pid: u16,
    pub program_info_length: u16,
    pub program_descriptors: Vec<Descriptor>,
    pub streams: Vec<StreamInfo>,
    pub crc_32: u32,
}

/// One row of the ES table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
    pub stream_type: u8,
    pub elementary_pid: u16,
    pub es_info_length: u16,
    pub descriptors: Vec<Descriptor>,
}

impl StreamInfo {
    /// Decodes one ES entry; returns it with the number of bytes consumed.
    pub fn decode(bytes: &[u8], mode: DecodeMode) -> Result<(Self, usize), DecodeError> {
        let mut br = BitReader::endian(bytes, BigEndian);
        let stream_type = br.read::<8, u8>()?;
        br.skip(3)?; // reserved
        let elementary_pid = br.read::<13, u16>()?;
        br.skip(4)?; // reserved
        let es_info_length = br.read::<12, u16>()?;

        let (descriptors, end) = decode_descriptors(
            bytes,
            ES_INFO_HEADER_SIZE,
            es_info_length as usize,
            "ES_info_length",
            mode,
        )?;

        Ok((
            Self {
                stream_type,
                elementary_pid,
                es_info_length,
                descriptors,
            },
            end,
        ))
    }
}

/// Decodes a PMT starting at its table_id byte.
///
/// Program descriptors take `program_info_length` bytes; the ES table then runs
/// for `section_length - 13 - program_info_length` bytes and the CRC_32 follows.
pub fn parse_pmt(section: &[u8], mode: DecodeMode) -> Result<PmtSection, DecodeError> {
    let sec = SectionReader::new(section)?;
    if mode.is_strict() {
        sec.check(PMT_TABLE_ID, section.len())?;
    }

    /* ── fixed header after the common section fields ── */
    let b = section.get(SectionReader::SIZE..).ok_or(DecodeError::Truncated)?;
    let mut br = BitReader::endian(b, BigEndian);
    br.skip(3)?; // reserved
    let pcr_pid = br.read::<13, u16>()?;
    br.skip(4)?; // reserved
    let program_info_length = br.read::<12, u16>()?;

    let section_length = sec.section_length as usize;
    let info_len = program_info_length as usize;
    if mode.is_strict() && PMT_FIXED_LENGTH + info_len > section_length {
        return Err(DecodeError::LengthMismatch {
            field: "program_info_length",
            declared: info_len,
            available: section_length.saturating_sub(PMT_FIXED_LENGTH),
        });
    }

    let (program_descriptors, mut idx) =
        decode_descriptors(section, PMT_HEADER_SIZE, info_len, "program_info_length", mode)?;

    /* ── ES loop, measured from where the descriptors actually ended ── */
    let es_end = idx + section_length.saturating_sub(PMT_FIXED_LENGTH + info_len);
    let mut streams = Vec::new();
    while idx < es_end {
        let rest = section.get(idx..).ok_or(DecodeError::Truncated)?;
        let (info, used) = StreamInfo::decode(rest, mode)?;
        idx += used;
        streams.push(info);
    }
    if mode.is_strict() && idx != es_end {
        return Err(DecodeError::LengthMismatch {
            field: "ES_info_length",
            declared: idx - PMT_HEADER_SIZE - info_len,
            available: es_end - PMT_HEADER_SIZE - info_len,
        });
    }

    let crc_32 = read_crc(section, idx)?;

    Ok(PmtSection {
        table_id: sec.table_id,
        section_syntax_indicator: sec.section_syntax_indicator,
        section_length: sec.section_length,
        program_number: sec.table_id_extension,
        version_number: sec.version_number,
        current_next_indicator: sec.current_next_indicator,
        section_number: sec.section_number,
        last_section_number: sec.last_section_number,
        pcr_pid,
        program_info_length,
        program_descriptors,
        streams,
        crc_32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// program 1, PCR PID 0x101, one registration descriptor, H.264 on 0x101
    /// with a language descriptor and AAC on 0x102 without descriptors
    fn sample() -> Vec<u8> {
        vec![
            0x02, 0xB0, 0x22, 0x00, 0x01, 0xC5, 0x00, 0x00, // header, section_length 34
            0xE1, 0x01, // PCR_PID
            0xF0, 0x06, // program_info_length 6
            0x05, 0x04, b'H', b'D', b'M', b'V', // registration_descriptor
            0x1B, 0xE1, 0x01, 0xF0, 0x05, // H.264, ES_info_length 5
            0x0A, 0x03, b'e', b'n', b'g', // ISO_639_language_descriptor
            0x0F, 0xE1, 0x02, 0xF0, 0x00, // AAC, no descriptors
            0x12, 0x34, 0x56, 0x78, // CRC_32
        ]
    }

    #[test]
    fn test_parse_pmt_full() {
        let pmt = parse_pmt(&sample(), DecodeMode::Strict).unwrap();

        assert_eq!(pmt.table_id, 0x02);
        assert_eq!(pmt.section_length, 34);
        assert_eq!(pmt.program_number, 1);
        assert_eq!(pmt.version_number, 2);
        assert!(pmt.current_next_indicator);
        assert_eq!(pmt.pcr_pid, 0x101);
        assert_eq!(pmt.program_info_length, 6);
        assert_eq!(pmt.program_descriptors.len(), 1);
        assert_eq!(pmt.program_descriptors[0].tag, 0x05);
        assert_eq!(pmt.program_descriptors[0].data, b"HDMV");

        assert_eq!(pmt.streams.len(), 2);
        assert_eq!(pmt.streams[0].stream_type, 0x1B);
        assert_eq!(pmt.streams[0].elementary_pid, 0x101);
        assert_eq!(pmt.streams[0].es_info_length, 5);
        assert_eq!(pmt.streams[0].descriptors[0].data, b"eng");
        assert_eq!(pmt.streams[1].stream_type, 0x0F);
        assert_eq!(pmt.streams[1].elementary_pid, 0x102);
        assert!(pmt.streams[1].descriptors.is_empty());
        assert_eq!(pmt.crc_32, 0x1234_5678);
    }

    #[test]
    fn test_no_program_info() {
        let bytes = [
            0x02, 0xB0, 0x12, 0x00, 0x07, 0xC1, 0x00, 0x00,
            0xE1, 0x00, 0xF0, 0x00, // program_info_length 0
            0x02, 0xE1, 0x00, 0xF0, 0x00, // ES table starts right here
            0xAA, 0xBB, 0xCC, 0xDD,
        ];
        let pmt = parse_pmt(&bytes, DecodeMode::Strict).unwrap();

        assert!(pmt.program_descriptors.is_empty());
        assert_eq!(pmt.program_number, 7);
        assert_eq!(pmt.streams.len(), 1);
        assert_eq!(pmt.streams[0].stream_type, 0x02);
        assert_eq!(pmt.streams[0].elementary_pid, 0x100);
        assert_eq!(pmt.crc_32, 0xAABB_CCDD);
    }

    #[test]
    fn test_empty_es_table() {
        let bytes = [
            0x02, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00,
            0xE1, 0x00, 0xF0, 0x00,
            0x01, 0x02, 0x03, 0x04,
        ];
        let pmt = parse_pmt(&bytes, DecodeMode::Strict).unwrap();
        assert!(pmt.streams.is_empty());
        assert_eq!(pmt.crc_32, 0x0102_0304);
    }

    #[test]
    fn test_es_descriptor_overrun() {
        let mut bytes = sample();
        bytes[22] = 0x04; // ES_info_length 4 but the descriptor spans 5
        assert!(matches!(
            parse_pmt(&bytes, DecodeMode::Strict),
            Err(DecodeError::LengthMismatch { field: "ES_info_length", .. })
        ));
    }

    #[test]
    fn test_program_info_longer_than_section() {
        let mut bytes = sample();
        bytes[2] = 0x10; // section_length 16 < 13 + 6
        assert!(matches!(
            parse_pmt(&bytes, DecodeMode::Strict),
            Err(DecodeError::LengthMismatch { field: "program_info_length", .. })
        ));

        // permissive: no room for ES entries, CRC read right after the descriptors
        let pmt = parse_pmt(&bytes, DecodeMode::Permissive).unwrap();
        assert_eq!(pmt.program_descriptors.len(), 1);
        assert!(pmt.streams.is_empty());
        assert_eq!(pmt.crc_32, 0x1BE1_01F0);
    }

    #[test]
    fn test_truncated_section() {
        let bytes = sample();
        assert_eq!(parse_pmt(&bytes[..30], DecodeMode::Permissive), Err(DecodeError::Truncated));
    }
}

use bitstream_io::{BigEndian, BitRead, BitReader};
use serde::Serialize;

use crate::constants::{PAT_ENTRY_SIZE, PAT_FIXED_LENGTH, PAT_TABLE_ID};
use crate::error::DecodeError;
use crate::psi::section::{DecodeMode, SectionReader};

/// ─────────── PAT ───────────
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatSection {
    pub table_id: u8,
    pub section_syntax_indicator: bool,
    pub section_length: u16,
    pub transport_stream_id: u16,
    pub version_number: u8,
    pub current_next_indicator: bool,
    pub section_number: u8,
    pub last_section_number: u8,
    pub programs: Vec<PatEntry>,
    pub crc_32: u32,
}

/// One program_number → PMT PID association. program_number 0 carries the network PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatEntry {
    pub program_number: u16,
    pub pmt_pid: u16,
}

/// Decodes a PAT starting at its table_id byte.
///
/// Exactly `(section_length - 9) / 4` entries are read, followed by the CRC_32.
pub fn parse_pat(section: &[u8], mode: DecodeMode) -> Result<PatSection, DecodeError> {
    let sec = SectionReader::new(section)?;
    let section_length = sec.section_length as usize;
    if mode.is_strict() {
        sec.check(PAT_TABLE_ID, section.len())?;
        if section_length < PAT_FIXED_LENGTH || (section_length - PAT_FIXED_LENGTH) % PAT_ENTRY_SIZE != 0 {
            return Err(DecodeError::LengthMismatch {
                field: "section_length",
                declared: section_length,
                available: section_length.saturating_sub(PAT_FIXED_LENGTH) / PAT_ENTRY_SIZE * PAT_ENTRY_SIZE
                    + PAT_FIXED_LENGTH,
            });
        }
    }

    let n = section_length.saturating_sub(PAT_FIXED_LENGTH) / PAT_ENTRY_SIZE;
    let body = section.get(SectionReader::SIZE..).ok_or(DecodeError::Truncated)?;
    let mut br = BitReader::endian(body, BigEndian);

    let mut programs = Vec::with_capacity(n);
    for _ in 0..n {
        let program_number = br.read::<16, u16>()?;
        br.skip(3)?; // reserved
        let pmt_pid = br.read::<13, u16>()?;
        programs.push(PatEntry { program_number, pmt_pid });
    }
    let crc_32 = br.read::<32, u32>()?;

    Ok(PatSection {
        table_id: sec.table_id,
        section_syntax_indicator: sec.section_syntax_indicator,
        section_length: sec.section_length,
        transport_stream_id: sec.table_id_extension,
        version_number: sec.version_number,
        current_next_indicator: sec.current_next_indicator,
        section_number: sec.section_number,
        last_section_number: sec.last_section_number,
        programs,
        crc_32,
    })
}

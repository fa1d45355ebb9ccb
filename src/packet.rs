//! TS packet framing (ISO/IEC 13818-1 2.4.3.2, table 2-2).
//!
//! A [`Packet`] borrows one 188-byte buffer and resolves where the PSI section
//! starts. The adaptation field is acknowledged but never skipped: PSI packets
//! are expected to carry none, and [`DecodeMode::Strict`] rejects those that do.

use std::io::{ErrorKind, Read};

use bitstream_io::{BigEndian, BitRead, BitReader};
use serde::Serialize;

use crate::constants::{NULL_PID, PAT_PID, TS_HEADER_SIZE, TS_PACKET_SIZE, TS_SYNC_BYTE};
use crate::error::DecodeError;
use crate::psi::{parse_pat, parse_pmt, DecodeMode, PatSection, PmtSection};
use crate::si_cache::SiCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketHeader {
    pub sync_byte: u8,
    pub transport_error_indicator: bool,
    pub payload_unit_start_indicator: bool,
    pub transport_priority: bool,
    pub pid: u16,
    pub transport_scrambling_control: u8,
    pub adaptation_field_control: u8,
    pub continuity_counter: u8,
}

impl PacketHeader {
    /// `None` unless the buffer starts with the sync byte.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.first() != Some(&TS_SYNC_BYTE) {
            return None;
        }
        let mut br = BitReader::endian(data, BigEndian);
        Some(Self {
            sync_byte: br.read::<8, u8>().ok()?,
            transport_error_indicator: br.read_bit().ok()?,
            payload_unit_start_indicator: br.read_bit().ok()?,
            transport_priority: br.read_bit().ok()?,
            pid: br.read::<13, u16>().ok()?,
            transport_scrambling_control: br.read::<2, u8>().ok()?,
            adaptation_field_control: br.read::<2, u8>().ok()?,
            continuity_counter: br.read::<4, u8>().ok()?,
        })
    }

    /// adaptation_field_control '10' or '11'
    pub fn has_adaptation_field(&self) -> bool {
        self.adaptation_field_control & 0b10 != 0
    }

    /// Any non-zero adaptation_field_control is treated as carrying a payload.
    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control != 0
    }
}

/// One transport packet over a borrowed buffer.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    data: &'a [u8],
}

impl<'a> Packet<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn check_sync_byte(&self) -> bool {
        self.data.first() == Some(&TS_SYNC_BYTE)
    }

    /// 13-bit PID, read whether or not the sync byte is valid.
    pub fn pid(&self) -> u16 {
        match self.data {
            [_, b1, b2, ..] => ((*b1 as u16 & 0x1F) << 8) | *b2 as u16,
            _ => NULL_PID,
        }
    }

    pub fn header(&self) -> Option<PacketHeader> {
        PacketHeader::parse(self.data)
    }

    /// Offset of the section's table_id byte within the packet: after the
    /// 4-byte header, plus the pointer_field and the bytes it skips when
    /// payload_unit_start_indicator is set.
    pub fn section_offset(&self, mode: DecodeMode) -> Result<usize, DecodeError> {
        let header = self.header().ok_or(DecodeError::NoPayload)?;
        if !header.has_payload() {
            return Err(DecodeError::NoPayload);
        }
        if header.has_adaptation_field() && mode.is_strict() {
            return Err(DecodeError::AdaptationField);
        }

        let mut offset = TS_HEADER_SIZE;
        if header.payload_unit_start_indicator {
            let pointer_field = *self.data.get(offset).ok_or(DecodeError::Truncated)?;
            offset += 1 + pointer_field as usize;
        }
        if offset >= self.data.len() {
            return Err(DecodeError::Truncated);
        }
        Ok(offset)
    }

    pub fn section(&self, mode: DecodeMode) -> Result<&'a [u8], DecodeError> {
        let offset = self.section_offset(mode)?;
        Ok(&self.data[offset..])
    }

    /// The PAT carried by this packet; `Ok(None)` when the PID is not 0x0000.
    pub fn pa_section(&self, mode: DecodeMode) -> Result<Option<PatSection>, DecodeError> {
        if self.pid() != PAT_PID {
            return Ok(None);
        }
        parse_pat(self.section(mode)?, mode).map(Some)
    }

    /// The PMT carried by this packet; `Ok(None)` when the PID is not
    /// associated with a program in `table`.
    pub fn pm_section(&self, table: &SiCache, mode: DecodeMode) -> Result<Option<PmtSection>, DecodeError> {
        if !table.contains_pid(self.pid()) {
            return Ok(None);
        }
        parse_pmt(self.section(mode)?, mode).map(Some)
    }
}

/// Iterator over whole 188-byte packets; a trailing partial packet ends it.
pub struct TsPackets<R> {
    reader: R,
}

impl<R: Read> Iterator for TsPackets<R> {
    type Item = std::io::Result<[u8; TS_PACKET_SIZE]>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = [0; TS_PACKET_SIZE];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => Some(Ok(buf)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }
}

pub fn ts_packets<R: Read>(reader: R) -> TsPackets<R> {
    TsPackets { reader }
}

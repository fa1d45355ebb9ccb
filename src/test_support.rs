//! Packet builders shared by unit tests.

use bitstream_io::{BigEndian, BitWrite, BitWriter};
use tempfile::NamedTempFile;

use crate::constants::{NULL_PID, PAT_PID, PAT_TABLE_ID, PMT_TABLE_ID, TS_PACKET_SIZE, TS_SYNC_BYTE};

pub struct PacketBuilder {
    pid: u16,
    unit_start: bool,
    pointer_field: u8,
    adaptation_field_control: u8,
    payload: Vec<u8>,
}

impl PacketBuilder {
    pub fn new(pid: u16) -> Self {
        Self {
            pid,
            unit_start: true,
            pointer_field: 0,
            adaptation_field_control: 0b01,
            payload: Vec::new(),
        }
    }

    pub fn unit_start(mut self, on: bool) -> Self {
        self.unit_start = on;
        self
    }

    pub fn pointer_field(mut self, value: u8) -> Self {
        self.pointer_field = value;
        self
    }

    pub fn adaptation_field_control(mut self, value: u8) -> Self {
        self.adaptation_field_control = value;
        self
    }

    /// Bytes following the header (and the pointer_field when unit_start is set).
    pub fn payload(mut self, bytes: &[u8]) -> Self {
        self.payload = bytes.to_vec();
        self
    }

    pub fn build(self) -> [u8; TS_PACKET_SIZE] {
        let mut out = Vec::with_capacity(TS_PACKET_SIZE);
        {
            let mut w = BitWriter::endian(&mut out, BigEndian);
            w.write::<8, u8>(TS_SYNC_BYTE).unwrap();
            w.write_bit(false).unwrap(); // transport_error_indicator
            w.write_bit(self.unit_start).unwrap();
            w.write_bit(false).unwrap(); // transport_priority
            w.write::<13, u16>(self.pid).unwrap();
            w.write::<2, u8>(0).unwrap(); // not scrambled
            w.write::<2, u8>(self.adaptation_field_control).unwrap();
            w.write::<4, u8>(0).unwrap(); // continuity_counter
            if self.unit_start {
                w.write::<8, u8>(self.pointer_field).unwrap();
            }
            w.write_bytes(&self.payload).unwrap();
        }
        out.resize(TS_PACKET_SIZE, 0xFF);

        let mut packet = [0u8; TS_PACKET_SIZE];
        packet.copy_from_slice(&out[..TS_PACKET_SIZE]);
        packet
    }
}

/// PAT on PID 0 with the given (program_number, PMT PID) entries.
pub fn pat_packet(programs: &[(u16, u16)]) -> [u8; TS_PACKET_SIZE] {
    let mut section = Vec::new();
    {
        let mut w = BitWriter::endian(&mut section, BigEndian);
        write_section_header(&mut w, PAT_TABLE_ID, 9 + 4 * programs.len() as u16, 1);
        for &(program_number, pid) in programs {
            w.write::<16, u16>(program_number).unwrap();
            w.write::<3, u8>(0b111).unwrap();
            w.write::<13, u16>(pid).unwrap();
        }
        w.write::<32, u32>(0xCAFE_F00D).unwrap();
    }
    PacketBuilder::new(PAT_PID).payload(&section).build()
}

/// PMT on `pid` for `program_number` with one ES entry per (stream_type, PID)
/// and no descriptors.
pub fn pmt_packet(pid: u16, program_number: u16, streams: &[(u8, u16)]) -> [u8; TS_PACKET_SIZE] {
    let pcr_pid = streams.first().map_or(NULL_PID, |&(_, es_pid)| es_pid);
    let mut section = Vec::new();
    {
        let mut w = BitWriter::endian(&mut section, BigEndian);
        write_section_header(&mut w, PMT_TABLE_ID, 13 + 5 * streams.len() as u16, program_number);
        w.write::<3, u8>(0b111).unwrap();
        w.write::<13, u16>(pcr_pid).unwrap();
        w.write::<4, u8>(0b1111).unwrap();
        w.write::<12, u16>(0).unwrap(); // program_info_length
        for &(stream_type, es_pid) in streams {
            w.write::<8, u8>(stream_type).unwrap();
            w.write::<3, u8>(0b111).unwrap();
            w.write::<13, u16>(es_pid).unwrap();
            w.write::<4, u8>(0b1111).unwrap();
            w.write::<12, u16>(0).unwrap();
        }
        w.write::<32, u32>(0x1234_5678).unwrap();
    }
    PacketBuilder::new(pid).payload(&section).build()
}

pub fn null_packet() -> [u8; TS_PACKET_SIZE] {
    PacketBuilder::new(NULL_PID).unit_start(false).build()
}

/// Writes the packets back to back into a temporary file.
pub fn ts_file(packets: &[[u8; TS_PACKET_SIZE]]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for p in packets {
        std::io::Write::write_all(&mut file, p).unwrap();
    }
    std::io::Write::flush(&mut file).unwrap();
    file
}

fn write_section_header<W: BitWrite>(w: &mut W, table_id: u8, section_length: u16, extension: u16) {
    w.write::<8, u8>(table_id).unwrap();
    w.write_bit(true).unwrap(); // section_syntax_indicator
    w.write::<3, u8>(0b011).unwrap(); // '0' + reserved
    w.write::<12, u16>(section_length).unwrap();
    w.write::<16, u16>(extension).unwrap();
    w.write::<2, u8>(0b11).unwrap();
    w.write::<5, u8>(0).unwrap(); // version_number
    w.write_bit(true).unwrap(); // current_next_indicator
    w.write::<8, u8>(0).unwrap(); // section_number
    w.write::<8, u8>(0).unwrap(); // last_section_number
}

//! Constants for MPEG-TS packet framing and PSI decoding

/// MPEG-TS packet constants
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const TS_HEADER_SIZE: usize = 4;

/// Well-known PIDs
pub const PAT_PID: u16 = 0x0000;
pub const NULL_PID: u16 = 0x1FFF; // also returned when no packet is set

/// table_id values (ISO/IEC 13818-1 table 2-31)
pub const PAT_TABLE_ID: u8 = 0x00;
pub const PMT_TABLE_ID: u8 = 0x02;

/// Fixed section overheads
pub const SECTION_HEADER_SIZE: usize = 3; // table_id + flags/section_length
pub const CRC_SIZE: usize = 4;
pub const PAT_FIXED_LENGTH: usize = 9; // section_length bytes not taken by entries
pub const PAT_ENTRY_SIZE: usize = 4;
pub const PMT_FIXED_LENGTH: usize = 13; // section_length bytes not taken by descriptors / ES table
pub const PMT_HEADER_SIZE: usize = 12; // bytes before the program descriptors
pub const ES_INFO_HEADER_SIZE: usize = 5;
pub const DESCRIPTOR_HEADER_SIZE: usize = 2;

// src/lib.rs
//! Program Map Section navigation over MPEG-2 transport stream files
//! (ISO/IEC 13818-1).

pub mod constants;
pub mod error;
pub mod navigator;
pub mod packet;
pub mod psi;
pub mod report;
pub mod si_cache;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::{DecodeError, Error, Result};
pub use navigator::Navigator;
pub use packet::{ts_packets, Packet, PacketHeader};
pub use psi::{DecodeMode, Descriptor, PatEntry, PatSection, PmtSection, StreamInfo};
pub use report::{Reporter, StreamSummary};
pub use types::{Cursor, NavigatorState, PmSectionHit};

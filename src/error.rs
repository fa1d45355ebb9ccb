//! Error types for packet framing, PSI decoding and stream navigation.

use thiserror::Error;

/// Reasons a packet payload could not be decoded as a PSI section.
///
/// Inside the navigator these are local "not a PAT/PMT" signals: the packet is
/// skipped and the scan goes on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A field would be read past the end of the packet.
    #[error("section truncated by the end of the packet")]
    Truncated,

    /// The header carries no payload (sync byte mismatch or adaptation_field_control '00').
    #[error("packet carries no payload")]
    NoPayload,

    /// Strict mode only: the framer does not skip adaptation fields.
    #[error("PSI packet carries an adaptation field")]
    AdaptationField,

    /// Strict mode only.
    #[error("unexpected table_id: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedTableId { expected: u8, actual: u8 },

    /// Strict mode only: a length field disagrees with its container.
    #[error("{field} declares {declared} bytes but {available} are available")]
    LengthMismatch {
        field: &'static str,
        declared: usize,
        available: usize,
    },
}

impl From<std::io::Error> for DecodeError {
    fn from(_: std::io::Error) -> Self {
        // bit readers only fail with UnexpectedEof on in-memory slices
        DecodeError::Truncated
    }
}

/// Navigator-level errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no transport stream file is open")]
    NotOpen,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

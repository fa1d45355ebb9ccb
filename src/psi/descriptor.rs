// psi/descriptor.rs
//! Opaque tag-length-value descriptors (ISO/IEC 13818-1 2.6).
//!
//! The payload is never interpreted, only copied out of the section.

use std::fmt;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite};
use serde::{Serialize, Serializer};

use crate::constants::DESCRIPTOR_HEADER_SIZE;
use crate::error::DecodeError;
use crate::psi::section::DecodeMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub tag: u8,
    /// Exactly `length` bytes; owned, never aliases the packet.
    #[serde(serialize_with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl Descriptor {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut br = BitReader::endian(bytes, BigEndian);
        let tag = br.read::<8, u8>()?;
        let length = br.read::<8, u8>()?;
        let mut data = vec![0u8; length as usize];
        br.read_bytes(&mut data)?;
        Ok(Self { tag, data })
    }

    /// descriptor_length as it appears on the wire
    pub fn length(&self) -> u8 {
        self.data.len() as u8
    }

    /// Bytes taken by this descriptor in its section.
    pub fn encoded_len(&self) -> usize {
        DESCRIPTOR_HEADER_SIZE + self.data.len()
    }

    pub fn write_to<W: BitWrite>(&self, w: &mut W) -> std::io::Result<()> {
        w.write::<8, u8>(self.tag)?;
        w.write::<8, u8>(self.length())?;
        w.write_bytes(&self.data)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(self.tag);
        out.push(self.length());
        out.extend_from_slice(&self.data);
        out
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{tag: {}; length: {}; data:", self.tag, self.length())?;
        for b in &self.data {
            write!(f, " 0x{b:02X}")?;
        }
        write!(f, "}}")
    }
}

fn hex_bytes<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
    let hex: String = data.iter().map(|b| format!("{b:02X}")).collect();
    s.serialize_str(&hex)
}

/// Decodes descriptors starting at `start` until `length` bytes are consumed.
///
/// Returns the descriptors and the position right after the last one. In
/// permissive mode that position may overshoot `start + length` when a
/// descriptor's own length crosses the boundary; strict mode rejects it.
pub fn decode_descriptors(
    bytes: &[u8],
    start: usize,
    length: usize,
    field: &'static str,
    mode: DecodeMode,
) -> Result<(Vec<Descriptor>, usize), DecodeError> {
    let end = start + length;
    if mode.is_strict() && end > bytes.len() {
        return Err(DecodeError::LengthMismatch {
            field,
            declared: length,
            available: bytes.len().saturating_sub(start),
        });
    }

    let mut descriptors = Vec::new();
    let mut pos = start;
    while pos < end {
        let d = Descriptor::decode(bytes.get(pos..).ok_or(DecodeError::Truncated)?)?;
        pos += d.encoded_len();
        descriptors.push(d);
    }

    if mode.is_strict() && pos != end {
        return Err(DecodeError::LengthMismatch {
            field,
            declared: length,
            available: pos - start,
        });
    }
    Ok((descriptors, pos))
}

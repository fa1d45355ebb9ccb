use serde::Serialize;

use crate::psi::PmtSection;

/// Position of the navigator on a PMT occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    /// zero-based index among PMT occurrences
    pub index: u32,
    /// zero-based packet offset in the file
    pub packet: u64,
}

/// Navigator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavigatorState {
    Closed,
    /// A file is open but no PMT has been located yet.
    Unpositioned,
    Positioned(Cursor),
}

/// A located Program Map Section (public API)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PmSectionHit {
    /// one-based, as shown to users
    pub packet_number: u64,
    /// one-based, as shown to users
    pub section_number: u32,
    pub section: PmtSection,
}

impl PmSectionHit {
    pub fn new(section: PmtSection, cursor: Cursor) -> Self {
        Self {
            packet_number: cursor.packet + 1,
            section_number: cursor.index + 1,
            section,
        }
    }

    pub fn cursor(&self) -> Cursor {
        Cursor {
            index: self.section_number - 1,
            packet: self.packet_number - 1,
        }
    }
}

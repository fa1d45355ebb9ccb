use crate::psi::{PatEntry, PatSection};

/// PID → program association, rebuilt from the most recent PAT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiCache {
    entries: Vec<PatEntry>,
}

impl SiCache {
    pub fn from_pat(pat: &PatSection) -> Self {
        let mut cache = Self::default();
        cache.update_pat(pat);
        cache
    }

    /* replaces the whole table; entries of an older PAT do not survive */
    pub fn update_pat(&mut self, pat: &PatSection) {
        self.entries.clear();
        self.entries.extend_from_slice(&pat.programs);
    }

    /// program_number 0 entries (network PID) are kept and match too.
    pub fn contains_pid(&self, pid: u16) -> bool {
        self.entries.iter().any(|e| e.pmt_pid == pid)
    }

    pub fn program_number(&self, pid: u16) -> Option<u16> {
        self.entries
            .iter()
            .find(|e| e.pmt_pid == pid)
            .map(|e| e.program_number)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PatEntry] {
        &self.entries
    }
}

//! Stateful navigation over the PMT occurrences of a transport stream file.
//!
//! Occurrences are counted per packet: every packet whose PID is listed in the
//! most recently seen PAT and whose payload decodes as a PMT is one occurrence,
//! including repetitions of the same program's table.

pub mod scan;

use std::fs::File;
use std::io::{self, BufReader};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::packet::Packet;
use crate::psi::{DecodeMode, PmtSection};
use crate::types::{Cursor, NavigatorState, PmSectionHit};
use scan::{nearest_pat_before, scan_forward, PacketSource, PsiTracker};

type FileSource = PacketSource<BufReader<File>>;

struct OpenStream {
    path: PathBuf,
    size: u64,
    source: FileSource,
}

pub struct Navigator {
    stream: Option<OpenStream>,
    mode: DecodeMode,
    pm_section_count: Option<u32>,
    cursor: Option<Cursor>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(DecodeMode::default())
    }
}

impl Navigator {
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            stream: None,
            mode,
            pm_section_count: None,
            cursor: None,
        }
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Opens `path`, closing whatever was open before. On failure the
    /// navigator stays closed.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.close();

        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        debug!("opened {} ({size} bytes)", path.display());

        self.stream = Some(OpenStream {
            path: path.to_path_buf(),
            size,
            source: PacketSource::new(BufReader::new(file)),
        });
        Ok(())
    }

    /// Releases the file and forgets the cached count and the cursor.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!("closed {}", stream.path.display());
        }
        self.pm_section_count = None;
        self.cursor = None;
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn state(&self) -> NavigatorState {
        match (&self.stream, self.cursor) {
            (None, _) => NavigatorState::Closed,
            (Some(_), None) => NavigatorState::Unpositioned,
            (Some(_), Some(cursor)) => NavigatorState::Positioned(cursor),
        }
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.stream.as_ref().map(|s| s.path.as_path())
    }

    pub fn file_size(&self) -> Option<u64> {
        self.stream.as_ref().map(|s| s.size)
    }

    fn source(&mut self) -> Result<&mut FileSource> {
        self.stream
            .as_mut()
            .map(|s| &mut s.source)
            .ok_or(Error::NotOpen)
    }

    /// True when every whole packet starts with the sync byte. An empty file
    /// passes; a closed navigator or an I/O failure does not.
    pub fn is_valid_transport_stream(&mut self) -> bool {
        let Ok(src) = self.source() else {
            return false;
        };

        let mut bad_packet = None;
        let scanned = src.for_each_from(0, |packet, data| {
            if Packet::new(data).check_sync_byte() {
                ControlFlow::Continue(())
            } else {
                bad_packet = Some(packet);
                ControlFlow::Break(())
            }
        });

        match (scanned, bad_packet) {
            (Err(e), _) => {
                warn!("validation aborted: {e}");
                false
            }
            (Ok(()), Some(packet)) => {
                debug!("sync byte mismatch at packet {packet}");
                false
            }
            (Ok(()), None) => true,
        }
    }

    /// Number of whole packets in the file. Not cached.
    pub fn packet_count(&mut self) -> Result<u64> {
        let mut count = 0;
        self.source()?.for_each_from(0, |_, _| {
            count += 1;
            ControlFlow::Continue(())
        })?;
        Ok(count)
    }

    /// Number of PMT occurrences, computed once per opened file.
    pub fn pm_section_count(&mut self) -> Result<u32> {
        if let Some(count) = self.pm_section_count {
            return Ok(count);
        }

        let mode = self.mode;
        let mut count = 0;
        let mut tracker = PsiTracker::new(mode);
        scan_forward(self.source()?, &mut tracker, 0, None, |_, _| {
            count += 1;
            ControlFlow::Continue(())
        })?;

        debug!("{count} PMT occurrences");
        self.pm_section_count = Some(count);
        Ok(count)
    }

    pub fn first_pm_section(&mut self) -> Result<Option<PmSectionHit>> {
        self.pm_section_at(0)
    }

    pub fn last_pm_section(&mut self) -> Result<Option<PmSectionHit>> {
        self.cursor = None;
        let mode = self.mode;

        let mut count = 0u32;
        let mut last = None;
        let mut tracker = PsiTracker::new(mode);
        scan_forward(self.source()?, &mut tracker, 0, None, |packet, pmt| {
            count += 1;
            last = Some((packet, pmt));
            ControlFlow::Continue(())
        })?;
        self.pm_section_count = Some(count);

        Ok(last.map(|(packet, pmt)| {
            self.position(pmt, Cursor { index: count - 1, packet })
        }))
    }

    /// Moves to the occurrence after the cursor. From an unpositioned state
    /// this is [`first_pm_section`](Self::first_pm_section).
    pub fn next_pm_section(&mut self) -> Result<Option<PmSectionHit>> {
        let Some(cur) = self.cursor else {
            return self.first_pm_section();
        };
        let mode = self.mode;

        let found = search_next(self.source()?, cur.packet, mode)?;
        Ok(found.map(|(packet, pmt)| {
            self.position(pmt, Cursor { index: cur.index + 1, packet })
        }))
    }

    /// Moves to the occurrence before the cursor. Nothing can precede a PMT
    /// in the first two packets, and an unpositioned navigator has no
    /// previous occurrence.
    pub fn prev_pm_section(&mut self) -> Result<Option<PmSectionHit>> {
        let Some(cur) = self.cursor else {
            return Ok(None);
        };
        if cur.packet <= 1 {
            return Ok(None);
        }
        let mode = self.mode;

        let found = search_prev(self.source()?, cur.packet, mode)?;
        Ok(found.map(|(packet, pmt)| {
            self.position(pmt, Cursor { index: cur.index.saturating_sub(1), packet })
        }))
    }

    /// Random access to the zero-based `index`-th occurrence.
    pub fn pm_section_at(&mut self, index: u32) -> Result<Option<PmSectionHit>> {
        self.cursor = None;
        let mode = self.mode;

        let mut seen = 0u32;
        let mut hit = None;
        let mut tracker = PsiTracker::new(mode);
        scan_forward(self.source()?, &mut tracker, 0, None, |packet, pmt| {
            if seen == index {
                hit = Some((packet, pmt));
                return ControlFlow::Break(());
            }
            seen += 1;
            ControlFlow::Continue(())
        })?;

        Ok(hit.map(|(packet, pmt)| self.position(pmt, Cursor { index, packet })))
    }

    fn position(&mut self, section: PmtSection, cursor: Cursor) -> PmSectionHit {
        debug!(
            "PMT #{} (program {}) at packet #{}",
            cursor.index + 1,
            section.program_number,
            cursor.packet + 1
        );
        self.cursor = Some(cursor);
        PmSectionHit::new(section, cursor)
    }
}

/// The association table in force at `current` is rebuilt from the nearest
/// PAT behind it, then the scan resumes right after `current`.
fn search_next(
    src: &mut FileSource,
    current: u64,
    mode: DecodeMode,
) -> io::Result<Option<(u64, PmtSection)>> {
    let table = match current {
        0 => None,
        _ => nearest_pat_before(src, current - 1, mode)?.map(|(table, _)| table),
    };
    let mut tracker = PsiTracker::with_table(table.unwrap_or_default(), mode);

    let mut found = None;
    scan_forward(src, &mut tracker, current + 1, None, |packet, pmt| {
        found = Some((packet, pmt));
        ControlFlow::Break(())
    })?;
    Ok(found)
}

/// Looks between the nearest PAT behind `current` and `current` for the last
/// occurrence, widening past that PAT until something is found or the start
/// of the file is reached.
fn search_prev(
    src: &mut FileSource,
    current: u64,
    mode: DecodeMode,
) -> io::Result<Option<(u64, PmtSection)>> {
    let mut origin = current - 1;
    loop {
        let Some((table, pat)) = nearest_pat_before(src, origin, mode)? else {
            return Ok(None);
        };

        let mut found = None;
        let mut tracker = PsiTracker::with_table(table, mode);
        scan_forward(src, &mut tracker, pat + 1, Some(current), |packet, pmt| {
            found = Some((packet, pmt));
            ControlFlow::Continue(())
        })?;

        if found.is_some() || pat == 0 {
            return Ok(found);
        }
        origin = pat - 1;
    }
}

//! Packet-level scanning primitives shared by the navigation operations.

use std::io::{self, Read, Seek, SeekFrom};
use std::ops::ControlFlow;

use log::trace;

use crate::constants::{PAT_PID, TS_PACKET_SIZE};
use crate::packet::{ts_packets, Packet};
use crate::psi::{DecodeMode, PatSection, PmtSection};
use crate::si_cache::SiCache;

/// Random access to whole packets of a seekable byte source.
pub struct PacketSource<R> {
    reader: R,
}

impl<R: Read + Seek> PacketSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn seek_packet(&mut self, packet: u64) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(packet * TS_PACKET_SIZE as u64))?;
        Ok(())
    }

    /// `Ok(None)` once fewer than 188 bytes are left.
    pub fn next_packet(&mut self) -> io::Result<Option<[u8; TS_PACKET_SIZE]>> {
        ts_packets(&mut self.reader).next().transpose()
    }

    pub fn packet_at(&mut self, packet: u64) -> io::Result<Option<[u8; TS_PACKET_SIZE]>> {
        self.seek_packet(packet)?;
        self.next_packet()
    }

    /// Runs `f` on every whole packet from `start` on; stops early on `Break`.
    pub fn for_each_from<F>(&mut self, start: u64, mut f: F) -> io::Result<()>
    where
        F: FnMut(u64, &[u8; TS_PACKET_SIZE]) -> ControlFlow<()>,
    {
        self.seek_packet(start)?;
        for (n, data) in ts_packets(&mut self.reader).enumerate() {
            if f(start + n as u64, &data?).is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// Follows PATs and reports every PMT a packet carries.
///
/// A PID 0x0000 packet is only ever looked at as a PAT. Any decode failure
/// means "not a PAT/PMT" and the packet is skipped.
pub struct PsiTracker {
    table: SiCache,
    mode: DecodeMode,
}

impl PsiTracker {
    pub fn new(mode: DecodeMode) -> Self {
        Self::with_table(SiCache::default(), mode)
    }

    pub fn with_table(table: SiCache, mode: DecodeMode) -> Self {
        Self { table, mode }
    }

    pub fn table(&self) -> &SiCache {
        &self.table
    }

    pub fn feed(&mut self, data: &[u8]) -> Option<PmtSection> {
        let packet = Packet::new(data);
        if packet.pid() == PAT_PID {
            if let Some(pat) = pat_in(&packet, self.mode) {
                self.table.update_pat(&pat);
            }
            return None;
        }

        match packet.pm_section(&self.table, self.mode) {
            Ok(pmt) => pmt,
            Err(e) => {
                trace!("PID 0x{:04X}: not a PMT: {e}", packet.pid());
                None
            }
        }
    }
}

fn pat_in(packet: &Packet<'_>, mode: DecodeMode) -> Option<PatSection> {
    match packet.pa_section(mode) {
        Ok(pat) => pat,
        Err(e) => {
            trace!("PID 0x0000: not a PAT: {e}");
            None
        }
    }
}

/// Feeds packets `start..end` (or to the end of the file) to `tracker` and
/// hands every PMT found to `visit` with its packet offset.
pub fn scan_forward<R, F>(
    src: &mut PacketSource<R>,
    tracker: &mut PsiTracker,
    start: u64,
    end: Option<u64>,
    mut visit: F,
) -> io::Result<()>
where
    R: Read + Seek,
    F: FnMut(u64, PmtSection) -> ControlFlow<()>,
{
    src.for_each_from(start, |packet, data| {
        if end.is_some_and(|end| packet >= end) {
            return ControlFlow::Break(());
        }
        match tracker.feed(data) {
            Some(pmt) => visit(packet, pmt),
            None => ControlFlow::Continue(()),
        }
    })
}

/// Searches backwards from packet `from` (inclusive) for the closest packet
/// carrying a decodable PAT. Returns its association table and packet offset.
pub fn nearest_pat_before<R: Read + Seek>(
    src: &mut PacketSource<R>,
    from: u64,
    mode: DecodeMode,
) -> io::Result<Option<(SiCache, u64)>> {
    for packet in (0..=from).rev() {
        let Some(data) = src.packet_at(packet)? else {
            return Ok(None);
        };
        let p = Packet::new(&data);
        if p.pid() != PAT_PID {
            continue;
        }
        if let Some(pat) = pat_in(&p, mode) {
            trace!("PAT found at packet {packet}");
            return Ok(Some((SiCache::from_pat(&pat), packet)));
        }
    }
    Ok(None)
}

//! Report generation for located PMTs and whole-stream summaries

use std::fmt::Write;

use serde::Serialize;

use crate::error::Result;
use crate::navigator::Navigator;
use crate::psi::{Descriptor, PmtSection};
use crate::types::PmSectionHit;

/// Stream-level facts shown before any navigation (public API)
#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    pub timestamp: String,
    pub file_name: String,
    pub file_size: u64,
    pub packets: u64,
    pub pm_sections: u32,
    pub valid: bool,
}

/// JSON structure for elementary streams (internal serialization)
#[derive(Serialize)]
struct EsJson<'a> {
    pid: u16,
    stream_type: u8,
    codec: &'static str,
    es_info_length: u16,
    descriptors: &'a [Descriptor],
}

/// JSON structure for one located PMT (internal serialization)
#[derive(Serialize)]
struct SectionJson<'a> {
    ts_time: String,
    section_number: u32,
    packet_number: u64,
    program: u16,
    version: u8,
    pcr_pid: u16,
    crc_32: u32,
    program_descriptors: &'a [Descriptor],
    streams: Vec<EsJson<'a>>,
}

/// Report generator for navigator results
pub struct Reporter;

impl Reporter {
    /// Validates and counts the open stream. Invalid streams are not scanned
    /// for PMTs.
    pub fn summary(nav: &mut Navigator) -> Result<StreamSummary> {
        let valid = nav.is_valid_transport_stream();
        let packets = nav.packet_count()?;
        let pm_sections = if valid { nav.pm_section_count()? } else { 0 };

        Ok(StreamSummary {
            timestamp: chrono::Utc::now().to_rfc3339(),
            file_name: nav
                .file_name()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            file_size: nav.file_size().unwrap_or(0),
            packets,
            pm_sections,
            valid,
        })
    }

    pub fn summary_text(summary: &StreamSummary) -> String {
        format!(
            "File: {}\nSize: {} bytes\nPackets: {}\nValid transport stream: {}\nProgram Map Sections: {}\n",
            summary.file_name,
            summary.file_size,
            summary.packets,
            yes_no(summary.valid),
            summary.pm_sections,
        )
    }

    /// Pretty-printed JSON for one located PMT
    pub fn section_json(hit: &PmSectionHit) -> serde_json::Result<String> {
        let pmt = &hit.section;
        let rep = SectionJson {
            ts_time: chrono::Utc::now().to_rfc3339(),
            section_number: hit.section_number,
            packet_number: hit.packet_number,
            program: pmt.program_number,
            version: pmt.version_number,
            pcr_pid: pmt.pcr_pid,
            crc_32: pmt.crc_32,
            program_descriptors: &pmt.program_descriptors,
            streams: pmt
                .streams
                .iter()
                .map(|s| EsJson {
                    pid: s.elementary_pid,
                    stream_type: s.stream_type,
                    codec: stream_type_name(s.stream_type),
                    es_info_length: s.es_info_length,
                    descriptors: &s.descriptors,
                })
                .collect(),
        };
        serde_json::to_string_pretty(&rep)
    }

    /// Field-by-field listing of one located PMT
    pub fn section_text(hit: &PmSectionHit) -> String {
        let mut out = format!(
            "Program Map Section #{} (Packet #{})\n",
            hit.section_number, hit.packet_number
        );
        // writing into a String cannot fail
        let _ = write_section(&mut out, &hit.section);
        out
    }
}

fn write_section(out: &mut String, pmt: &PmtSection) -> std::fmt::Result {
    writeln!(out, "  table_id:                 {}", pmt.table_id)?;
    writeln!(out, "  section_syntax_indicator: {}", yes_no(pmt.section_syntax_indicator))?;
    writeln!(out, "  section_length:           {}", pmt.section_length)?;
    writeln!(out, "  program_number:           {}", pmt.program_number)?;
    writeln!(out, "  version_number:           {}", pmt.version_number)?;
    writeln!(out, "  current_next_indicator:   {}", yes_no(pmt.current_next_indicator))?;
    writeln!(out, "  section_number:           {}", pmt.section_number)?;
    writeln!(out, "  last_section_number:      {}", pmt.last_section_number)?;
    writeln!(out, "  PCR_PID:                  {}", pmt.pcr_pid)?;
    writeln!(out, "  program_info_length:      {}", pmt.program_info_length)?;
    writeln!(out, "  CRC_32:                   {}", pmt.crc_32)?;

    writeln!(out, "  program descriptors:")?;
    for d in &pmt.program_descriptors {
        writeln!(out, "    {d}")?;
    }

    writeln!(out, "  elementary streams:")?;
    for s in &pmt.streams {
        writeln!(
            out,
            "    {{stream type: {}; elementary PID: {}; ES info length: {}}}",
            s.stream_type, s.elementary_pid, s.es_info_length
        )?;
        for d in &s.descriptors {
            writeln!(out, "      {d}")?;
        }
    }
    Ok(())
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

/// Common stream_type values (ISO/IEC 13818-1 table 2-34 and registrations)
pub fn stream_type_name(st: u8) -> &'static str {
    match st {
        0x01 => "MPEG-1 Video",
        0x02 => "MPEG-2 Video",
        0x03 => "MPEG-1 Audio",
        0x04 => "MPEG-2 Audio",
        0x06 => "PES private data",
        0x0F => "AAC",
        0x11 => "LATM AAC",
        0x1B => "H.264",
        0x24 => "HEVC",
        0x81 => "AC-3",
        0x87 => "E-AC-3",
        _ => "unk",
    }
}

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pmt_navigator::{DecodeMode, Navigator, PmSectionHit, Reporter};

#[derive(Parser)]
#[clap(about = "Browse the Program Map Sections of an MPEG-2 transport stream file")]
struct Opt {
    /// Transport stream file (188-byte packets)
    file: PathBuf,

    /// Reject sections whose length fields disagree, and PSI packets with an adaptation field
    #[clap(long, default_value_t = false)]
    strict: bool,

    /// Print JSON instead of text
    #[clap(long, default_value_t = false)]
    json: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// File size, packet count and PMT count (default)
    Info,
    /// Show the first PMT
    First,
    /// Show the last PMT
    Last,
    /// Show the PMT with the given zero-based index
    Nth { index: u32 },
    /// Show every PMT in file order
    Walk {
        /// Start from the last PMT and step backwards
        #[clap(long, default_value_t = false)]
        reverse: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::parse();

    let mode = if opt.strict { DecodeMode::Strict } else { DecodeMode::Permissive };
    let mut nav = Navigator::new(mode);
    nav.open(&opt.file)
        .with_context(|| format!("cannot open {}", opt.file.display()))?;

    match opt.command.unwrap_or(Command::Info) {
        Command::Info => {
            let summary = Reporter::summary(&mut nav)?;
            if opt.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", Reporter::summary_text(&summary));
            }
        }
        Command::First => {
            ensure_browsable(&mut nav, &opt.file)?;
            show(nav.first_pm_section()?, opt.json)?;
        }
        Command::Last => {
            ensure_browsable(&mut nav, &opt.file)?;
            show(nav.last_pm_section()?, opt.json)?;
        }
        Command::Nth { index } => {
            let count = ensure_browsable(&mut nav, &opt.file)?;
            let hit = nav.pm_section_at(index)?;
            if hit.is_none() {
                bail!("no PMT with index {index} (count: {count})");
            }
            show(hit, opt.json)?;
        }
        Command::Walk { reverse } => {
            ensure_browsable(&mut nav, &opt.file)?;
            let mut hit = if reverse { nav.last_pm_section()? } else { nav.first_pm_section()? };
            while hit.is_some() {
                show(hit, opt.json)?;
                hit = if reverse { nav.prev_pm_section()? } else { nav.next_pm_section()? };
            }
        }
    }
    Ok(())
}

/// Same gate as opening a file in a viewer: valid packets and at least one PMT.
fn ensure_browsable(nav: &mut Navigator, file: &Path) -> anyhow::Result<u32> {
    if !nav.is_valid_transport_stream() {
        bail!("{} is not an MPEG-2 transport stream or some packets are incorrect", file.display());
    }
    let count = nav.pm_section_count()?;
    if count == 0 {
        bail!("{} doesn't contain Program Map Sections", file.display());
    }
    Ok(count)
}

fn show(hit: Option<PmSectionHit>, json: bool) -> anyhow::Result<()> {
    let Some(hit) = hit else {
        return Ok(());
    };
    if json {
        println!("{}", Reporter::section_json(&hit)?);
    } else {
        println!("{}", Reporter::section_text(&hit));
    }
    Ok(())
}

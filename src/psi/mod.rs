pub mod section;
pub mod descriptor;
pub mod pat;
pub mod pmt;

pub use crate::error::DecodeError;
pub use descriptor::Descriptor;
pub use section::{DecodeMode, SectionReader};
pub use pat::{parse_pat, PatEntry, PatSection};
pub use pmt::{parse_pmt, PmtSection, StreamInfo};

//! Archive extraction with path containment and root stripping.
//!
//! # Architecture
//!
//! - `detect.rs` - Magic-number classification and zstd unwrapping
//! - `sanitize.rs` - Entry name normalization and symlink containment
//! - `entry.rs` - The entry model shared by every format
//! - `extract/` - The extractor and per-format entry sources

pub use detect::{Magic, OpenedArchive, detect_format, open_archive, read_magic};
pub use entry::{ArchiveEntry, EntryKind, EntrySource};
pub use error::{Error, Result};
pub use extract::{ExtractReport, extract_archive, extract_entries};
pub use format::{ArchiveFormat, Compression};
pub use options::ExtractOptions;
pub use sanitize::{normalize_entry_name, resolve_link_target};

mod detect;
pub mod entry;
mod error;
pub mod extract;
mod format;
pub mod options;
mod sanitize;

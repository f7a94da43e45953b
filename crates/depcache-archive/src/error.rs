use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{path}' is too short to be an archive ({len} bytes)")]
    TooShort { path: PathBuf, len: u64 },

    #[error("unsupported archive format in '{path}': magic number 0x{magic:08X}")]
    UnsupportedFormat { path: PathBuf, magic: u32 },

    #[error("invalid entry name '{name}': {reason}")]
    InvalidEntryName { name: String, reason: &'static str },

    #[error("strip-root is enabled but the first entry '{name}' is not a directory")]
    StripRootNotDirectory { name: String },

    #[error("entry '{name}' does not start with the stripped root '{prefix}/'")]
    StripRootMismatch { name: String, prefix: String },

    #[error("archive '{path}' is corrupted: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to open archive '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Fs(#[from] depcache_fs::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

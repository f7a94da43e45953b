use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to remove '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to rename '{from}' to '{to}': {source}")]
    Rename {
        from:   PathBuf,
        to:     PathBuf,
        source: io::Error,
    },

    #[error("failed to query metadata of '{path}': {source}")]
    Metadata { path: PathBuf, source: io::Error },

    #[error("'{path}' exists but is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("'{path}' has no parent directory")]
    NoParent { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Archive(#[from] depcache_archive::Error),

    #[error(transparent)]
    Fs(#[from] depcache_fs::Error),

    #[error("{context} '{path}': {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("flag file '{flag}' does not match '{target}' right after extraction")]
    InconsistentFlag { flag: PathBuf, target: PathBuf },

    #[error("'{path}' exists but is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("'{path}' has no file name")]
    NoFileName { path: PathBuf },

    #[error("invalid config '{path}': {reason}")]
    Config { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

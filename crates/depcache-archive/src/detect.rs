use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, Compression};

/// What the first four bytes of a file say it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Magic {
    Zip,
    Gzip,
    Bzip2,
    /// A zstd frame (or skippable frame) wrapping another archive.
    Zstd,
}

pub fn detect_format(magic: [u8; 4]) -> Option<Magic> {
    match magic {
        [0x28, 0xB5, 0x2F, 0xFD] => Some(Magic::Zstd),
        // skippable frames 0x184D2A50..=0x184D2A5F
        [b, 0x2A, 0x4D, 0x18] if b & 0xF0 == 0x50 => Some(Magic::Zstd),
        [0x50, 0x4B, ..] => Some(Magic::Zip),
        [0x1F, 0x8B, ..] => Some(Magic::Gzip),
        [0x42, 0x5A, ..] => Some(Magic::Bzip2),
        _ => None,
    }
}

/// Read exactly the first four bytes of `path`.
pub fn read_magic(path: &Path) -> Result<[u8; 4]> {
    let file = File::open(path).map_err(|e| Error::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut head = Vec::with_capacity(4);
    file.take(4).read_to_end(&mut head).map_err(|e| Error::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    <[u8; 4]>::try_from(head.as_slice()).map_err(|_| Error::TooShort {
        path: path.to_path_buf(),
        len:  head.len() as u64,
    })
}

/// A classified archive, ready to be opened for a single pass.
///
/// For zstd-wrapped archives this owns the decompressed temp file, which is
/// removed when the value is dropped.
#[derive(Debug)]
pub struct OpenedArchive {
    format:    ArchiveFormat,
    path:      PathBuf,
    unwrapped: Option<NamedTempFile>,
}

impl OpenedArchive {
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// The file holding the archive bytes (the temp file for zstd input).
    pub fn path(&self) -> &Path {
        match &self.unwrapped {
            Some(temp) => temp.path(),
            None => &self.path,
        }
    }

    pub fn is_zstd_wrapped(&self) -> bool {
        self.unwrapped.is_some()
    }

    pub fn open(&self) -> Result<File> {
        let path = self.path();
        File::open(path).map_err(|e| Error::Open {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Classify `path`, unwrapping a zstd frame into a temporary sibling file.
pub fn open_archive(path: &Path) -> Result<OpenedArchive> {
    let magic = read_magic(path)?;
    let format = match detect_format(magic) {
        Some(Magic::Zip) => ArchiveFormat::Zip,
        Some(Magic::Gzip) => ArchiveFormat::Tar(Compression::Gzip),
        Some(Magic::Bzip2) => ArchiveFormat::Tar(Compression::Bzip2),
        Some(Magic::Zstd) => return unwrap_zstd(path),
        None => {
            return Err(Error::UnsupportedFormat {
                path:  path.to_path_buf(),
                magic: u32::from_be_bytes(magic),
            });
        }
    };

    Ok(OpenedArchive {
        format,
        path: path.to_path_buf(),
        unwrapped: None,
    })
}

fn unwrap_zstd(path: &Path) -> Result<OpenedArchive> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".unzst")
        .tempfile_in(parent)?;
    debug!(archive = %path.display(), temp = %temp.path().display(), "unwrapping zstd frame");

    let source = File::open(path).map_err(|e| Error::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    zstd::stream::copy_decode(BufReader::new(source), temp.as_file_mut()).map_err(|e| {
        Error::Corrupted {
            path:   path.to_path_buf(),
            reason: format!("zstd: {e}"),
        }
    })?;
    temp.as_file_mut().flush()?;

    let inner = read_magic(temp.path()).map_err(|e| match e {
        Error::TooShort { len, .. } => Error::TooShort {
            path: path.to_path_buf(),
            len,
        },
        other => other,
    })?;
    if detect_format(inner) != Some(Magic::Zip) {
        return Err(Error::UnsupportedFormat {
            path:  path.to_path_buf(),
            magic: u32::from_be_bytes(inner),
        });
    }

    Ok(OpenedArchive {
        format:    ArchiveFormat::Zip,
        path:      path.to_path_buf(),
        unwrapped: Some(temp),
    })
}

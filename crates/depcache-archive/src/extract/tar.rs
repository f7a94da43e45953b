use std::io::Read;
use std::path::{Path, PathBuf};

use tar::EntryType;
use tracing::debug;

use crate::entry::{ArchiveEntry, EntryKind, EntrySource};
use crate::error::{Error, Result};

/// Owns the decoded tar stream; entries borrow from it.
pub struct TarArchive<'r> {
    archive: tar::Archive<Box<dyn Read + 'r>>,
    origin:  PathBuf,
}

impl<'r> TarArchive<'r> {
    /// `origin` names the archive in error messages.
    pub fn new(reader: Box<dyn Read + 'r>, origin: impl Into<PathBuf>) -> Self {
        Self {
            archive: tar::Archive::new(reader),
            origin:  origin.into(),
        }
    }

    pub fn entries(&mut self) -> Result<TarEntries<'_, Box<dyn Read + 'r>>> {
        let entries = self.archive.entries().map_err(|e| Error::Corrupted {
            path:   self.origin.clone(),
            reason: e.to_string(),
        })?;
        Ok(TarEntries {
            entries,
            origin: &self.origin,
        })
    }
}

pub struct TarEntries<'a, R: 'a + Read> {
    entries: tar::Entries<'a, R>,
    origin:  &'a Path,
}

impl<'a, R: Read + 'a> EntrySource for TarEntries<'a, R> {
    fn next_entry(&mut self) -> Option<Result<ArchiveEntry<'_>>> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    return Some(Err(Error::Corrupted {
                        path:   self.origin.to_path_buf(),
                        reason: e.to_string(),
                    }));
                }
            };

            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let header = entry.header();
            let entry_type = header.entry_type();

            let kind = if entry_type.is_dir() {
                EntryKind::Directory
            } else if entry_type.is_symlink() {
                let Some(target) = entry.link_name_bytes() else {
                    return Some(Err(Error::Corrupted {
                        path:   self.origin.to_path_buf(),
                        reason: format!("symlink '{name}' has no target"),
                    }));
                };
                EntryKind::Symlink {
                    target: String::from_utf8_lossy(&target).into_owned(),
                }
            } else if entry_type.is_file() || entry_type == EntryType::Continuous {
                let executable = header.mode().is_ok_and(|m| m & 0o111 != 0);
                EntryKind::File {
                    executable,
                    reader: Box::new(entry),
                }
            } else {
                debug!(name, ?entry_type, "skipping unsupported tar entry");
                continue;
            };

            return Some(Ok(ArchiveEntry { name, kind }));
        }
    }
}

use std::io::{Read, Seek};

use crate::entry::{ArchiveEntry, EntryKind, EntrySource};
use crate::error::{Error, Result};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

pub struct ZipSource<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
    index:   usize,
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = zip::ZipArchive::new(reader)?;
        Ok(Self { archive, index: 0 })
    }
}

impl<R: Read + Seek> EntrySource for ZipSource<R> {
    fn next_entry(&mut self) -> Option<Result<ArchiveEntry<'_>>> {
        if self.index >= self.archive.len() {
            return None;
        }
        let index = self.index;
        self.index += 1;

        let mut file = match self.archive.by_index(index) {
            Ok(file) => file,
            Err(e) => return Some(Err(e.into())),
        };

        let name = file.name().to_owned();
        let mode = file.unix_mode();

        let kind = if file.is_dir() {
            EntryKind::Directory
        } else if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            // zip stores the link target as the entry's content
            let mut target = String::new();
            if let Err(e) = file.read_to_string(&mut target) {
                return Some(Err(Error::ExtractionFailed {
                    path:   name.into(),
                    source: e,
                }));
            }
            EntryKind::Symlink { target }
        } else {
            EntryKind::File {
                executable: mode.is_some_and(|m| m & 0o111 != 0),
                reader:     Box::new(file),
            }
        };

        Some(Ok(ArchiveEntry { name, kind }))
    }
}

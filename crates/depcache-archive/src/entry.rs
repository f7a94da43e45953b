use std::fmt;
use std::io::Read;

/// One entry of an archive, in archive order.
///
/// `name` is the raw name as stored; normalization happens in the extractor
/// so that every format goes through the same checks.
pub struct ArchiveEntry<'a> {
    pub name: String,
    pub kind: EntryKind<'a>,
}

pub enum EntryKind<'a> {
    Directory,
    File {
        executable: bool,
        reader:     Box<dyn Read + 'a>,
    },
    Symlink {
        target: String,
    },
}

impl ArchiveEntry<'_> {
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, EntryKind::Symlink { .. })
    }
}

impl fmt::Debug for EntryKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("Directory"),
            Self::File { executable, .. } => f
                .debug_struct("File")
                .field("executable", executable)
                .finish_non_exhaustive(),
            Self::Symlink { target } => f.debug_struct("Symlink").field("target", target).finish(),
        }
    }
}

impl fmt::Debug for ArchiveEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A lazy, single-pass sequence of archive entries.
///
/// Each entry borrows the source, so the previous entry (and its reader)
/// is gone before the next one is produced.
pub trait EntrySource {
    fn next_entry(&mut self) -> Option<crate::Result<ArchiveEntry<'_>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn entry_kinds() {
        let dir = ArchiveEntry {
            name: "bin/".into(),
            kind: EntryKind::Directory,
        };
        assert!(dir.is_directory());
        assert!(!dir.is_symlink());

        let link = ArchiveEntry {
            name: "lib/libz.so".into(),
            kind: EntryKind::Symlink {
                target: "libz.so.1".into(),
            },
        };
        assert!(link.is_symlink());
    }

    #[test]
    fn debug_omits_reader() {
        let file = ArchiveEntry {
            name: "bin/tool".into(),
            kind: EntryKind::File {
                executable: true,
                reader:     Box::new(Cursor::new(vec![1, 2, 3])),
            },
        };
        let rendered = format!("{file:?}");
        assert!(rendered.contains("bin/tool"));
        assert!(rendered.contains("executable: true"));
    }
}

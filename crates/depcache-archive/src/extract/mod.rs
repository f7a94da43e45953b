//! Materializes archive entries under a target directory.
//!
//! The containment policy lives here and in `sanitize.rs` only; the
//! per-format sources just produce raw entries.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use depcache_fs::PermissionMode;
use tracing::{debug, warn};

use crate::detect::open_archive;
use crate::entry::{EntryKind, EntrySource};
use crate::error::{Error, Result};
use crate::format::ArchiveFormat;
use crate::options::ExtractOptions;
use crate::sanitize::{RootPrefix, normalize_entry_name, resolve_link_target};

mod tar;
mod zip;

pub use tar::{TarArchive, TarEntries};
pub use zip::ZipSource;

/// Counts from one extraction pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub format: Option<ArchiveFormat>,
    pub files: usize,
    pub directories: usize,
    pub symlinks: usize,
    pub skipped_symlinks: usize,
    pub bytes: u64,
}

/// Detect the format of `archive` and extract it into `target`.
///
/// `target` must already exist; existing files are overwritten.
pub fn extract_archive(
    archive: &Path,
    target: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let opened = open_archive(archive)?;
    let reader = BufReader::new(opened.open()?);
    debug!(
        archive = %archive.display(),
        format = %opened.format(),
        zstd = opened.is_zstd_wrapped(),
        "extracting"
    );

    let mut report = match opened.format() {
        ArchiveFormat::Zip => {
            let mut source = ZipSource::new(reader)?;
            extract_entries(&mut source, target, options)?
        }
        ArchiveFormat::Tar(codec) => {
            let mut tar = TarArchive::new(codec.decoder(reader), archive);
            let mut entries = tar.entries()?;
            extract_entries(&mut entries, target, options)?
        }
    };
    report.format = Some(opened.format());
    Ok(report)
}

/// Write every entry of `source` under `target`.
pub fn extract_entries<S: EntrySource + ?Sized>(
    source: &mut S,
    target: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let mut extraction = Extraction {
        target,
        root: RootPrefix::new(options.strip_root),
        created_dirs: HashSet::from([target.to_path_buf()]),
        report: ExtractReport::default(),
    };

    while let Some(entry) = source.next_entry() {
        let entry = entry?;
        let name = normalize_entry_name(&entry.name)?;
        if name.is_empty() {
            continue;
        }
        let Some(relative) = extraction.root.strip(&name, entry.is_directory())? else {
            continue;
        };
        let output = output_path(target, relative);

        match entry.kind {
            EntryKind::Directory => {
                extraction.ensure_dir(&output)?;
                extraction.report.directories += 1;
            }
            EntryKind::File {
                executable,
                mut reader,
            } => extraction.write_file(&output, &mut reader, executable)?,
            EntryKind::Symlink { target: link } => {
                extraction.write_symlink(relative, &link, &output)?
            }
        }
    }

    Ok(extraction.report)
}

struct Extraction<'t> {
    target: &'t Path,
    root: RootPrefix,
    created_dirs: HashSet<PathBuf>,
    report: ExtractReport,
}

impl Extraction<'_> {
    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        if self.created_dirs.contains(dir) {
            return Ok(());
        }
        std::fs::create_dir_all(dir).map_err(|e| depcache_fs::Error::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        self.created_dirs.insert(dir.to_path_buf());
        Ok(())
    }

    fn ensure_parent(&mut self, output: &Path) -> Result<()> {
        match output.parent() {
            Some(parent) => self.ensure_dir(parent),
            None => Ok(()),
        }
    }

    fn write_file(&mut self, output: &Path, reader: &mut dyn Read, executable: bool) -> Result<()> {
        self.ensure_parent(output)?;
        unlink_symlink(output)?;

        let failed = |e: io::Error| Error::ExtractionFailed {
            path: output.to_path_buf(),
            source: e,
        };
        let mut file = File::create(output).map_err(failed)?;
        let bytes = io::copy(reader, &mut file).map_err(failed)?;
        drop(file);

        if executable {
            PermissionMode::Executable.apply_to_path(output)?;
        }

        self.report.files += 1;
        self.report.bytes += bytes;
        Ok(())
    }

    fn write_symlink(&mut self, relative: &str, link: &str, output: &Path) -> Result<()> {
        let Some(resolved) = resolve_link_target(relative, link) else {
            warn!(entry = relative, link, "skipping symlink that escapes the extraction root");
            self.report.skipped_symlinks += 1;
            return Ok(());
        };

        self.ensure_parent(output)?;
        depcache_fs::remove_path(output)?;

        let link = link.replace('\\', "/");
        match depcache_fs::create_symlink(&link, output) {
            Ok(()) => {
                self.report.symlinks += 1;
                Ok(())
            }
            Err(e) if cfg!(unix) => Err(e.into()),
            Err(e) => self.copy_link_target(&resolved, output, e),
        }
    }

    /// Substitute a copy of the resolved target where symlinks are unavailable.
    fn copy_link_target(
        &mut self,
        resolved: &str,
        output: &Path,
        cause: depcache_fs::Error,
    ) -> Result<()> {
        let source = output_path(self.target, resolved);
        if !source.is_file() {
            debug!(
                link = %output.display(),
                resolved,
                %cause,
                "symlink unsupported and target is not an extracted file; skipping"
            );
            self.report.skipped_symlinks += 1;
            return Ok(());
        }

        let bytes = std::fs::copy(&source, output).map_err(|e| Error::ExtractionFailed {
            path: output.to_path_buf(),
            source: e,
        })?;
        self.report.files += 1;
        self.report.bytes += bytes;
        Ok(())
    }
}

fn output_path(target: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(target.to_path_buf(), |path, segment| path.join(segment))
}

fn unlink_symlink(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Ok(depcache_fs::remove_path(path)?),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use tempfile::tempdir;

    use super::*;
    use crate::entry::ArchiveEntry;

    enum Item {
        Dir,
        File(&'static [u8], bool),
        Link(&'static str),
    }

    struct MemorySource(VecDeque<(&'static str, Item)>);

    impl MemorySource {
        fn new(items: Vec<(&'static str, Item)>) -> Self {
            Self(items.into())
        }
    }

    impl EntrySource for MemorySource {
        fn next_entry(&mut self) -> Option<Result<ArchiveEntry<'_>>> {
            let (name, item) = self.0.pop_front()?;
            let kind = match item {
                Item::Dir => EntryKind::Directory,
                Item::File(bytes, executable) => EntryKind::File {
                    executable,
                    reader: Box::new(Cursor::new(bytes)),
                },
                Item::Link(target) => EntryKind::Symlink {
                    target: target.to_owned(),
                },
            };
            Some(Ok(ArchiveEntry {
                name: name.to_owned(),
                kind,
            }))
        }
    }

    #[test]
    fn extracts_files_and_directories() {
        let dir = tempdir().unwrap();
        let mut source = MemorySource::new(vec![
            ("docs/", Item::Dir),
            ("docs/readme.txt", Item::File(b"0123456789", false)),
            ("bin\\tool", Item::File(b"#!/bin/sh\n", true)),
        ]);

        let report = extract_entries(&mut source, dir.path(), &ExtractOptions::default()).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 1);
        assert_eq!(report.bytes, 20);
        assert_eq!(std::fs::read(dir.path().join("docs/readme.txt")).unwrap(), b"0123456789");
        assert!(dir.path().join("bin/tool").is_file());
    }

    #[test]
    fn strip_root_flattens_output() {
        let dir = tempdir().unwrap();
        let mut source = MemorySource::new(vec![
            ("top/a.txt", Item::File(b"a", false)),
            ("top/dir/b.txt", Item::File(b"b", false)),
        ]);

        extract_entries(&mut source, dir.path(), &ExtractOptions::new().strip_root(true)).unwrap();

        assert!(dir.path().join("a.txt").is_file());
        assert!(dir.path().join("dir/b.txt").is_file());
        assert!(!dir.path().join("top").exists());
    }

    #[test]
    fn strip_root_rejects_foreign_prefix() {
        let dir = tempdir().unwrap();
        let mut source = MemorySource::new(vec![
            ("top/", Item::Dir),
            ("top/a.txt", Item::File(b"a", false)),
            ("elsewhere/b.txt", Item::File(b"b", false)),
        ]);

        let err = extract_entries(&mut source, dir.path(), &ExtractOptions::new().strip_root(true))
            .unwrap_err();
        assert!(matches!(err, Error::StripRootMismatch { .. }));
    }

    #[test]
    fn invalid_name_is_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let mut source = MemorySource::new(vec![("../evil", Item::File(b"x", false))]);

        let err = extract_entries(&mut source, dir.path(), &ExtractOptions::default()).unwrap_err();

        assert!(matches!(err, Error::InvalidEntryName { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn escaping_symlink_is_skipped() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        let mut source = MemorySource::new(vec![
            ("lib/libz.so.1", Item::File(b"elf", false)),
            ("lib/libz.so", Item::Link("libz.so.1")),
            ("lib/escape", Item::Link("../../secret")),
            ("root", Item::Link(".")),
            ("after.txt", Item::File(b"still here", false)),
        ]);

        let report = extract_entries(&mut source, &target, &ExtractOptions::default()).unwrap();

        assert_eq!(report.symlinks, 1);
        assert_eq!(report.skipped_symlinks, 2);
        assert!(target.join("lib/libz.so").is_symlink());
        assert!(std::fs::symlink_metadata(target.join("lib/escape")).is_err());
        assert!(std::fs::symlink_metadata(target.join("root")).is_err());
        assert!(target.join("after.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn current_dir_segments_cannot_smuggle_escaping_symlink() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(dir.path().join("secret"), "outside").unwrap();
        let mut source = MemorySource::new(vec![
            ("a/./l", Item::Link("../../secret")),
            ("./a/m", Item::Link("../../secret")),
            ("./a/ok", Item::Link("m2")),
            ("a/m2", Item::File(b"inside", false)),
        ]);

        let report = extract_entries(&mut source, &target, &ExtractOptions::default()).unwrap();

        assert_eq!(report.symlinks, 1);
        assert_eq!(report.skipped_symlinks, 2);
        assert!(std::fs::symlink_metadata(target.join("a/l")).is_err());
        assert!(std::fs::symlink_metadata(target.join("a/m")).is_err());
        assert_eq!(std::fs::read_to_string(target.join("a/ok")).unwrap(), "inside");
    }

    #[test]
    fn root_entry_is_ignored() {
        let dir = tempdir().unwrap();
        let mut source = MemorySource::new(vec![
            ("./", Item::Dir),
            ("./bin/tool", Item::File(b"x", false)),
        ]);

        let report = extract_entries(&mut source, dir.path(), &ExtractOptions::default()).unwrap();

        assert_eq!(report.directories, 0);
        assert!(dir.path().join("bin/tool").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn file_over_existing_symlink_does_not_follow_it() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("real"), "original").unwrap();
        let mut source = MemorySource::new(vec![
            ("alias", Item::Link("real")),
            ("alias", Item::File(b"replacement", false)),
        ]);

        extract_entries(&mut source, &target, &ExtractOptions::default()).unwrap();

        assert_eq!(std::fs::read_to_string(target.join("real")).unwrap(), "original");
        assert!(!target.join("alias").is_symlink());
        assert_eq!(std::fs::read_to_string(target.join("alias")).unwrap(), "replacement");
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_fixed_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let mut source = MemorySource::new(vec![
            ("bin/tool", Item::File(b"x", true)),
            ("share/data", Item::File(b"y", false)),
        ]);

        extract_entries(&mut source, dir.path(), &ExtractOptions::default()).unwrap();

        let tool = std::fs::metadata(dir.path().join("bin/tool")).unwrap();
        assert_eq!(tool.permissions().mode() & 0o777, 0o755);
        let data = std::fs::metadata(dir.path().join("share/data")).unwrap();
        assert_eq!(data.permissions().mode() & 0o111, 0);
    }

    #[test]
    fn output_path_splits_segments() {
        let base = Path::new("base");
        assert_eq!(output_path(base, "a/b/c"), base.join("a").join("b").join("c"));
    }
}

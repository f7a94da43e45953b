use crate::descriptor::ContentDescriptor;
use crate::{Error, Result};
use depcache_archive::ExtractOptions;
use depcache_fs::AtomicWriteOptions;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The file recording which descriptor a target directory was extracted with.
#[derive(Clone, Debug)]
pub struct FlagFile {
    path: PathBuf,
    code_version: u32,
}

impl FlagFile {
    pub fn new(path: impl Into<PathBuf>, code_version: u32) -> Self {
        Self {
            path: path.into(),
            code_version,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn descriptor(
        &self,
        archive: &Path,
        target: &Path,
        options: &ExtractOptions,
    ) -> Result<Vec<u8>> {
        ContentDescriptor::compute(self.code_version, archive, target, options).map(|d| d.render())
    }

    /// True when the flag exists, `target` is a directory, and the stored
    /// bytes equal a freshly computed descriptor.
    pub fn is_valid(
        &self,
        archive: &Path,
        target: &Path,
        options: &ExtractOptions,
    ) -> Result<bool> {
        let stored = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(flag = %self.path.display(), "no flag file");
                return Ok(false);
            }
            Err(e) => return Err(Error::io("failed to read flag file", &self.path, e)),
        };
        if !target.is_dir() {
            debug!(target_dir = %target.display(), "flag present but target directory is missing");
            return Ok(false);
        }

        let expected = self.descriptor(archive, target, options)?;
        if stored != expected {
            warn!(
                flag = %self.path.display(),
                stored = %String::from_utf8_lossy(&stored),
                expected = %String::from_utf8_lossy(&expected),
                "flag file does not match directory contents"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// [`is_valid`](Self::is_valid), refreshing both mtimes on a hit so the
    /// entry looks recently used to cleanup.
    pub fn check_and_touch(
        &self,
        archive: &Path,
        target: &Path,
        options: &ExtractOptions,
    ) -> Result<bool> {
        if !self.is_valid(archive, target, options)? {
            return Ok(false);
        }
        touch_all(&[target, self.path.as_path()]);
        Ok(true)
    }

    /// Record the descriptor of a freshly extracted `target`, then read it back.
    pub fn write_and_verify(
        &self,
        archive: &Path,
        target: &Path,
        options: &ExtractOptions,
    ) -> Result<()> {
        let descriptor = self.descriptor(archive, target, options)?;
        depcache_fs::atomic_write(&self.path, &descriptor, AtomicWriteOptions::new())?;

        if !self.is_valid(archive, target, options)? {
            return Err(Error::InconsistentFlag {
                flag: self.path.clone(),
                target: target.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Bump every mtime it can. Failures are logged; returns how many succeeded.
fn touch_all(paths: &[&Path]) -> usize {
    let mut touched = 0;
    for path in paths {
        match depcache_fs::touch(path) {
            Ok(()) => touched += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to refresh modification time")
            }
        }
    }
    touched
}

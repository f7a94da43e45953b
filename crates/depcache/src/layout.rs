use crate::{Error, Result};
use depcache_archive::ExtractOptions;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Naming of targets and flag files under one cache root.
///
/// ```text
/// <root>/<archive>.<hash>.d/            extracted archive
/// <root>/<archive>.<hash>.d.flag        its descriptor
/// <root>/<hash>-<target>.flag.txt       descriptor for a caller-chosen target
/// ```
#[derive(Clone, Debug)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target derived from the canonical archive path and the options.
    pub fn archive_target(&self, archive: &Path, options: &ExtractOptions) -> Result<PathBuf> {
        let archive = std::fs::canonicalize(archive)
            .map_err(|e| Error::io("failed to canonicalize archive", archive, e))?;
        let name = archive.file_name().ok_or_else(|| Error::NoFileName { path: archive.clone() })?;

        let key = format!("{}{}", archive.to_string_lossy(), options.short_string());
        let mut dir = OsString::from(name);
        dir.push(format!(".{}.d", short_hash(key.as_bytes())));
        Ok(self.root.join(dir))
    }

    pub fn archive_flag(&self, target: &Path) -> PathBuf {
        let mut flag = target.as_os_str().to_os_string();
        flag.push(".flag");
        PathBuf::from(flag)
    }

    /// Flag for a target outside the cache root. `target` should be canonical.
    pub fn explicit_flag(&self, target: &Path) -> Result<PathBuf> {
        let name = target.file_name().ok_or_else(|| Error::NoFileName {
            path: target.to_path_buf(),
        })?;
        let hash = short_hash(target.to_string_lossy().as_bytes());
        let mut flag = OsString::from(format!("{hash}-"));
        flag.push(name);
        flag.push(".flag.txt");
        Ok(self.root.join(flag))
    }
}

/// Canonical form of a directory that may not exist yet: the existing
/// path canonicalized, or the canonical parent joined with the file name.
pub fn canonical_target(target: &Path) -> Result<PathBuf> {
    if let Ok(path) = std::fs::canonicalize(target) {
        return Ok(path);
    }
    let name = target.file_name().ok_or_else(|| Error::NoFileName {
        path: target.to_path_buf(),
    })?;
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let parent = std::fs::canonicalize(parent)
        .map_err(|e| Error::io("failed to canonicalize parent of", target, e))?;
    Ok(parent.join(name))
}

/// First six hex digits of the SHA-256 of `bytes`.
pub fn short_hash(bytes: &[u8]) -> String {
    hex::encode(&Sha256::digest(bytes)[..3])
}

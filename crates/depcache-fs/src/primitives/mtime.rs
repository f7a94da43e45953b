use crate::{Error, Result};
use filetime::FileTime;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Bump the modification time of `path` to now.
pub fn touch(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    filetime::set_file_mtime(path, FileTime::now()).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Time elapsed between the mtime of `path` and `now`.
///
/// An mtime in the future counts as zero age. Symlinks are not followed.
pub fn modified_age(path: impl AsRef<Path>, now: SystemTime) -> Result<Duration> {
    let path = path.as_ref();
    let modified = std::fs::symlink_metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::Metadata {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(now.duration_since(modified).unwrap_or(Duration::ZERO))
}

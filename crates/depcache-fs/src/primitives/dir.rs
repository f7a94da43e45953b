use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Make `path` an existing, empty directory.
pub fn clean_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return fs::create_dir_all(path).map_err(|e| Error::CreateDir {
                path: path.to_path_buf(),
                source: e,
            });
        }
        Err(e) => {
            return Err(Error::Metadata {
                path: path.to_path_buf(),
                source: e,
            });
        }
        Ok(meta) if !meta.is_dir() => {
            return Err(Error::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
    }

    let entries = fs::read_dir(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        remove_path(entry.path())?;
    }
    Ok(())
}

/// Remove a file, symlink or directory tree. A missing path is not an error.
pub fn remove_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(Error::Metadata {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        remove_file_or_link(path)
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(windows)]
fn remove_file_or_link(path: &Path) -> io::Result<()> {
    // directory symlinks and junctions need remove_dir on Windows
    fs::remove_file(path).or_else(|_| fs::remove_dir(path))
}

#[cfg(not(windows))]
fn remove_file_or_link(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

/// Rename `path` to a unique sibling (`<name>.deleted.<uuid>`) and return it.
pub fn rename_aside(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let parent = path.parent().ok_or_else(|| Error::NoParent {
        path: path.to_path_buf(),
    })?;
    let name = path.file_name().ok_or_else(|| Error::NoParent {
        path: path.to_path_buf(),
    })?;

    let aside = parent.join(format!(
        "{}.deleted.{}",
        name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    ));
    fs::rename(path, &aside).map_err(|e| Error::Rename {
        from:   path.to_path_buf(),
        to:     aside.clone(),
        source: e,
    })?;
    Ok(aside)
}

use crate::permissions::PermissionMode;
use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: Option<PermissionMode>,
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn permissions(mut self, mode: PermissionMode) -> Self {
        self.permissions = Some(mode);
        self
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Write `content` to a sibling temp file, then rename it over `path`.
///
/// Readers observe either the old bytes or the new bytes, never a prefix.
pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let parent = path.parent().ok_or_else(|| Error::NoParent {
        path: path.to_path_buf(),
    })?;

    let tmp_path = parent.join(format!(".tmp.{}.depcache", uuid::Uuid::new_v4().simple()));

    let write = |tmp: &Path| -> std::io::Result<()> {
        let mut file = fs::File::create(tmp)?;
        file.write_all(content)?;
        if options.sync {
            file.sync_all()?;
        }
        Ok(())
    };

    if let Err(e) = write(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::Write {
            path: tmp_path,
            source: e,
        });
    }

    if let Some(mode) = options.permissions {
        if let Err(e) = mode.apply_to_path(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Rename {
            from:   tmp_path.clone(),
            to:     path.to_path_buf(),
            source: e,
        }
    })
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

use crate::{Error, Result};
use std::path::Path;

/// Create a symlink at `link` pointing to `target`, stored verbatim.
pub fn create_symlink(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(|e| Error::Write {
            path: link.to_path_buf(),
            source: e,
        })
    }

    #[cfg(windows)]
    {
        let resolved = link.parent().map(|p| p.join(target));
        let is_dir = resolved.is_some_and(|p| p.is_dir());
        let result = if is_dir {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.map_err(|e| Error::Write {
            path: link.to_path_buf(),
            source: e,
        })
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = target;
        Err(Error::Write {
            path: link.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Unsupported, "symlinks not supported"),
        })
    }
}

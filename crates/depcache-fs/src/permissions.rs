#[cfg(unix)]
use crate::Error;
use crate::Result;
use std::path::Path;

/// Permission modes applied to extracted files.
///
/// Archive mode bits are never copied verbatim: an entry is either
/// executable or it is not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Leave whatever the process umask produced.
    #[default]
    Inherit,

    /// On Unix: `0o755` (rwxr-xr-x).
    Executable,
}

impl PermissionMode {
    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::Executable => Some(0o755),
        }
    }

    /// Apply the mode to `path`. A no-op on non-Unix platforms.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let Some(mode) = self.to_unix_mode() else {
                return Ok(());
            };
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
                Error::Write {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }

        #[cfg(not(unix))]
        let _ = path;

        Ok(())
    }
}

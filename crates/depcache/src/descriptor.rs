use crate::{Error, Result};
use depcache_archive::ExtractOptions;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bump whenever extraction output can differ for the same archive.
/// Every flag written by an older value stops matching.
pub const EXTRACT_CODE_VERSION: u32 = 1;

/// Structural fingerprint of an extracted directory.
///
/// Counts and sizes every non-directory entry below the target without
/// following symlinks. File contents are not hashed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDescriptor {
    pub code_version: u32,
    pub archive: PathBuf,
    pub file_count: u64,
    pub file_size_sum: u64,
    pub options: &'static str,
}

impl ContentDescriptor {
    pub fn compute(
        code_version: u32,
        archive: &Path,
        target: &Path,
        options: &ExtractOptions,
    ) -> Result<Self> {
        let archive = std::fs::canonicalize(archive)
            .map_err(|e| Error::io("failed to canonicalize archive", archive, e))?;

        let mut file_count = 0;
        let mut file_size_sum = 0;
        for entry in WalkDir::new(target).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| Error::Walk {
                path: target.to_path_buf(),
                source: e,
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let meta = entry.metadata().map_err(|e| Error::Walk {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            file_count += 1;
            file_size_sum += meta.len();
        }

        Ok(Self {
            code_version,
            archive,
            file_count,
            file_size_sum,
            options: options.short_string(),
        })
    }

    /// The exact bytes stored in a flag file.
    pub fn render(&self) -> Vec<u8> {
        format!(
            "{}\n{}\nfileCount:{}\nfileSizeSum:{}\noptions:{}\n",
            self.code_version,
            self.archive.to_string_lossy(),
            self.file_count,
            self.file_size_sum,
            self.options,
        )
        .into_bytes()
    }
}

use crate::cleanup::CacheCleanup;
use crate::config::CacheConfig;
use crate::descriptor::EXTRACT_CODE_VERSION;
use crate::flag::FlagFile;
use crate::layout::{CacheLayout, canonical_target};
use crate::lock::StripedLock;
use crate::{Error, Result};
use depcache_archive::ExtractOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Extractions that actually unpacked an archive.
    pub extractions: u64,
    pub cache_hits: u64,
}

/// Process context for the extraction cache.
///
/// Create one per process and share it (e.g. behind an `Arc`). It owns the
/// per-target lock, the cleanup latch and the counters.
#[derive(Debug)]
pub struct DependencyCache {
    config: CacheConfig,
    locks: StripedLock,
    cleanup: CacheCleanup,
    code_version: u32,
    extractions: AtomicU64,
    cache_hits: AtomicU64,
}

impl Default for DependencyCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl DependencyCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            locks: StripedLock::new(config.lock_stripes.max(1)),
            cleanup: CacheCleanup::from_config(&config),
            code_version: EXTRACT_CODE_VERSION,
            extractions: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            config,
        }
    }

    /// Override the extraction code version written into flag files.
    pub fn with_code_version(mut self, version: u32) -> Self {
        self.code_version = version;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn code_version(&self) -> u32 {
        self.code_version
    }

    pub fn stats(&self) -> ExtractStats {
        ExtractStats {
            extractions: self.extractions.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }

    /// Extract `archive` into a directory under `cache_root` named after the
    /// archive and options, and return that directory.
    pub fn extract_to_cache(
        &self,
        cache_root: &Path,
        archive: &Path,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        self.cleanup_before_extract(cache_root);

        let layout = CacheLayout::new(open_root(cache_root)?);
        let target = canonical_target(&layout.archive_target(archive, options)?)?;
        let flag = FlagFile::new(layout.archive_flag(&target), self.code_version);
        self.extract_guarded(archive, &target, &flag, options)?;
        Ok(target)
    }

    /// Extract `archive` into a caller-chosen `target`; the flag file is kept
    /// under `cache_root`.
    pub fn extract_to(
        &self,
        archive: &Path,
        target: &Path,
        cache_root: &Path,
        options: &ExtractOptions,
    ) -> Result<()> {
        self.cleanup_before_extract(cache_root);

        let target = canonical_target(target)?;
        let layout = CacheLayout::new(open_root(cache_root)?);
        let flag = FlagFile::new(layout.explicit_flag(&target)?, self.code_version);
        self.extract_guarded(archive, &target, &flag, options)
    }

    pub fn run_cleanup_if_due(&self, cache_root: &Path) -> bool {
        self.cleanup.run_if_due(cache_root)
    }

    fn cleanup_before_extract(&self, cache_root: &Path) {
        if self.config.cleanup_on_extract {
            self.cleanup.run_if_due(cache_root);
        }
    }

    fn extract_guarded(
        &self,
        archive: &Path,
        target: &Path,
        flag: &FlagFile,
        options: &ExtractOptions,
    ) -> Result<()> {
        let _guard = self.locks.acquire(target);

        if flag.check_and_touch(archive, target, options)? {
            debug!(target_dir = %target.display(), "cache hit");
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let started = Instant::now();
        info!(
            archive = %archive.display(),
            target_dir = %target.display(),
            strip_root = options.strip_root,
            "extracting"
        );

        depcache_fs::clean_dir(target).map_err(|e| match e {
            depcache_fs::Error::NotADirectory { path } => Error::NotADirectory { path },
            e => Error::Fs(e),
        })?;
        let report = depcache_archive::extract_archive(archive, target, options)?;
        flag.write_and_verify(archive, target, options)?;
        self.extractions.fetch_add(1, Ordering::Relaxed);

        info!(
            target_dir = %target.display(),
            format = ?report.format,
            files = report.files,
            directories = report.directories,
            symlinks = report.symlinks,
            skipped_symlinks = report.skipped_symlinks,
            bytes = report.bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extracted"
        );
        Ok(())
    }
}

/// Create `cache_root` if needed and return its canonical form, so every
/// spelling of the same root yields the same targets and lock keys.
fn open_root(cache_root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(cache_root)
        .map_err(|e| Error::io("failed to create cache root", cache_root, e))?;
    std::fs::canonicalize(cache_root)
        .map_err(|e| Error::io("failed to canonicalize cache root", cache_root, e))
}

//! Two-stage, age-based eviction over the direct children of a cache root.
//!
//! A stale entry first gains a `<name>.marked.for.cleanup` sibling. Only a
//! later pass that still finds it stale and marked removes it, so anything
//! used in between survives.

use crate::config::CacheConfig;
use crate::{Error, Result};
use depcache_fs::AtomicWriteOptions;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

pub const MARKER_SUFFIX: &str = ".marked.for.cleanup";
pub const LAST_CLEANUP_MARKER: &str = ".last.cleanup.marker";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheEntryState {
    Unmarked,
    Marked,
}

/// One direct child of the cache root, as a pass sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    Entry { state: CacheEntryState, stale: bool },
    Marker { entry_exists: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CleanupAction {
    Keep,
    Mark,
    Unmark,
    Evict,
    DropOrphanMarker,
}

/// The whole eviction policy.
pub fn transition(observed: Observation) -> CleanupAction {
    use CacheEntryState::*;
    match observed {
        Observation::Marker { entry_exists: true } => CleanupAction::Keep,
        Observation::Marker { entry_exists: false } => CleanupAction::DropOrphanMarker,
        Observation::Entry { state: Unmarked, stale: false } => CleanupAction::Keep,
        Observation::Entry { state: Marked, stale: false } => CleanupAction::Unmark,
        Observation::Entry { state: Unmarked, stale: true } => CleanupAction::Mark,
        Observation::Entry { state: Marked, stale: true } => CleanupAction::Evict,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub kept: usize,
    pub marked: usize,
    pub unmarked: usize,
    pub evicted: usize,
    pub orphan_markers: usize,
    pub failed: usize,
}

/// Cleanup policy plus the once-per-context latch.
#[derive(Debug)]
pub struct CacheCleanup {
    max_age: Duration,
    interval: Duration,
    ran: AtomicBool,
}

impl CacheCleanup {
    pub fn new(max_age: Duration, interval: Duration) -> Self {
        Self {
            max_age,
            interval,
            ran: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_age(), config.cleanup_interval())
    }

    pub fn has_run(&self) -> bool {
        self.ran.load(Ordering::Acquire)
    }

    /// Run a pass over `root` unless this context already tried one or the
    /// last pass on `root` is younger than the interval. Returns whether a
    /// pass ran. Never fails.
    pub fn run_if_due(&self, root: &Path) -> bool {
        if !root.is_dir() {
            debug!(root = %root.display(), "cache root does not exist, nothing to clean");
            return false;
        }
        if self.ran.swap(true, Ordering::AcqRel) {
            return false;
        }

        let now = SystemTime::now();
        if !self.is_due(root, now) {
            debug!(root = %root.display(), "cleanup not due yet");
            return false;
        }

        match self.run_pass(root, now) {
            Ok(summary) => info!(
                root = %root.display(),
                marked = summary.marked,
                unmarked = summary.unmarked,
                evicted = summary.evicted,
                orphan_markers = summary.orphan_markers,
                failed = summary.failed,
                "cache cleanup finished"
            ),
            Err(e) => warn!(root = %root.display(), error = %e, "cache cleanup failed"),
        }
        if let Err(e) = write_last_cleanup_marker(root) {
            warn!(root = %root.display(), error = %e, "failed to record cleanup time");
        }
        true
    }

    /// Run a pass now regardless of the interval, and record it.
    pub fn run_now(&self, root: &Path) -> Result<CleanupSummary> {
        self.ran.store(true, Ordering::Release);
        let summary = self.run_pass(root, SystemTime::now())?;
        write_last_cleanup_marker(root)?;
        Ok(summary)
    }

    pub fn is_due(&self, root: &Path, now: SystemTime) -> bool {
        let marker = root.join(LAST_CLEANUP_MARKER);
        if std::fs::symlink_metadata(&marker).is_err() {
            return true;
        }
        match depcache_fs::modified_age(&marker, now) {
            Ok(age) => age >= self.interval,
            Err(e) => {
                warn!(error = %e, "cannot read last cleanup time");
                true
            }
        }
    }

    /// One unconditional pass. Per-entry failures are logged and counted.
    pub fn run_pass(&self, root: &Path, now: SystemTime) -> Result<CleanupSummary> {
        let read = std::fs::read_dir(root)
            .map_err(|e| Error::io("failed to list cache root", root, e))?;
        let mut names = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| Error::io("failed to list cache root", root, e))?;
            names.push(entry.file_name());
        }

        let mut summary = CleanupSummary::default();
        for name in names {
            if name.as_os_str() == OsStr::new(LAST_CLEANUP_MARKER) {
                continue;
            }
            match self.visit(root, &name, now) {
                Ok(action) => match action {
                    CleanupAction::Keep => summary.kept += 1,
                    CleanupAction::Mark => summary.marked += 1,
                    CleanupAction::Unmark => summary.unmarked += 1,
                    CleanupAction::Evict => summary.evicted += 1,
                    CleanupAction::DropOrphanMarker => summary.orphan_markers += 1,
                },
                Err(e) => {
                    warn!(
                        entry = %root.join(&name).display(),
                        error = %e,
                        "failed to clean cache entry"
                    );
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    fn visit(&self, root: &Path, name: &OsStr, now: SystemTime) -> Result<CleanupAction> {
        let path = root.join(name);

        if let Some(entry_name) = name.to_str().and_then(|n| n.strip_suffix(MARKER_SUFFIX)) {
            let entry_exists = exists(&root.join(entry_name));
            let action = transition(Observation::Marker { entry_exists });
            if action == CleanupAction::DropOrphanMarker {
                debug!(marker = %path.display(), "removing orphaned cleanup marker");
                depcache_fs::remove_path(&path)?;
            }
            return Ok(action);
        }

        let marker = marker_path(root, name);
        let state = if exists(&marker) {
            CacheEntryState::Marked
        } else {
            CacheEntryState::Unmarked
        };
        let stale = depcache_fs::modified_age(&path, now)? > self.max_age;

        let action = transition(Observation::Entry { state, stale });
        match action {
            CleanupAction::Keep | CleanupAction::DropOrphanMarker => {}
            CleanupAction::Mark => {
                debug!(entry = %path.display(), "marking stale cache entry");
                std::fs::write(&marker, b"")
                    .map_err(|e| Error::io("failed to create marker", &marker, e))?;
            }
            CleanupAction::Unmark => {
                debug!(entry = %path.display(), "entry used again, cancelling eviction");
                depcache_fs::remove_path(&marker)?;
            }
            CleanupAction::Evict => {
                evict(&path)?;
                depcache_fs::remove_path(&marker)?;
            }
        }
        Ok(action)
    }
}

fn evict(path: &Path) -> Result<()> {
    let aside = depcache_fs::rename_aside(path)?;
    info!(entry = %path.display(), "evicting stale cache entry");
    if let Err(e) = depcache_fs::remove_path(&aside) {
        // the renamed leftover is an ordinary entry and ages out later
        warn!(entry = %aside.display(), error = %e, "failed to delete evicted entry");
    }
    Ok(())
}

fn marker_path(root: &Path, name: &OsStr) -> PathBuf {
    let mut marker = OsString::from(name);
    marker.push(MARKER_SUFFIX);
    root.join(marker)
}

fn exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

fn write_last_cleanup_marker(root: &Path) -> Result<()> {
    let stamp = chrono::Utc::now().to_rfc3339();
    depcache_fs::atomic_write(
        root.join(LAST_CLEANUP_MARKER),
        stamp.as_bytes(),
        AtomicWriteOptions::new(),
    )?;
    Ok(())
}

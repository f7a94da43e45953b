//! Download-and-extraction cache for build dependencies.
//!
//! Takes a downloaded archive and produces a validated extracted directory
//! that is reused across calls and across processes. A flag file beside each
//! target records a [`ContentDescriptor`]; a matching flag means the
//! directory is usable as is. Extraction of one target is serialized through
//! a [`StripedLock`], and stale entries are evicted in two passes by
//! [`CacheCleanup`].
//!
//! ```no_run
//! use depcache::{DependencyCache, ExtractOptions};
//! use std::path::Path;
//!
//! # fn main() -> depcache::Result<()> {
//! let cache = DependencyCache::default();
//! let jdk = cache.extract_to_cache(
//!     Path::new("/home/me/.cache/deps"),
//!     Path::new("/home/me/.cache/deps/1a2b3c-jdk.tar.gz"),
//!     &ExtractOptions::new().strip_root(true),
//! )?;
//! println!("{}", jdk.display());
//! # Ok(())
//! # }
//! ```

mod cache;
pub mod cleanup;
mod config;
mod descriptor;
mod error;
mod flag;
pub mod layout;
mod lock;

pub use cache::{DependencyCache, ExtractStats};
pub use cleanup::{CacheCleanup, CacheEntryState, CleanupAction, CleanupSummary};
pub use config::CacheConfig;
pub use depcache_archive::ExtractOptions;
pub use descriptor::{ContentDescriptor, EXTRACT_CODE_VERSION};
pub use error::{Error, Result};
pub use flag::FlagFile;
pub use layout::CacheLayout;
pub use lock::StripedLock;

//! Filesystem primitives used by the extraction cache.
//!
//! Every fallible operation reports the path it failed on.

mod error;
pub mod permissions;
pub mod primitives;

pub use error::{Error, Result};
pub use permissions::PermissionMode;
pub use primitives::{
    AtomicWriteOptions, atomic_read, atomic_write, clean_dir, create_symlink, modified_age,
    remove_path, rename_aside, touch,
};

pub mod atomic_write;
pub mod dir;
pub mod mtime;
pub mod symlink;

pub use atomic_write::{AtomicWriteOptions, atomic_read, atomic_write};
pub use dir::{clean_dir, remove_path, rename_aside};
pub use mtime::{modified_age, touch};
pub use symlink::create_symlink;

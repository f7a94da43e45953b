/// Options for a single extraction.
///
/// The set is small on purpose: it is encoded into flag files, so every
/// new option changes what counts as a valid cache entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExtractOptions {
    pub strip_root: bool,
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the single top-level directory every entry is wrapped in.
    pub fn strip_root(mut self, strip: bool) -> Self {
        self.strip_root = strip;
        self
    }

    /// Compact encoding used in flag files and cache directory hashes.
    pub fn short_string(&self) -> &'static str {
        if self.strip_root { "s" } else { "" }
    }
}

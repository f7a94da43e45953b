use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// A fixed array of mutexes; a key locks the slot `hash(key) % len`.
///
/// Distinct keys may share a slot. That only serializes unrelated work.
pub struct StripedLock {
    stripes: Box<[Mutex<()>]>,
}

impl StripedLock {
    /// # Panics
    ///
    /// Panics if `stripes` is zero.
    pub fn new(stripes: usize) -> Self {
        assert!(stripes > 0, "striped lock needs at least one stripe");
        Self {
            stripes: (0..stripes).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn stripe_of<K: Hash + ?Sized>(&self, key: &K) -> usize {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    /// Block until the slot for `key` is free. Released on drop.
    pub fn acquire<K: Hash + ?Sized>(&self, key: &K) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_of(key)].lock()
    }
}

impl std::fmt::Debug for StripedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripedLock").field("stripes", &self.stripes.len()).finish()
    }
}

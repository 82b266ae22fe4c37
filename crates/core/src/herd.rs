//! Herd identifiers.
//!
//! Every creature group emitted by worldgen shares one herd id so that
//! downstream AI can treat the members as a pack. Ids are drawn from a single
//! process-wide counter and are never reused within a world's lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque grouping tag shared by all members of one spawned group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HerdId(pub u64);

impl fmt::Display for HerdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "herd#{}", self.0)
    }
}

/// Atomic, monotonic herd id source.
///
/// Shared between generation workers behind an `Arc`; `next` is the only
/// operation that mutates it.
#[derive(Debug)]
pub struct HerdIdAllocator {
    next: AtomicU64,
}

impl HerdIdAllocator {
    /// First id handed out by a fresh world.
    pub const FIRST: u64 = 1;

    /// Allocator for a fresh world.
    pub fn new() -> Self {
        Self::starting_at(Self::FIRST)
    }

    /// Resume from a persisted value (the id that would be issued next).
    pub fn starting_at(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next.max(Self::FIRST)),
        }
    }

    /// Issue the next herd id.
    pub fn next(&self) -> HerdId {
        HerdId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Id that the next call to [`HerdIdAllocator::next`] will return.
    ///
    /// Used when saving the world so the counter survives restarts.
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for HerdIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn ids_are_monotonic() {
        let alloc = HerdIdAllocator::new();
        let a = alloc.next();
        let b = alloc.next();
        assert_eq!(a, HerdId(1));
        assert!(b > a);
        assert_eq!(alloc.peek_next(), 3);
    }

    #[test]
    fn resumes_from_saved_counter() {
        let alloc = HerdIdAllocator::starting_at(500);
        assert_eq!(alloc.next(), HerdId(500));

        // Zero is reserved; resuming at zero starts at FIRST.
        let alloc = HerdIdAllocator::starting_at(0);
        assert_eq!(alloc.next(), HerdId(HerdIdAllocator::FIRST));
    }

    #[test]
    fn concurrent_workers_never_share_ids() {
        let alloc = Arc::new(HerdIdAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let alloc = Arc::clone(&alloc);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| alloc.next()).collect::<Vec<_>>()
            }));
        }

        let mut seen = BTreeSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate herd id {id}");
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn herd_id_display() {
        assert_eq!(HerdId(7).to_string(), "herd#7");
    }
}

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::access::ChunkSource;
use crate::chunk::{Chunk, ChunkPos};

/// Live-world chunk arena with an LRU eviction policy.
/// Uses BTreeMap for deterministic iteration order.
pub struct ChunkStorage {
    chunks: BTreeMap<ChunkPos, Chunk>,
    lru: LruCache<ChunkPos, ()>,
    capacity: usize,
}

impl ChunkStorage {
    /// Create a storage with the desired maximum chunk count (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            chunks: BTreeMap::new(),
            lru: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            capacity,
        }
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Insert a fully generated chunk, evicting the least recently used one
    /// when full. Returns the chunk previously stored at that position.
    pub fn insert(&mut self, chunk: Chunk) -> Option<Chunk> {
        let pos = chunk.position();
        let previous = self.chunks.remove(&pos);
        if previous.is_none() {
            self.evict_if_needed();
        }
        self.chunks.insert(pos, chunk);
        self.touch(pos);
        previous
    }

    /// Obtain mutable access to a chunk, creating an empty one if necessary.
    pub fn ensure_chunk(&mut self, pos: ChunkPos) -> &mut Chunk {
        if !self.chunks.contains_key(&pos) {
            self.evict_if_needed();
        }
        self.touch(pos);
        self.chunks.entry(pos).or_insert_with(|| Chunk::new(pos))
    }

    /// Attempt to fetch a chunk immutably. Does not refresh recency.
    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Fetch a chunk mutably (without creating it).
    pub fn get_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        if self.chunks.contains_key(&pos) {
            self.touch(pos);
        }
        self.chunks.get_mut(&pos)
    }

    pub fn remove(&mut self, pos: ChunkPos) -> Option<Chunk> {
        self.lru.pop(&pos);
        self.chunks.remove(&pos)
    }

    /// Iterate over currently resident chunk positions.
    pub fn iter_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    fn touch(&mut self, pos: ChunkPos) {
        self.lru.put(pos, ());
    }

    fn evict_if_needed(&mut self) {
        while self.chunks.len() >= self.capacity {
            match self.lru.pop_lru() {
                Some((oldest, _)) => {
                    self.chunks.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

impl ChunkSource for ChunkStorage {
    fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.get(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_evicts_old_chunks() {
        let mut storage = ChunkStorage::new(2);
        let a = ChunkPos::new(0, 0);
        let b = ChunkPos::new(1, 0);
        let c = ChunkPos::new(2, 0);
        storage.ensure_chunk(a);
        storage.ensure_chunk(b);
        assert_eq!(storage.len(), 2);
        storage.ensure_chunk(c);
        assert_eq!(storage.len(), 2);
        assert!(storage.get(a).is_none());
        assert!(storage.get(b).is_some());
        assert!(storage.get(c).is_some());
    }

    #[test]
    fn touching_a_chunk_protects_it_from_eviction() {
        let mut storage = ChunkStorage::new(2);
        let a = ChunkPos::new(0, 0);
        let b = ChunkPos::new(0, 1);
        storage.insert(Chunk::new(a));
        storage.insert(Chunk::new(b));
        storage.get_mut(a);
        storage.insert(Chunk::new(ChunkPos::new(0, 2)));
        assert!(storage.contains(a));
        assert!(!storage.contains(b));
    }

    #[test]
    fn reinserting_replaces_without_eviction() {
        let mut storage = ChunkStorage::new(2);
        let a = ChunkPos::new(0, 0);
        storage.insert(Chunk::new(a));
        storage.insert(Chunk::new(ChunkPos::new(1, 1)));
        assert!(storage.insert(Chunk::new(a)).is_some());
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn iter_positions_is_sorted() {
        let mut storage = ChunkStorage::new(8);
        for pos in [ChunkPos::new(3, 0), ChunkPos::new(-1, 5), ChunkPos::new(0, 0)] {
            storage.ensure_chunk(pos);
        }
        let positions: Vec<_> = storage.iter_positions().collect();
        assert_eq!(
            positions,
            vec![ChunkPos::new(-1, 5), ChunkPos::new(0, 0), ChunkPos::new(3, 0)]
        );
    }

    #[test]
    fn acts_as_chunk_source() {
        let mut storage = ChunkStorage::new(4);
        storage.ensure_chunk(ChunkPos::new(2, 2));
        let source: &dyn ChunkSource = &storage;
        assert!(source.chunk(ChunkPos::new(2, 2)).is_some());
        assert!(source.chunk(ChunkPos::new(0, 0)).is_none());
    }
}

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Maps a vertex id to the worker partition that owns it for the whole job.
pub trait Partitioner<K>: Send + Sync {
    /// Must return a value in `[0, partitions)`; `partitions == 0` is read as 1.
    fn partition_of(&self, key: &K, partitions: usize) -> usize;
}

/// SipHash with fixed keys, so the mapping is stable within one build.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashPartitioner;

impl<K: Hash> Partitioner<K> for HashPartitioner {
    fn partition_of(&self, key: &K, partitions: usize) -> usize {
        partition_of(key, partitions)
    }
}

pub fn partition_of<K: Hash + ?Sized>(key: &K, partitions: usize) -> usize {
    let mut h = DefaultHasher::new();
    key.hash(&mut h);
    (h.finish() % partitions.max(1) as u64) as usize
}

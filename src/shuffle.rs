//! src/shuffle.rs
use crate::mapper::{MapSink, PartialCount};
use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Routes a word to its reducer partition. Deterministic for a given
/// reducer count; every word maps to exactly one partition.
pub fn partition_for(word: &str, reducer_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    word.hash(&mut hasher);
    (hasher.finish() % reducer_count as u64) as usize
}

/// Per-mapper shuffle buffer: buckets emitted pairs by target partition.
/// Each mapper task owns its own buffer, so no locking is involved; the
/// driver concatenates buffers once every mapper has finished.
pub struct PartitionedBuffer {
    reducer_count: usize,
    buckets: Vec<Vec<(String, PartialCount)>>,
}

impl PartitionedBuffer {
    pub fn new(reducer_count: usize) -> Self {
        Self {
            reducer_count,
            buckets: vec![Vec::new(); reducer_count],
        }
    }

    pub fn into_buckets(self) -> Vec<Vec<(String, PartialCount)>> {
        self.buckets
    }
}

impl MapSink for PartitionedBuffer {
    fn emit(&mut self, word: String, count: PartialCount) {
        let partition = partition_for(&word, self.reducer_count);
        self.buckets[partition].push((word, count));
    }
}

/// Groups a partition's pairs by word, the external group-by handed to the
/// reducer. Word order is sorted for reproducible partition files; order
/// within a group is arrival order (the reduce merge is commutative).
pub fn group_by_word(pairs: Vec<(String, PartialCount)>) -> BTreeMap<String, Vec<PartialCount>> {
    let mut groups: BTreeMap<String, Vec<PartialCount>> = BTreeMap::new();
    for (word, count) in pairs {
        groups.entry(word).or_default().push(count);
    }
    groups
}

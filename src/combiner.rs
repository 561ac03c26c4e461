//! src/combiner.rs
use crate::mapper::{PartialCount, WordFileKey};
use std::collections::HashMap;

/// Pre-reduce pass over one mapper's emitted pairs: merges partial counts
/// sharing a (word, filename) pair so at most one `PartialCount` per pair
/// crosses the shuffle. Semantically the reducer's merge step, but scoped to
/// a single mapper and re-emitting partial counts rather than a formatted
/// entry, so reducers can still merge across mappers.
pub fn combine_bucket(pairs: Vec<(String, PartialCount)>) -> Vec<(String, PartialCount)> {
    let mut merged: HashMap<WordFileKey, u64> = HashMap::new();
    for (word, partial) in pairs {
        *merged
            .entry(WordFileKey {
                word,
                filename: partial.filename,
            })
            .or_insert(0) += partial.count;
    }
    merged
        .into_iter()
        .map(|(key, count)| {
            (
                key.word,
                PartialCount {
                    filename: key.filename,
                    count,
                },
            )
        })
        .collect()
}

/// Applies `combine_bucket` to every partition bucket of one mapper's
/// output. Partition routing is untouched: a word's merged counts stay in
/// the bucket its occurrences were already routed to.
pub fn combine_map_output(
    buckets: Vec<Vec<(String, PartialCount)>>,
) -> Vec<Vec<(String, PartialCount)>> {
    buckets.into_iter().map(combine_bucket).collect()
}

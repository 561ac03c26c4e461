//! src/mapper.rs
use crate::error::EngineError;
use crate::memory::MemoryProbe;
use crate::split_reader::TextRecord;
use crate::tokenizer::{tokenize, TokenPolicy};
use std::collections::HashMap;

/// Key of the in-mapper aggregation table. Equality and hashing are
/// structural over both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WordFileKey {
    pub word: String,
    pub filename: String,
}

/// A partial occurrence count for one file, keyed externally by word.
/// Always at least 1 when first emitted; only ever summed afterwards.
/// Ordering is by filename, then count.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PartialCount {
    pub filename: String,
    pub count: u64,
}

/// Receives the (word, partial count) pairs a mapper emits. One sink per
/// mapper task; no sharing across tasks.
pub trait MapSink {
    fn emit(&mut self, word: String, count: PartialCount);
}

/// Mapper strategy, chosen once at pipeline construction.
pub enum Mapper {
    Simple(SimpleMapper),
    Combining(CombinerMapper),
}

impl Mapper {
    pub fn run(
        &mut self,
        records: impl Iterator<Item = Result<TextRecord, EngineError>>,
        sink: &mut dyn MapSink,
    ) -> Result<(), EngineError> {
        match self {
            Mapper::Simple(mapper) => mapper.run(records, sink),
            Mapper::Combining(mapper) => mapper.run(records, sink),
        }
    }
}

/// Emits one `PartialCount` per word occurrence, no local aggregation.
/// Degenerate variant kept to validate the external combiner on its own.
pub struct SimpleMapper {
    policy: TokenPolicy,
}

impl SimpleMapper {
    pub fn new(policy: TokenPolicy) -> Self {
        Self { policy }
    }

    fn run(
        &mut self,
        records: impl Iterator<Item = Result<TextRecord, EngineError>>,
        sink: &mut dyn MapSink,
    ) -> Result<(), EngineError> {
        for record in records {
            let record = record?;
            for word in tokenize(&record.line, self.policy) {
                sink.emit(
                    word,
                    PartialCount {
                        filename: record.key.filename.clone(),
                        count: 1,
                    },
                );
            }
        }
        Ok(())
    }
}

/// In-mapper combining with memory-aware spilling.
///
/// Occurrences accumulate in an owned `WordFileKey -> count` table. Every
/// `spill_check_interval` records the injected probe is sampled in-line with
/// record processing; above `memory_threshold` the whole table is flushed
/// through the sink and processing continues with a fresh table. The reducer
/// re-merges entries split across flushes, so the spill count never affects
/// the final totals.
pub struct CombinerMapper {
    policy: TokenPolicy,
    memory_threshold: f64,
    spill_check_interval: u64,
    probe: Box<dyn MemoryProbe + Send>,
    counts: HashMap<WordFileKey, u64>,
    processed_records: u64,
    spills: u64,
}

impl CombinerMapper {
    pub fn new(
        policy: TokenPolicy,
        memory_threshold: f64,
        spill_check_interval: u64,
        probe: Box<dyn MemoryProbe + Send>,
    ) -> Self {
        Self {
            policy,
            memory_threshold,
            spill_check_interval,
            probe,
            counts: HashMap::new(),
            processed_records: 0,
            spills: 0,
        }
    }

    pub fn spills(&self) -> u64 {
        self.spills
    }

    fn run(
        &mut self,
        records: impl Iterator<Item = Result<TextRecord, EngineError>>,
        sink: &mut dyn MapSink,
    ) -> Result<(), EngineError> {
        for record in records {
            let record = record?;
            for word in tokenize(&record.line, self.policy) {
                *self
                    .counts
                    .entry(WordFileKey {
                        word,
                        filename: record.key.filename.clone(),
                    })
                    .or_insert(0) += 1;
            }
            self.processed_records += 1;
            if self.processed_records % self.spill_check_interval == 0 {
                self.maybe_spill(sink);
            }
        }
        self.flush(sink);
        Ok(())
    }

    fn maybe_spill(&mut self, sink: &mut dyn MapSink) {
        match self.probe.usage_ratio() {
            Ok(ratio) if ratio > self.memory_threshold => {
                tracing::debug!(
                    ratio,
                    threshold = self.memory_threshold,
                    entries = self.counts.len(),
                    "memory pressure above threshold, spilling combine table"
                );
                self.flush(sink);
                self.spills += 1;
            }
            Ok(_) => {}
            Err(e) => {
                // Sampling failure is recoverable: skip this check entirely
                tracing::warn!(error = ?e, "failed to sample memory usage, skipping spill check");
            }
        }
    }

    fn flush(&mut self, sink: &mut dyn MapSink) {
        for (key, count) in self.counts.drain() {
            sink.emit(
                key.word,
                PartialCount {
                    filename: key.filename,
                    count,
                },
            );
        }
    }
}

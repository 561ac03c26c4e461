//! src/pipeline.rs
use crate::combiner::combine_map_output;
use crate::configuration::{EngineSettings, Settings};
use crate::error::EngineError;
use crate::mapper::{CombinerMapper, Mapper, PartialCount, SimpleMapper};
use crate::memory::{MemoryProbe, SystemMemoryProbe};
use crate::reducer::{reduce_group, write_partition, WordIndexEntry};
use crate::shuffle::{group_by_word, PartitionedBuffer};
use crate::split_reader::{discover_input_files, plan_splits, InputSplit, SplitReader};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Builds a fresh probe for each mapper task; swapped out in tests to fake
/// memory pressure deterministically.
pub type ProbeFactory = Arc<dyn Fn() -> Box<dyn MemoryProbe + Send> + Send + Sync>;

#[derive(Debug)]
pub struct IndexReport {
    pub job_id: Uuid,
    pub split_count: usize,
    pub partition_files: Vec<PathBuf>,
}

/// Wires split reading, mapping, shuffle and reduction into one job.
///
/// One blocking task per split owns its mapper, probe and shuffle buffer;
/// one blocking task per partition owns its reduce state and output file.
/// Awaiting every map task before constructing reducer inputs is the
/// shuffle barrier: reducers never observe a partial map output. Any task
/// failure aborts the job and no output is published as valid.
pub struct Pipeline {
    settings: Settings,
    probe_factory: ProbeFactory,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        settings.engine.validate()?;
        Ok(Self {
            settings,
            probe_factory: Arc::new(|| {
                Box::new(SystemMemoryProbe::new()) as Box<dyn MemoryProbe + Send>
            }),
        })
    }

    pub fn with_probe_factory(mut self, probe_factory: ProbeFactory) -> Self {
        self.probe_factory = probe_factory;
        self
    }

    #[tracing::instrument(name = "Build inverted index", skip_all, fields(job_id = tracing::field::Empty))]
    pub async fn run(&self) -> Result<IndexReport, EngineError> {
        let job_id = Uuid::new_v4();
        tracing::Span::current().record("job_id", tracing::field::display(&job_id));

        let files = discover_input_files(&self.settings.job.input_path)?;
        let splits = plan_splits(&files, self.settings.engine.max_split_size_bytes)?;
        tracing::info!(
            files = files.len(),
            splits = splits.len(),
            "planned input splits"
        );

        let reducer_count = self.settings.engine.reducer_count;
        let mut map_handles: Vec<JoinHandle<Result<_, EngineError>>> = Vec::new();
        for split in splits {
            let engine = self.settings.engine.clone();
            let probe_factory = Arc::clone(&self.probe_factory);
            map_handles.push(tokio::task::spawn_blocking(move || {
                run_map_task(split, &engine, &probe_factory)
            }));
        }
        let split_count = map_handles.len();

        // Shuffle barrier: every mapper must finish before any reducer starts
        let mut partitions: Vec<Vec<(String, PartialCount)>> = vec![Vec::new(); reducer_count];
        for handle in map_handles {
            let buckets = handle.await.context("Map task panicked")??;
            for (partition, bucket) in partitions.iter_mut().zip(buckets) {
                partition.extend(bucket);
            }
        }

        let output_path = self.settings.job.output_path.clone();
        std::fs::create_dir_all(&output_path).map_err(|source| EngineError::OutputIo {
            path: output_path.clone(),
            source,
        })?;

        let mut reduce_handles: Vec<JoinHandle<Result<PathBuf, EngineError>>> = Vec::new();
        for (partition, pairs) in partitions.into_iter().enumerate() {
            let path = output_path.join(format!("part-r-{partition:05}"));
            reduce_handles.push(tokio::task::spawn_blocking(move || {
                run_reduce_task(partition, pairs, &path)
            }));
        }

        let mut partition_files = Vec::with_capacity(reducer_count);
        for handle in reduce_handles {
            partition_files.push(handle.await.context("Reduce task panicked")??);
        }

        // Output is only valid once the marker exists
        let marker = output_path.join("_SUCCESS");
        std::fs::write(&marker, b"").map_err(|source| EngineError::OutputIo {
            path: marker,
            source,
        })?;

        tracing::info!(partitions = partition_files.len(), "index build complete");
        Ok(IndexReport {
            job_id,
            split_count,
            partition_files,
        })
    }
}

fn build_mapper(engine: &EngineSettings, probe_factory: &ProbeFactory) -> Mapper {
    if engine.mapper_variant.combines_in_mapper() {
        Mapper::Combining(CombinerMapper::new(
            engine.token_policy,
            engine.memory_threshold,
            engine.spill_check_interval,
            probe_factory(),
        ))
    } else {
        Mapper::Simple(SimpleMapper::new(engine.token_policy))
    }
}

#[tracing::instrument(name = "Map task", skip_all, fields(split_id = %split.id(), split_bytes = split.total_size()))]
fn run_map_task(
    split: InputSplit,
    engine: &EngineSettings,
    probe_factory: &ProbeFactory,
) -> Result<Vec<Vec<(String, PartialCount)>>, EngineError> {
    let mut mapper = build_mapper(engine, probe_factory);
    let mut buffer = PartitionedBuffer::new(engine.reducer_count);
    mapper.run(SplitReader::new(split), &mut buffer)?;
    let buckets = buffer.into_buckets();
    if engine.mapper_variant.uses_external_combiner() {
        Ok(combine_map_output(buckets))
    } else {
        Ok(buckets)
    }
}

#[tracing::instrument(name = "Reduce task", skip_all, fields(partition))]
fn run_reduce_task(
    partition: usize,
    pairs: Vec<(String, PartialCount)>,
    path: &Path,
) -> Result<PathBuf, EngineError> {
    let entries: Vec<WordIndexEntry> = group_by_word(pairs)
        .into_iter()
        .map(|(word, counts)| reduce_group(word, counts))
        .collect();
    tracing::debug!(partition, words = entries.len(), "writing partition file");
    write_partition(&entries, path)?;
    Ok(path.to_path_buf())
}

//! tests/api/helpers.rs
use inverted_index::configuration::{EngineSettings, JobSettings, MapperVariant, Settings};
use inverted_index::pipeline::{IndexReport, Pipeline, ProbeFactory};
use inverted_index::telemetry::init_tracing;
use inverted_index::tokenizer::TokenPolicy;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static TRACING: LazyLock<()> = LazyLock::new(|| {
    // A second init in the same process is fine to ignore
    let _ = init_tracing();
});

pub struct TestJob {
    pub settings: Settings,
    // Owns the input/output directories for the test's lifetime
    _input_dir: tempfile::TempDir,
    _output_dir: tempfile::TempDir,
}

impl TestJob {
    pub fn new(corpus: &[(&str, &str)]) -> Self {
        LazyLock::force(&TRACING);
        let input_dir = tempfile::tempdir().expect("Failed to create input dir");
        let output_dir = tempfile::tempdir().expect("Failed to create output dir");
        for (name, contents) in corpus {
            std::fs::write(input_dir.path().join(name), contents)
                .expect("Failed to write corpus file");
        }
        let settings = Settings {
            job: JobSettings {
                input_path: input_dir.path().to_path_buf(),
                output_path: output_dir.path().join("out"),
            },
            engine: EngineSettings {
                mapper_variant: MapperVariant::InMapperCombine,
                reducer_count: 2,
                max_split_size_bytes: 1024 * 1024,
                memory_threshold: 0.8,
                spill_check_interval: 10_000,
                token_policy: TokenPolicy::TrimEdges,
            },
        };
        Self {
            settings,
            _input_dir: input_dir,
            _output_dir: output_dir,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.settings.job.output_path.clone()
    }

    pub async fn run(&self) -> Result<IndexReport, inverted_index::error::EngineError> {
        Pipeline::new(self.settings.clone())?.run().await
    }

    pub async fn run_with_probe(
        &self,
        probe_factory: ProbeFactory,
    ) -> Result<IndexReport, inverted_index::error::EngineError> {
        Pipeline::new(self.settings.clone())?
            .with_probe_factory(probe_factory)
            .run()
            .await
    }
}

/// Collects every index line across all partition files, sorted, so runs
/// with different partitionings compare equal.
pub fn read_index_lines(output_path: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in std::fs::read_dir(output_path).expect("Failed to read output dir") {
        let path = entry.expect("Failed to read output entry").path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if !name.starts_with("part-r-") {
            continue;
        }
        let contents = std::fs::read_to_string(&path).expect("Failed to read partition file");
        lines.extend(contents.lines().map(String::from));
    }
    lines.sort();
    lines
}

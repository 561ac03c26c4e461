//! tests/api/pipeline.rs
use crate::helpers::{read_index_lines, TestJob};
use claims::{assert_err, assert_ok};
use inverted_index::configuration::MapperVariant;
use inverted_index::error::EngineError;
use inverted_index::memory::{FixedMemoryProbe, MemoryProbe};
use inverted_index::pipeline::{Pipeline, ProbeFactory};
use std::sync::Arc;

const CORPUS: [(&str, &str); 2] = [
    ("file1.txt", "Cloud computing is cloud."),
    ("file2.txt", "Cloud!"),
];

#[tokio::test]
async fn the_index_should_report_per_file_occurrence_counts() {
    let job = TestJob::new(&CORPUS);

    let report = assert_ok!(job.run().await);

    assert_eq!(report.partition_files.len(), 2);
    let lines = read_index_lines(&job.output_path());
    assert!(lines.contains(&"cloud\tfile1.txt:2\tfile2.txt:1".to_string()));
    assert!(lines.contains(&"computing\tfile1.txt:1".to_string()));
    assert!(lines.contains(&"is\tfile1.txt:1".to_string()));
    assert_eq!(lines.len(), 3);
}

#[tokio::test]
async fn a_success_marker_should_only_exist_after_a_clean_run() {
    let job = TestJob::new(&CORPUS);

    assert_ok!(job.run().await);

    assert!(job.output_path().join("_SUCCESS").exists());
}

#[tokio::test]
async fn all_four_variants_should_produce_the_same_index() {
    let mut baseline = None;
    for variant in [
        MapperVariant::Simple,
        MapperVariant::SimpleWithCombiner,
        MapperVariant::InMapperCombine,
        MapperVariant::InMapperCombineWithCombiner,
    ] {
        let mut job = TestJob::new(&CORPUS);
        job.settings.engine.mapper_variant = variant;
        assert_ok!(job.run().await);
        let lines = read_index_lines(&job.output_path());
        match &baseline {
            None => baseline = Some(lines),
            Some(expected) => assert_eq!(&lines, expected, "variant {variant:?} diverged"),
        }
    }
}

#[tokio::test]
async fn one_reducer_and_many_reducers_should_index_the_same_words() {
    let mut single = TestJob::new(&CORPUS);
    single.settings.engine.reducer_count = 1;
    assert_ok!(single.run().await);

    let mut sharded = TestJob::new(&CORPUS);
    sharded.settings.engine.reducer_count = 5;
    assert_ok!(sharded.run().await);

    assert_eq!(
        read_index_lines(&single.output_path()),
        read_index_lines(&sharded.output_path())
    );
}

#[tokio::test]
async fn re_chunking_the_input_should_not_change_the_index() {
    let corpus = [
        ("file1.txt", "cloud computing\nis cloud\ncloud again\n"),
        ("file2.txt", "computing in the cloud\n"),
    ];

    let baseline = TestJob::new(&corpus);
    assert_ok!(baseline.run().await);
    let expected = read_index_lines(&baseline.output_path());

    // A budget small enough to split mid-file and across files
    let mut tiny = TestJob::new(&corpus);
    tiny.settings.engine.max_split_size_bytes = 10;
    assert_ok!(tiny.run().await);

    assert_eq!(read_index_lines(&tiny.output_path()), expected);
}

#[tokio::test]
async fn forced_spills_should_not_change_any_count() {
    let corpus = [("file1.txt", "cloud\ncloud\ncloud\ncloud\ncloud\n")];
    let mut job = TestJob::new(&corpus);
    job.settings.engine.memory_threshold = 0.5;
    job.settings.engine.spill_check_interval = 1;

    // Every sample reports pressure, so every record boundary spills
    let probe_factory: ProbeFactory =
        Arc::new(|| Box::new(FixedMemoryProbe(1.0)) as Box<dyn MemoryProbe + Send>);
    assert_ok!(job.run_with_probe(probe_factory).await);

    let lines = read_index_lines(&job.output_path());
    assert_eq!(lines, vec!["cloud\tfile1.txt:5".to_string()]);
}

#[tokio::test]
async fn an_invalid_reducer_count_should_fail_before_any_work() {
    let mut job = TestJob::new(&CORPUS);
    job.settings.engine.reducer_count = 0;
    // Point the job at a directory that does not exist: construction must
    // fail on configuration alone, before input is ever touched
    job.settings.job.input_path = "/nonexistent-input".into();

    let result = Pipeline::new(job.settings.clone());
    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[tokio::test]
async fn a_missing_input_directory_should_fail_the_job_without_a_marker() {
    let mut job = TestJob::new(&CORPUS);
    job.settings.job.input_path = "/nonexistent-input".into();

    let result = job.run().await;

    assert_err!(&result);
    assert!(matches!(result, Err(EngineError::SplitIo { .. })));
    assert!(!job.output_path().join("_SUCCESS").exists());
}

#[tokio::test]
async fn an_empty_corpus_should_produce_empty_partitions() {
    let job = TestJob::new(&[]);

    let report = assert_ok!(job.run().await);

    assert_eq!(report.split_count, 0);
    assert!(read_index_lines(&job.output_path()).is_empty());
    assert!(job.output_path().join("_SUCCESS").exists());
}

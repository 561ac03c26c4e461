//! src/main.rs
use anyhow::Context;
use inverted_index::configuration::get_configuration;
use inverted_index::pipeline::Pipeline;
use inverted_index::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let configuration = get_configuration().context("Failed to read configuration.")?;
    let pipeline = Pipeline::new(configuration)?;
    let report = pipeline.run().await?;
    tracing::info!(
        job_id = %report.job_id,
        splits = report.split_count,
        partitions = report.partition_files.len(),
        "job finished"
    );
    Ok(())
}

use std::path::Path;
use storyloom_core::pipeline::{IngestConfig, IngestPipeline};
use storyloom_core::StoryloomConfig;

use super::{embedder, open_store};

pub async fn run(dir: &Path, config: &StoryloomConfig, data_dir: &Path) -> anyhow::Result<()> {
    let embedder = embedder(config)?;
    let store = open_store(config, data_dir)?;

    println!("Ingesting {} ...", dir.display());

    let pipeline = IngestPipeline::new(IngestConfig::from(&config.chunking), &embedder, &store)?;
    let report = pipeline.run(dir).await?;

    println!("\nIngest complete!");
    println!("  Files processed:  {}", report.files_processed);
    println!("  Chunks stored:    {}", report.chunks_stored);
    println!("  Chunks unchanged: {}", report.chunks_unchanged);
    if report.stale_removed > 0 {
        println!("  Stale removed:    {}", report.stale_removed);
    }

    if !report.errors.is_empty() {
        println!(
            "\n⚠️  {} errors ({} files, {} chunks):",
            report.errors.len(),
            report.files_failed,
            report.chunks_failed
        );
        for error in report.errors.iter().take(10) {
            println!("  - {}", error);
        }
        if report.errors.len() > 10 {
            println!("  ... and {} more", report.errors.len() - 10);
        }
    }

    Ok(())
}

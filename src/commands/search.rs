use std::path::Path;
use storyloom_core::{Embedder, StoryloomConfig, VectorStorage};

use super::{embedder, open_store, truncate};

pub async fn run(
    query: &str,
    limit: usize,
    config: &StoryloomConfig,
    data_dir: &Path,
) -> anyhow::Result<()> {
    let store = open_store(config, data_dir)?;
    if store.count()? == 0 {
        println!("No chunks stored yet.");
        println!("\nTip: Run `storyloom ingest` to index your library first.");
        return Ok(());
    }

    println!("Searching for: {}\n", query);

    let embedder = embedder(config)?;
    let query_embedding = embedder.embed(query).await?;
    let hits = store.search(&query_embedding, limit)?;

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} results:\n", hits.len());

    for hit in hits {
        println!("📖 {} #{} (score: {:.3})", hit.file_path, hit.chunk_index, hit.score);
        println!("   {}", truncate(&hit.chunk_text, 120));
        println!("   ID: {}", hit.id);
        println!();
    }

    Ok(())
}

use std::path::Path;
use storyloom_core::{StoryloomConfig, VectorStorage};

use super::open_store;

pub fn run(config: &StoryloomConfig, data_dir: &Path) -> anyhow::Result<()> {
    let path = config.store.resolve(data_dir);
    if !path.exists() {
        println!("No vector store at {}", path.display());
        println!("\nTip: Run `storyloom ingest` to create one.");
        return Ok(());
    }

    let store = open_store(config, data_dir)?;
    let files = store.list_files()?;

    println!("📊 storyloom Statistics\n");
    println!("Store:      {}", store.path().display());
    println!("Dimension:  {}", store.dimension());
    println!("Chunks:     {}", store.count()?);
    println!("Files:      {}", files.len());

    if !files.is_empty() {
        println!();
        for file in files {
            println!("  {:>6}  {}", file.chunks, file.file_path);
        }
    }

    Ok(())
}

use std::path::Path;
use storyloom_core::embeddings::{normalize, ChunkBudget, ChunkerConfig};
use storyloom_core::{StoryloomConfig, TextChunker};

/// Overrides for the configured chunking settings
pub struct ChunkOptions {
    pub max_size: Option<usize>,
    pub overlap: Option<usize>,
    pub bytes: bool,
    pub raw: bool,
}

pub fn run(file: &Path, options: &ChunkOptions, config: &StoryloomConfig) -> anyhow::Result<()> {
    let chunking = &config.chunking;
    let chunker_config = ChunkerConfig {
        max_size: options.max_size.unwrap_or(chunking.max_size),
        overlap: options.overlap.unwrap_or(chunking.overlap),
        budget: if options.bytes {
            ChunkBudget::Bytes
        } else {
            chunking.budget
        },
    };
    let chunker = TextChunker::new(chunker_config)?;

    let raw = std::fs::read_to_string(file)?;
    let text = if options.raw {
        raw
    } else {
        normalize(&raw, chunking.strip_boilerplate)
    };

    let unit = match chunker_config.budget {
        ChunkBudget::Chars => "chars",
        ChunkBudget::Bytes => "bytes",
    };

    let mut count = 0;
    for (i, chunk) in chunker.chunks(&text).enumerate() {
        println!(
            "--- chunk {} ({} {}) ---",
            i,
            chunker_config.budget.measure(&chunk),
            unit
        );
        println!("{}", chunk);
        count += 1;
    }

    println!("\n{} chunks", count);
    Ok(())
}

use std::path::Path;
use storyloom_core::story::{StoryOptions, VectorRetriever};
use storyloom_core::{OllamaGenerator, StoryWorkflow, StoryloomConfig, VectorStorage};

use super::{embedder, ollama_client, open_store};

pub async fn run(
    prompt: &str,
    work_dir: &Path,
    chapters: Option<usize>,
    no_context: bool,
    config: &StoryloomConfig,
    data_dir: &Path,
) -> anyhow::Result<()> {
    let chapters = chapters.unwrap_or(config.story.chapters);
    if chapters == 0 {
        anyhow::bail!("--chapters must be greater than zero");
    }

    let generator = OllamaGenerator::new(
        ollama_client(config)?,
        config.ollama.generation_model.clone(),
        config.ollama.temperature,
    );
    let options = StoryOptions {
        chapters,
        context_passages: config.story.context_passages,
    };

    let use_context = !no_context
        && config.story.context_passages > 0
        && config.store.resolve(data_dir).exists();

    let embedder = embedder(config)?;
    let store = if use_context {
        Some(open_store(config, data_dir)?)
    } else {
        None
    };
    let store = match store {
        Some(store) if store.count()? > 0 => Some(store),
        _ => None,
    };
    let retriever = store
        .as_ref()
        .map(|store| VectorRetriever::new(&embedder, store));

    let mut workflow = StoryWorkflow::new(&generator, work_dir, options)?;
    if let Some(retriever) = &retriever {
        println!("Using passages from the ingested library as style references.");
        workflow = workflow.with_retriever(retriever);
    }

    println!("Writing a {}-chapter story in {} ...", chapters, work_dir.display());
    let outcome = workflow.run(prompt).await?;

    println!("\nStory complete!");
    println!("  Title:      {}", outcome.title);
    println!("  Chapters:   {}", outcome.chapters);
    if outcome.resumed > 0 {
        println!("  Resumed:    {} phases from checkpoints", outcome.resumed);
    }
    println!("  Manuscript: {}", outcome.manuscript.display());

    Ok(())
}

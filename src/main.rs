mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storyloom_core::StoryloomConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "storyloom")]
#[command(about = "Chunk, embed and search books, then write new ones", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML config file (defaults to <data-dir>/storyloom.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview how a file is chunked (offline)
    Chunk {
        /// File to chunk
        file: PathBuf,

        /// Maximum chunk size
        #[arg(long)]
        max_size: Option<usize>,

        /// Overlap carried into the next chunk
        #[arg(long)]
        overlap: Option<usize>,

        /// Measure sizes in UTF-8 bytes instead of characters
        #[arg(long)]
        bytes: bool,

        /// Skip normalization and boilerplate stripping
        #[arg(long)]
        raw: bool,
    },

    /// Chunk, embed and store every document in a directory
    Ingest {
        /// Source directory (defaults to <data-dir>/library)
        dir: Option<PathBuf>,
    },

    /// Semantic search over ingested chunks
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Download plain-text books from Project Gutenberg
    Download {
        /// Words in the title or author name
        #[arg(long)]
        search: Option<String>,

        /// Words in a subject or bookshelf
        #[arg(long)]
        topic: Option<String>,

        /// Language code (repeatable)
        #[arg(long = "language")]
        languages: Vec<String>,

        /// Maximum number of books
        #[arg(long)]
        max_books: Option<usize>,

        /// Output directory (defaults to <data-dir>/library)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate a story, resuming from checkpoints in the work directory
    Story {
        /// Story idea
        #[arg(long)]
        prompt: String,

        /// Directory for checkpoints and the manuscript
        #[arg(long)]
        work_dir: PathBuf,

        /// Number of chapters
        #[arg(long)]
        chapters: Option<usize>,

        /// Do not add retrieved passages to chapter prompts
        #[arg(long)]
        no_context: bool,
    },

    /// Manage Ollama models
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Show vector store statistics
    Stats,
}

#[derive(Subcommand)]
enum ModelsAction {
    /// List installed models
    List,
    /// Download a model
    Pull { name: String },
    /// Delete a model
    Delete { name: String },
    /// Show the Ollama server version
    Version,
}

fn get_data_dir(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path.unwrap_or_else(StoryloomConfig::default_data_dir)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = get_data_dir(cli.data_dir);
    tracing::debug!(data_dir = %data_dir.display(), "Using data directory");
    let config = StoryloomConfig::load(&data_dir, cli.config.as_deref())?;

    match cli.command {
        Commands::Chunk {
            file,
            max_size,
            overlap,
            bytes,
            raw,
        } => {
            let options = commands::chunk::ChunkOptions {
                max_size,
                overlap,
                bytes,
                raw,
            };
            commands::chunk::run(&file, &options, &config)?;
        }
        Commands::Ingest { dir } => {
            std::fs::create_dir_all(&data_dir)?;
            let dir = dir.unwrap_or_else(|| commands::library_dir(&data_dir));
            commands::ingest::run(&dir, &config, &data_dir).await?;
        }
        Commands::Search { query, limit } => {
            commands::search::run(&query, limit, &config, &data_dir).await?;
        }
        Commands::Download {
            search,
            topic,
            languages,
            max_books,
            out,
        } => {
            let out = out.unwrap_or_else(|| commands::library_dir(&data_dir));
            let query = commands::download::build_query(
                search,
                topic,
                languages,
                max_books,
                &config.catalog,
            );
            commands::download::run(&query, &out, &config).await?;
        }
        Commands::Story {
            prompt,
            work_dir,
            chapters,
            no_context,
        } => {
            commands::story::run(&prompt, &work_dir, chapters, no_context, &config, &data_dir)
                .await?;
        }
        Commands::Models { action } => match action {
            ModelsAction::List => commands::models::list(&config).await?,
            ModelsAction::Pull { name } => commands::models::pull(&name, &config).await?,
            ModelsAction::Delete { name } => commands::models::delete(&name, &config).await?,
            ModelsAction::Version => commands::models::version(&config).await?,
        },
        Commands::Stats => {
            commands::stats::run(&config, &data_dir)?;
        }
    }

    Ok(())
}

use std::path::Path;
use std::time::Duration;
use storyloom_core::config::CatalogConfig;
use storyloom_core::{CatalogQuery, GutendexClient, StoryloomConfig};

/// Merge command-line filters with the configured catalog defaults
pub fn build_query(
    search: Option<String>,
    topic: Option<String>,
    languages: Vec<String>,
    max_books: Option<usize>,
    catalog: &CatalogConfig,
) -> CatalogQuery {
    CatalogQuery {
        search,
        topic,
        languages: if languages.is_empty() {
            catalog.languages.clone()
        } else {
            languages
        },
        max_books: max_books.unwrap_or(catalog.max_books),
    }
}

pub async fn run(query: &CatalogQuery, out: &Path, config: &StoryloomConfig) -> anyhow::Result<()> {
    let client = GutendexClient::new(
        config.catalog.base_url.clone(),
        Duration::from_secs(config.catalog.timeout_secs),
    )?;

    println!("Searching Project Gutenberg...");
    let books = client.search(query).await?;

    if books.is_empty() {
        println!("No books matched.");
        return Ok(());
    }

    println!("Found {} books, downloading to {}\n", books.len(), out.display());
    for book in &books {
        let authors = book.author_names();
        if authors.is_empty() {
            println!("  {:>6}  {}", book.id, book.title);
        } else {
            println!("  {:>6}  {} ({})", book.id, book.title, authors);
        }
    }

    let report = client.download_all(&books, out).await?;

    println!("\nDownload complete!");
    println!("  Downloaded:       {}", report.downloaded.len());
    println!("  Already present:  {}", report.skipped_existing);
    if report.skipped_no_text > 0 {
        println!("  No plain text:    {}", report.skipped_no_text);
    }
    if !report.errors.is_empty() {
        println!("\n⚠️  {} downloads failed:", report.failed);
        for error in &report.errors {
            println!("  - {}", error);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_uses_config_defaults() {
        let catalog = CatalogConfig::default();
        let query = build_query(Some("austen".into()), None, vec![], None, &catalog);

        assert_eq!(query.search.as_deref(), Some("austen"));
        assert_eq!(query.languages, catalog.languages);
        assert_eq!(query.max_books, catalog.max_books);
    }

    #[test]
    fn test_build_query_overrides() {
        let catalog = CatalogConfig::default();
        let query = build_query(
            None,
            Some("sea stories".into()),
            vec!["fr".into()],
            Some(3),
            &catalog,
        );

        assert_eq!(query.topic.as_deref(), Some("sea stories"));
        assert_eq!(query.languages, vec!["fr".to_string()]);
        assert_eq!(query.max_books, 3);
    }
}

//! Project Gutenberg catalog via the Gutendex API
//!
//! Searches the catalog and downloads plain-text editions into a local
//! library directory for ingestion.
//!
//! API Documentation: https://gutendex.com

pub mod types;

use crate::http::{build_client, error_for_status, join_url, truncate};
use reqwest::{header, Client};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use types::{Book, BooksPage, Person};

pub const DEFAULT_BASE_URL: &str = "https://gutendex.com";

const MAX_SLUG_LEN: usize = 50;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Catalog search filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogQuery {
    /// Words in the title or author name
    pub search: Option<String>,
    /// Words in a subject or bookshelf
    pub topic: Option<String>,
    /// Two-letter language codes
    pub languages: Vec<String>,
    /// Stop after this many books (0 = no limit)
    pub max_books: usize,
}

impl CatalogQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("mime_type", "text/plain".to_string())];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(topic) = &self.topic {
            params.push(("topic", topic.clone()));
        }
        if !self.languages.is_empty() {
            params.push(("languages", self.languages.join(",")));
        }
        params
    }
}

/// Result of a download batch
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DownloadReport {
    pub downloaded: Vec<PathBuf>,
    pub skipped_existing: usize,
    pub skipped_no_text: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Gutendex client
#[derive(Debug, Clone)]
pub struct GutendexClient {
    client: Client,
    base_url: String,
}

impl GutendexClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    /// Fetch matching books, following `next` links until exhausted or
    /// `max_books` is reached
    pub async fn search(&self, query: &CatalogQuery) -> Result<Vec<Book>> {
        let mut books = Vec::new();

        let first = self
            .client
            .get(join_url(&self.base_url, "/books"))
            .query(&query.params());
        let mut page = self.fetch_page(first).await?;
        info!(total = page.count, "Catalog search");

        loop {
            for book in page.results {
                if query.max_books > 0 && books.len() >= query.max_books {
                    return Ok(books);
                }
                books.push(book);
            }

            if query.max_books > 0 && books.len() >= query.max_books {
                break;
            }

            match page.next {
                Some(next) => {
                    debug!(url = %next, "Fetching next catalog page");
                    page = self.fetch_page(self.client.get(&next)).await?;
                }
                None => break,
            }
        }

        Ok(books)
    }

    async fn fetch_page(&self, request: reqwest::RequestBuilder) -> Result<BooksPage> {
        let response = request.send().await?;
        let response = error_for_status(response)
            .await
            .map_err(|(status, body)| CatalogError::Api { status, body })?;

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| CatalogError::Parse(format!("{}: {}", e, truncate(&text, 200))))
    }

    /// Download the plain-text edition of a single book
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/plain, */*")
            .send()
            .await?;
        let response = error_for_status(response)
            .await
            .map_err(|(status, body)| CatalogError::Api { status, body })?;
        Ok(response.text().await?)
    }

    /// Download every book with a plain-text edition into `out_dir`
    ///
    /// Files that already exist are left alone; failed downloads are logged
    /// and reported but do not stop the batch.
    pub async fn download_all(&self, books: &[Book], out_dir: &Path) -> Result<DownloadReport> {
        std::fs::create_dir_all(out_dir)?;
        let mut report = DownloadReport::default();

        for book in books {
            let Some(url) = plain_text_url(book) else {
                warn!(id = book.id, title = %book.title, "No plain-text edition");
                report.skipped_no_text += 1;
                continue;
            };

            let path = out_dir.join(book_file_name(book));
            if path.exists() {
                debug!(path = %path.display(), "Already downloaded");
                report.skipped_existing += 1;
                continue;
            }

            match self.fetch_text(url).await {
                Ok(text) => {
                    std::fs::write(&path, text)?;
                    info!(id = book.id, path = %path.display(), "Downloaded");
                    report.downloaded.push(path);
                }
                Err(e) => {
                    warn!(id = book.id, error = %e, "Download failed");
                    report.failed += 1;
                    report.errors.push(format!("{} ({}): {}", book.title, book.id, e));
                }
            }
        }

        Ok(report)
    }
}

/// Pick a plain-text download URL, preferring UTF-8 and skipping zip archives
pub fn plain_text_url(book: &Book) -> Option<&str> {
    let candidates: Vec<(&String, &String)> = book
        .formats
        .iter()
        .filter(|(mime, url)| mime.starts_with("text/plain") && !url.ends_with(".zip"))
        .collect();

    candidates
        .iter()
        .find(|(mime, _)| mime.to_ascii_lowercase().contains("utf-8"))
        .or_else(|| candidates.first())
        .copied()
        .map(|(_, url)| url.as_str())
}

/// `<id>_<slug>.txt`
pub fn book_file_name(book: &Book) -> String {
    format!("{}_{}.txt", book.id, slugify(&book.title))
}

/// Lowercase ASCII alphanumerics joined by single underscores
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn book(id: u64, title: &str, formats: &[(&str, &str)]) -> Book {
        Book {
            id,
            title: title.to_string(),
            authors: vec![],
            languages: vec!["en".to_string()],
            subjects: vec![],
            formats: formats
                .iter()
                .map(|(m, u)| (m.to_string(), u.to_string()))
                .collect::<BTreeMap<_, _>>(),
            download_count: 0,
        }
    }

    fn book_json(id: u64, title: &str, text_url: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "authors": [{ "name": "Doe, Jane", "birth_year": 1800, "death_year": 1870 }],
            "languages": ["en"],
            "subjects": ["Fiction"],
            "formats": { "text/plain; charset=utf-8": text_url },
            "download_count": 10
        })
    }

    fn client(server: &MockServer) -> GutendexClient {
        GutendexClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Pride and Prejudice"), "pride_and_prejudice");
        assert_eq!(slugify("  Alice's Adventures!  "), "alice_s_adventures");
        assert_eq!(slugify("日本"), "untitled");
        assert!(slugify(&"word ".repeat(40)).len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn test_book_file_name() {
        let b = book(1342, "Pride and Prejudice", &[]);
        assert_eq!(book_file_name(&b), "1342_pride_and_prejudice.txt");
    }

    #[test]
    fn test_plain_text_url_prefers_utf8() {
        let b = book(
            1,
            "T",
            &[
                ("application/epub+zip", "http://x/1.epub"),
                ("text/plain; charset=us-ascii", "http://x/1-0.txt"),
                ("text/plain; charset=utf-8", "http://x/1-8.txt"),
            ],
        );
        assert_eq!(plain_text_url(&b), Some("http://x/1-8.txt"));
    }

    #[test]
    fn test_plain_text_url_skips_zip() {
        let b = book(
            1,
            "T",
            &[
                ("text/plain; charset=utf-8", "http://x/1-8.zip"),
                ("text/plain", "http://x/1.txt"),
            ],
        );
        assert_eq!(plain_text_url(&b), Some("http://x/1.txt"));

        let none = book(2, "T", &[("text/html", "http://x/2.html")]);
        assert_eq!(plain_text_url(&none), None);
    }

    #[tokio::test]
    async fn test_search_follows_next_links() {
        let server = MockServer::start().await;
        let next = format!("{}/books?page=2", server.uri());

        Mock::given(method("GET"))
            .and(path("/books"))
            .and(query_param("search", "dickens"))
            .and(query_param("languages", "en,fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": next,
                "previous": null,
                "results": [book_json(1, "One", "http://x/1"), book_json(2, "Two", "http://x/2")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": null,
                "results": [book_json(3, "Three", "http://x/3")]
            })))
            .mount(&server)
            .await;

        let query = CatalogQuery {
            search: Some("dickens".to_string()),
            languages: vec!["en".to_string(), "fr".to_string()],
            ..Default::default()
        };
        let books = client(&server).search(&query).await.unwrap();

        let ids: Vec<u64> = books.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(books[0].author_names(), "Doe, Jane");
    }

    #[tokio::test]
    async fn test_search_stops_at_max_books() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 100,
                "next": format!("{}/books?page=2", server.uri()),
                "results": [book_json(1, "One", "http://x/1"), book_json(2, "Two", "http://x/2")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = CatalogQuery {
            max_books: 2,
            ..Default::default()
        };
        let books = client(&server).search(&query).await.unwrap();
        assert_eq!(books.len(), 2);
    }

    #[tokio::test]
    async fn test_search_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server)
            .search(&CatalogQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_download_all() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/1.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Book one text."))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/2.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let out = dir.path().join("library");
        let existing = book(
            3,
            "Already Here",
            &[("text/plain", "http://unused.invalid/3.txt")],
        );
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join(book_file_name(&existing)), "old").unwrap();

        let url1 = format!("{}/files/1.txt", server.uri());
        let url2 = format!("{}/files/2.txt", server.uri());
        let books = vec![
            book(1, "First Book", &[("text/plain", url1.as_str())]),
            book(2, "Missing", &[("text/plain", url2.as_str())]),
            existing,
            book(4, "Only Html", &[("text/html", "http://x/4.html")]),
        ];

        let report = client(&server).download_all(&books, &out).await.unwrap();

        assert_eq!(report.downloaded, vec![out.join("1_first_book.txt")]);
        assert_eq!(
            std::fs::read_to_string(out.join("1_first_book.txt")).unwrap(),
            "Book one text."
        );
        assert_eq!(report.failed, 1);
        assert!(report.errors[0].contains("Missing"));
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.skipped_no_text, 1);
        assert_eq!(
            std::fs::read_to_string(out.join("3_already_here.txt")).unwrap(),
            "old"
        );
    }
}

//! Shared HTTP helpers for the Ollama and Gutendex clients

use reqwest::{header, Client, Response};
use std::time::Duration;

/// Build a JSON client with a request timeout
pub(crate) fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    Client::builder()
        .default_headers(headers)
        .user_agent(concat!("storyloom/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

/// Split a response into success, or `(status, truncated body)` on failure
pub(crate) async fn error_for_status(response: Response) -> Result<Response, (u16, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err((status.as_u16(), truncate(&text, 500)))
}

/// Truncate to at most `max_len` bytes on a char boundary
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Join a base URL and an endpoint path without doubling slashes
pub(crate) fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

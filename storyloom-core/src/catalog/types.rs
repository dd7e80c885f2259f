//! Gutendex API response types

use serde::Deserialize;
use std::collections::BTreeMap;

/// One page of `/books` results
#[derive(Debug, Clone, Deserialize)]
pub struct BooksPage {
    #[serde(default)]
    pub count: usize,
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<Book>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Book {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Person>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    /// MIME type → download URL
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
    #[serde(default)]
    pub download_count: u64,
}

impl Book {
    /// Author names joined for display
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
}

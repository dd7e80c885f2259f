//! Lenient NDJSON parsing for model output

use serde::de::DeserializeOwned;
use tracing::warn;

/// Parse one JSON value per line.
///
/// Blank lines and markdown code fences are ignored. Lines that fail to
/// deserialize are logged and skipped.
pub fn parse_ndjson<T: DeserializeOwned>(text: &str) -> Vec<T> {
    text.lines()
        .map(|line| line.trim().trim_end_matches(','))
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, line = %crate::http::truncate(line, 120), "Skipping malformed NDJSON line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
        rank: u32,
    }

    #[test]
    fn test_parses_each_line() {
        let items: Vec<Item> = parse_ndjson(
            "{\"name\": \"a\", \"rank\": 1}\n{\"name\": \"b\", \"rank\": 2}\n",
        );
        assert_eq!(
            items,
            vec![
                Item { name: "a".into(), rank: 1 },
                Item { name: "b".into(), rank: 2 }
            ]
        );
    }

    #[test]
    fn test_skips_fences_blank_and_malformed_lines() {
        let text = "Here you go:\n```json\n{\"name\": \"a\", \"rank\": 1}\n\n   \n{\"name\": \"b\"}\n{\"name\": \"c\", \"rank\": 3},\n```\n";
        let items: Vec<Item> = parse_ndjson(text);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_ndjson::<Item>("").is_empty());
        assert!(parse_ndjson::<Item>("```\n```").is_empty());
    }
}

//! Text normalization ahead of chunking
//!
//! Removes Project Gutenberg header/footer boilerplate and canonicalizes
//! whitespace while keeping paragraph breaks intact.

use regex::Regex;
use std::sync::LazyLock;

static START_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*{3,}\s*START OF[^*]*\*{3,}").expect("start marker pattern")
});

static END_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*{3,}\s*END OF[^*]*\*{3,}").expect("end marker pattern")
});

static LICENSE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Project Gutenberg[^\n]*License|End of (?:the )?Project Gutenberg")
        .expect("license marker pattern")
});

/// A whitespace run spanning at least one blank line
static PARAGRAPH_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n[^\S\n]*\n\s*").expect("paragraph break pattern"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace run pattern"));

/// Normalize raw document text.
///
/// With `strip_boilerplate`, only the text between the `*** START OF … ***`
/// and `*** END OF … ***` markers is kept (when both are present), and
/// anything from the first trailing license marker onwards is dropped.
/// Line endings become `\n` and tabs become spaces. Runs of blank lines
/// collapse to a single blank line, and any other whitespace run of two or
/// more characters collapses to one space.
pub fn normalize(raw: &str, strip_boilerplate: bool) -> String {
    let body = if strip_boilerplate {
        strip_gutenberg_boilerplate(raw)
    } else {
        raw
    };

    let text = body.replace("\r\n", "\n").replace('\r', "\n").replace('\t', " ");
    let text = PARAGRAPH_BREAKS.replace_all(&text, "\n\n");
    let text = WHITESPACE_RUNS.replace_all(&text, |caps: &regex::Captures| {
        if &caps[0] == "\n\n" {
            "\n\n"
        } else {
            " "
        }
    });

    text.trim().to_string()
}

/// Slice out the body between the Gutenberg start/end markers and cut the
/// trailing license section.
fn strip_gutenberg_boilerplate(raw: &str) -> &str {
    let mut body = raw;

    if let Some(start) = START_MARKER.find(raw) {
        let rest = &raw[start.end()..];
        if let Some(end) = END_MARKER.find(rest) {
            body = &rest[..end.start()];
        }
    }

    match LICENSE_MARKER.find(body) {
        Some(license) => &body[..license.start()],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = "The Project Gutenberg eBook of Tiny Tales\r\n\
        \r\n\
        *** START OF THE PROJECT GUTENBERG EBOOK TINY TALES ***\r\n\
        \r\n\
        Once upon a time.\r\n\
        \r\n\
        \r\n\
        \r\n\
        The end.\r\n\
        *** END OF THE PROJECT GUTENBERG EBOOK TINY TALES ***\r\n\
        Full Project Gutenberg License text follows.";

    #[test]
    fn test_strips_header_and_footer() {
        let text = normalize(BOOK, true);
        assert_eq!(text, "Once upon a time.\n\nThe end.");
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let raw = "junk\n***start of this ebook***\nBody text.\n*****end of this ebook*****\njunk";
        assert_eq!(normalize(raw, true), "Body text.");
    }

    #[test]
    fn test_end_marker_before_start_is_ignored() {
        let raw = "*** END OF NOTHING ***\nPreface.\n*** START OF IT ***\nBody.";
        let text = normalize(raw, true);
        assert!(text.contains("Preface."));
        assert!(text.contains("Body."));
    }

    #[test]
    fn test_license_marker_truncates() {
        let raw = "Chapter one.\n\nEnd of the Project Gutenberg EBook of Tiny Tales\n\nlegal text";
        assert_eq!(normalize(raw, true), "Chapter one.");
    }

    #[test]
    fn test_without_markers_passes_through() {
        let raw = "Plain text with no markers.";
        assert_eq!(normalize(raw, true), raw);
    }

    #[test]
    fn test_no_stripping_keeps_boilerplate() {
        let text = normalize(BOOK, false);
        assert!(text.starts_with("The Project Gutenberg eBook"));
        assert!(text.contains("License"));
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let raw = "  A\t\tline   with    gaps  \n  next line\r\n\r\n\r\n\r\nNew paragraph.  ";
        assert_eq!(
            normalize(raw, false),
            "A line with gaps next line\n\nNew paragraph."
        );
    }

    #[test]
    fn test_padded_line_break_becomes_space() {
        assert_eq!(
            normalize("wrapped line  \n  continues here", false),
            "wrapped line continues here"
        );
        assert_eq!(normalize("hard\nwrap", false), "hard\nwrap");
    }

    #[test]
    fn test_blank_lines_with_spaces_become_one_break() {
        let raw = "First.\n   \n \t \n\nSecond.";
        assert_eq!(normalize(raw, false), "First.\n\nSecond.");
    }

    #[test]
    fn test_empty_and_boilerplate_only_inputs() {
        assert_eq!(normalize("", true), "");
        assert_eq!(normalize(" \n\t\r\n ", false), "");
        assert_eq!(normalize("*** START OF X ***\n\n*** END OF X ***", true), "");
    }
}

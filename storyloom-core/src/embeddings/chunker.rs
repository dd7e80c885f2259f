//! Document chunking for embedding generation
//!
//! Splits normalized text into bounded, overlapping chunks. Paragraphs are
//! packed together until the size budget is reached; paragraphs that are too
//! large on their own fall back to sentences, and sentences that are still
//! too large are hard-split at the budget boundary.

use super::hash::content_hash;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::LazyLock;
use thiserror::Error;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SEPARATOR_LEN: usize = PARAGRAPH_SEPARATOR.len();

/// One or more blank lines
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[^\S\n]*\n\s*").expect("paragraph break pattern"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence end pattern"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkerError {
    #[error("max_size must be greater than zero")]
    ZeroMaxSize,

    #[error("overlap ({overlap}) must be smaller than max_size ({max_size})")]
    OverlapTooLarge { overlap: usize, max_size: usize },
}

/// Unit in which chunk sizes are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkBudget {
    /// Unicode scalar values
    #[default]
    Chars,
    /// UTF-8 encoded bytes
    Bytes,
}

impl ChunkBudget {
    /// Size of `text` in this unit
    pub fn measure(self, text: &str) -> usize {
        match self {
            ChunkBudget::Chars => text.chars().count(),
            ChunkBudget::Bytes => text.len(),
        }
    }

    /// Byte offset ending the longest prefix of `text` that fits in `units`.
    ///
    /// Always covers at least one character of non-empty text, so a code
    /// point wider than a byte budget is taken whole instead of stalling.
    fn prefix_end(self, text: &str, units: usize) -> usize {
        let end = match self {
            ChunkBudget::Chars => text
                .char_indices()
                .nth(units)
                .map(|(i, _)| i)
                .unwrap_or(text.len()),
            ChunkBudget::Bytes => floor_char_boundary(text, units),
        };

        if end == 0 {
            text.chars().next().map(char::len_utf8).unwrap_or(0)
        } else {
            end
        }
    }

    /// Byte offset starting the longest suffix of `text` that fits in `units`
    fn suffix_start(self, text: &str, units: usize) -> usize {
        if units == 0 {
            return text.len();
        }
        match self {
            ChunkBudget::Chars => text
                .char_indices()
                .rev()
                .nth(units - 1)
                .map(|(i, _)| i)
                .unwrap_or(0),
            ChunkBudget::Bytes => ceil_char_boundary(text, text.len().saturating_sub(units)),
        }
    }
}

/// True for UTF-8 continuation bytes (`10xxxxxx`)
fn is_continuation_byte(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Nearest code point boundary at or before the given byte index
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut i = index;
    while i > 0 && is_continuation_byte(bytes[i]) {
        i -= 1;
    }
    i
}

/// Nearest code point boundary at or after the given byte index
fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut i = index;
    while i < s.len() && is_continuation_byte(bytes[i]) {
        i += 1;
    }
    i
}

/// Configuration for the text chunker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum chunk size, in `budget` units
    pub max_size: usize,
    /// Units of trailing context carried into the next chunk
    pub overlap: usize,
    pub budget: ChunkBudget,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            // ~256 tokens * 4 chars/token = 1024 chars
            max_size: 1024,
            // ~32 tokens * 4 chars/token = 128 chars
            overlap: 128,
            budget: ChunkBudget::Chars,
        }
    }
}

impl ChunkerConfig {
    pub fn chars(max_size: usize, overlap: usize) -> Self {
        Self {
            max_size,
            overlap,
            budget: ChunkBudget::Chars,
        }
    }

    pub fn bytes(max_size: usize, overlap: usize) -> Self {
        Self {
            max_size,
            overlap,
            budget: ChunkBudget::Bytes,
        }
    }

    pub fn validate(&self) -> Result<(), ChunkerError> {
        if self.max_size == 0 {
            return Err(ChunkerError::ZeroMaxSize);
        }
        if self.overlap >= self.max_size {
            return Err(ChunkerError::OverlapTooLarge {
                overlap: self.overlap,
                max_size: self.max_size,
            });
        }
        Ok(())
    }
}

/// A chunk of a source document, ready to be embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Name of the source document (file name)
    pub source_name: String,
    /// Position of this chunk within the document (0-based, gapless)
    pub index: usize,
    pub text: String,
    /// Hex digest of `text`
    pub content_hash: String,
}

/// Splits documents into bounded, overlapping chunks
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkerConfig,
}

impl TextChunker {
    /// Create a chunker, rejecting a zero budget or an overlap that does not
    /// leave room for new content
    pub fn new(config: ChunkerConfig) -> Result<Self, ChunkerError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Lazily chunk `text`, yielding chunks in document order
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            paragraphs: PARAGRAPH_BREAK.split(text),
            config: self.config,
            buffer: String::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    /// Chunk `text` into an owned list
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        self.chunks(text).collect()
    }

    /// Chunk a document into indexed, hashed records
    pub fn chunk_document<'a>(
        &self,
        source_name: &'a str,
        text: &'a str,
    ) -> impl Iterator<Item = ChunkRecord> + 'a {
        self.chunks(text)
            .enumerate()
            .map(move |(index, text)| ChunkRecord {
                source_name: source_name.to_string(),
                index,
                content_hash: content_hash(&text),
                text,
            })
    }
}

/// Lazy, single-pass chunk sequence produced by [`TextChunker::chunks`]
pub struct Chunks<'a> {
    paragraphs: regex::Split<'static, 'a>,
    config: ChunkerConfig,
    buffer: String,
    ready: VecDeque<String>,
    finished: bool,
}

impl Iterator for Chunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(chunk) = self.ready.pop_front() {
                return Some(chunk);
            }
            if self.finished {
                return None;
            }

            match self.paragraphs.next() {
                Some(paragraph) => {
                    let paragraph = paragraph.trim();
                    if !paragraph.is_empty() {
                        self.push_paragraph(paragraph);
                    }
                }
                None => {
                    self.finished = true;
                    self.flush();
                }
            }
        }
    }
}

impl Chunks<'_> {
    fn size(&self, text: &str) -> usize {
        self.config.budget.measure(text)
    }

    fn emit(&mut self, chunk: String) {
        if !chunk.trim().is_empty() {
            self.ready.push_back(chunk);
        }
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            let chunk = std::mem::take(&mut self.buffer);
            self.emit(chunk);
        }
    }

    fn push_paragraph(&mut self, paragraph: &str) {
        if self.size(paragraph) > self.config.max_size {
            self.push_oversized(paragraph);
        } else {
            self.push_unit(paragraph);
        }
    }

    /// Append a unit that fits the budget on its own, flushing and seeding
    /// the buffer with overlap when it no longer fits.
    fn push_unit(&mut self, unit: &str) {
        if self.buffer.is_empty() {
            self.buffer.push_str(unit);
            return;
        }

        if self.size(&self.buffer) + SEPARATOR_LEN + self.size(unit) <= self.config.max_size {
            self.buffer.push_str(PARAGRAPH_SEPARATOR);
            self.buffer.push_str(unit);
            return;
        }

        let flushed = std::mem::take(&mut self.buffer);
        let seed = &flushed[self.overlap_start(&flushed)..];
        let mut seeded = String::with_capacity(seed.len() + SEPARATOR_LEN + unit.len());
        if !seed.is_empty() {
            seeded.push_str(seed);
            seeded.push_str(PARAGRAPH_SEPARATOR);
        }
        seeded.push_str(unit);
        self.emit(flushed);
        self.carry(seeded);
    }

    /// Emit budget-sized prefixes of `text` until the rest fits, starting
    /// each remainder with the overlap tail of the prefix just emitted.
    /// The rest becomes the new buffer.
    fn carry(&mut self, mut text: String) {
        while self.size(&text) > self.config.max_size {
            let cut = self.config.budget.prefix_end(&text, self.config.max_size);
            let head = &text[..cut];
            let mut next = self.overlap_start(head);
            // the whole prefix fits in the overlap only under a byte floor
            if next == 0 {
                next = cut;
            }
            let rest = text[next..].trim_start().to_string();
            self.emit(text[..cut].to_string());
            text = rest;
        }
        self.buffer = text;
    }

    /// Byte offset in `chunk` where the overlap carried into the next chunk
    /// begins, or `chunk.len()` when nothing is carried.
    ///
    /// Covers at most `overlap` units. Under the character budget the start
    /// moves past a blank line inside the tail; under the byte budget it sits
    /// on a code point boundary.
    fn overlap_start(&self, chunk: &str) -> usize {
        if self.config.overlap == 0 {
            return chunk.len();
        }

        let mut start = self.config.budget.suffix_start(chunk, self.config.overlap);
        let starts_paragraph = start == 0 || chunk[..start].ends_with(PARAGRAPH_SEPARATOR);
        if self.config.budget == ChunkBudget::Chars && !starts_paragraph {
            if let Some(pos) = chunk[start..].find(PARAGRAPH_SEPARATOR) {
                start += pos + SEPARATOR_LEN;
            }
        }

        let tail = &chunk[start..];
        start + (tail.len() - tail.trim_start().len())
    }

    /// Pack the sentences of an oversized paragraph into fragments that fit
    fn push_oversized(&mut self, paragraph: &str) {
        let max = self.config.max_size;
        // (start, end, size) of the fragment being accumulated
        let mut fragment: Option<(usize, usize, usize)> = None;

        for (start, end) in sentence_spans(paragraph) {
            let sentence = &paragraph[start..end];
            let sentence_size = self.size(sentence);

            if sentence_size > max {
                if let Some((s, e, _)) = fragment.take() {
                    self.push_unit(&paragraph[s..e]);
                }
                self.flush();
                self.push_hard_split(sentence, sentence_size);
                continue;
            }

            fragment = match fragment {
                None => Some((start, end, sentence_size)),
                Some((s, e, size)) => {
                    let extended = size + self.size(&paragraph[e..end]);
                    if extended <= max {
                        Some((s, end, extended))
                    } else {
                        self.push_unit(&paragraph[s..e]);
                        Some((start, end, sentence_size))
                    }
                }
            };
        }

        if let Some((s, e, _)) = fragment {
            self.push_unit(&paragraph[s..e]);
        }
    }

    /// Cut an unsplittable sentence into consecutive budget-sized slices.
    /// The last slice stays in the buffer so following text can join it.
    fn push_hard_split(&mut self, sentence: &str, size: usize) {
        let max = self.config.max_size;
        let mut rest = sentence;
        let mut remaining = size;

        while remaining > max {
            let cut = self.config.budget.prefix_end(rest, max);
            let slice = &rest[..cut];
            remaining -= self.size(slice);
            self.emit(slice.to_string());
            rest = &rest[cut..];
        }

        if !rest.is_empty() {
            self.buffer.push_str(rest);
        }
    }
}

/// Byte spans of the sentences in a paragraph, trailing whitespace excluded
fn sentence_spans(paragraph: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_END.find_iter(paragraph) {
        spans.push((start, boundary.start() + 1));
        start = boundary.end();
    }
    if start < paragraph.len() {
        spans.push((start, paragraph.len()));
    }

    spans
}

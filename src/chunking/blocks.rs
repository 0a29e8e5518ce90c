//! Styled document blocks and heading-aware segmentation
//!
//! A block is what a layout extractor reports for one paragraph-ish region
//! of a page: a run of text spans, each with its font size. Headings are
//! short blocks set in a larger font; each heading opens a new coarse chunk.

use serde::{Deserialize, Serialize};

/// Text run in a single font size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub size: f32,
}

/// One layout block of the source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBlock {
    pub spans: Vec<TextSpan>,
}

impl DocumentBlock {
    /// Block made of a single span
    pub fn single(text: impl Into<String>, size: f32) -> Self {
        Self {
            spans: vec![TextSpan {
                text: text.into(),
                size,
            }],
        }
    }

    /// Span texts, each trimmed, joined by single spaces
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|span| span.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Largest font size in the block (0.0 when empty)
    pub fn max_font_size(&self) -> f32 {
        self.spans.iter().map(|s| s.size).fold(0.0, f32::max)
    }
}

/// Decides which blocks are headings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingRule {
    /// Font size a heading must exceed
    pub min_font_size: f32,
    /// Headings have fewer words than this
    pub max_words: usize,
}

impl Default for HeadingRule {
    fn default() -> Self {
        Self {
            min_font_size: 12.0,
            max_words: 15,
        }
    }
}

impl HeadingRule {
    pub fn is_heading(&self, block: &DocumentBlock, text: &str) -> bool {
        !text.is_empty()
            && block.max_font_size() > self.min_font_size
            && text.split_whitespace().count() < self.max_words
    }
}

/// Section of the document between two headings
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseChunk {
    /// Heading that opened the section, if any
    pub heading: Option<String>,
    /// Heading line followed by body text
    pub text: String,
    /// First block (inclusive)
    pub block_start: usize,
    /// Last block (exclusive)
    pub block_end: usize,
}

/// Split blocks into coarse chunks at heading boundaries
pub fn segment(blocks: &[DocumentBlock], rule: &HeadingRule) -> Vec<CoarseChunk> {
    let mut chunks = Vec::new();
    let mut current: Option<CoarseChunk> = None;

    for (idx, block) in blocks.iter().enumerate() {
        let text = block.text();
        if text.is_empty() {
            continue;
        }

        if rule.is_heading(block, &text) {
            if let Some(done) = current.take() {
                push_trimmed(&mut chunks, done);
            }
            current = Some(CoarseChunk {
                heading: Some(text.clone()),
                text: format!("{}\n", text),
                block_start: idx,
                block_end: idx + 1,
            });
        } else {
            let chunk = current.get_or_insert_with(|| CoarseChunk {
                heading: None,
                text: String::new(),
                block_start: idx,
                block_end: idx + 1,
            });
            chunk.text.push_str(&text);
            chunk.text.push(' ');
            chunk.block_end = idx + 1;
        }
    }

    if let Some(done) = current {
        push_trimmed(&mut chunks, done);
    }

    chunks
}

fn push_trimmed(chunks: &mut Vec<CoarseChunk>, mut chunk: CoarseChunk) {
    chunk.text = chunk.text.trim().to_string();
    if !chunk.text.is_empty() {
        chunks.push(chunk);
    }
}

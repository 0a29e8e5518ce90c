//! Document loading
//!
//! Two inputs are understood:
//! - `.json`: an array of `{"spans": [{"text": ..., "size": ...}]}` blocks, the
//!   shape emitted by PDF layout extractors
//! - anything else: plain text or markdown, where `#` lines are headings and
//!   blank lines separate paragraphs

use super::blocks::DocumentBlock;
use crate::errors::{RagError, Result};
use std::fs;
use std::path::Path;

/// Font size given to markdown headings
pub const PLAIN_HEADING_SIZE: f32 = 18.0;

/// Font size given to body paragraphs
pub const PLAIN_BODY_SIZE: f32 = 11.0;

/// Read a document into styled blocks
pub fn load_blocks(path: &Path) -> Result<Vec<DocumentBlock>> {
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&content).map_err(|e| {
            RagError::Chunking(format!("{} is not a block list: {}", path.display(), e))
        })
    } else {
        Ok(parse_plain_text(&content))
    }
}

/// Turn plain text or markdown into blocks
pub fn parse_plain_text(content: &str) -> Vec<DocumentBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    let flush = |paragraph: &mut Vec<&str>, blocks: &mut Vec<DocumentBlock>| {
        if !paragraph.is_empty() {
            blocks.push(DocumentBlock::single(paragraph.join(" "), PLAIN_BODY_SIZE));
            paragraph.clear();
        }
    };

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush(&mut paragraph, &mut blocks);
        } else if trimmed.starts_with('#') {
            flush(&mut paragraph, &mut blocks);
            let heading = trimmed.trim_start_matches('#').trim();
            if !heading.is_empty() {
                blocks.push(DocumentBlock::single(heading, PLAIN_HEADING_SIZE));
            }
        } else {
            paragraph.push(trimmed);
        }
    }
    flush(&mut paragraph, &mut blocks);

    blocks
}

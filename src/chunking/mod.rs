//! Document chunking
//!
//! Turns a document into passages in two passes:
//! 1. Heading-aware segmentation into coarse chunks ([`blocks`])
//! 2. Token-bounded splitting with overlap ([`split`])
//!
//! Passage ids follow document order.

pub mod blocks;
pub mod loader;
pub mod split;
pub mod tokens;

pub use blocks::{CoarseChunk, DocumentBlock, HeadingRule, TextSpan};
pub use loader::{load_blocks, parse_plain_text};
pub use split::split_tokens;
pub use tokens::{HeuristicCounter, HfTokenCounter, TokenCounter};

use crate::config::ChunkingConfig;
use crate::errors::{RagError, Result};
use crate::types::{Passage, SourceSpan};
use std::sync::Arc;

/// Chunker settings
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkerConfig {
    pub max_tokens: usize,
    pub overlap: usize,
    pub heading: HeadingRule,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            overlap: 100,
            heading: HeadingRule::default(),
        }
    }
}

impl From<&ChunkingConfig> for ChunkerConfig {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            overlap: config.overlap,
            heading: HeadingRule {
                min_font_size: config.heading_font_size,
                max_words: config.heading_max_words,
            },
        }
    }
}

/// Splits documents into passages
pub struct Chunker {
    config: ChunkerConfig,
    counter: Arc<dyn TokenCounter>,
}

impl Chunker {
    pub fn new(config: ChunkerConfig, counter: Arc<dyn TokenCounter>) -> Result<Self> {
        if config.max_tokens == 0 || config.overlap >= config.max_tokens {
            return Err(RagError::Configuration(format!(
                "chunk overlap ({}) must be less than max tokens ({})",
                config.overlap, config.max_tokens
            )));
        }
        Ok(Self { config, counter })
    }

    /// Build the counter named by the chunking config: a local
    /// `tokenizer.json` if given, else the hub repo's tokenizer.
    pub fn counter_from_config(config: &ChunkingConfig) -> Result<Arc<dyn TokenCounter>> {
        let counter = match &config.tokenizer_file {
            Some(path) => HfTokenCounter::from_file(path)?,
            None => HfTokenCounter::from_hub(&config.tokenizer_repo)?,
        };
        Ok(Arc::new(counter))
    }

    /// Chunk a whole document, ids assigned 0..n in document order
    pub fn chunk(&self, blocks: &[DocumentBlock]) -> Result<Vec<Passage>> {
        let coarse = blocks::segment(blocks, &self.config.heading);
        tracing::debug!("{} blocks segmented into {} coarse chunks", blocks.len(), coarse.len());

        let mut passages = Vec::new();
        for chunk in &coarse {
            let pieces = split_tokens(
                &chunk.text,
                self.config.max_tokens,
                self.config.overlap,
                self.counter.as_ref(),
            )?;

            for text in pieces {
                let span = SourceSpan {
                    heading: chunk.heading.clone(),
                    block_start: chunk.block_start,
                    block_end: chunk.block_end,
                };
                passages.push(Passage::new(passages.len(), text).with_span(span));
            }
        }

        tracing::info!("chunked document into {} passages", passages.len());
        Ok(passages)
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }
}

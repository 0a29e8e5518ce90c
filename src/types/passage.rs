//! Passages and vectors
//!
//! A passage is an immutable span of document text. Its `id` is its position
//! in the passage store and therefore also its row in the vector index.

use serde::{Deserialize, Serialize};

/// Embedding of a passage or query
pub type Vector = Vec<f32>;

/// Where a passage came from in the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Heading of the section the passage belongs to
    pub heading: Option<String>,
    /// First document block (inclusive)
    pub block_start: usize,
    /// Last document block (exclusive)
    pub block_end: usize,
}

/// Retrievable unit of document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Position index, 0-based, stable within one knowledge base
    pub id: usize,
    /// Passage text, never empty
    pub text: String,
    /// Optional provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_span: Option<SourceSpan>,
}

impl Passage {
    /// Create a passage without provenance
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            source_span: None,
        }
    }

    /// Attach provenance
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.source_span = Some(span);
        self
    }
}

/// Passage paired with its squared L2 distance to a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_serialization_skips_empty_span() {
        let passage = Passage::new(3, "Body text");
        let json = serde_json::to_string(&passage).unwrap();
        assert!(!json.contains("source_span"));

        let back: Passage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, passage);
    }

    #[test]
    fn test_passage_with_span() {
        let passage = Passage::new(0, "Chapter 1\nIntro").with_span(SourceSpan {
            heading: Some("Chapter 1".to_string()),
            block_start: 0,
            block_end: 2,
        });
        assert_eq!(
            passage.source_span.unwrap().heading.as_deref(),
            Some("Chapter 1")
        );
    }
}

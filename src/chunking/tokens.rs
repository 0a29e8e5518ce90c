//! Token counting for chunk budgets
//!
//! Chunk limits are expressed in tokens of the generation model, so the
//! production counter runs that model's tokenizer. The character heuristic
//! is kept for offline use and tests.
//!
//! # Heuristic
//!
//! ```text
//! estimate(text) = ⌈chars(text) / 4⌉
//! ```

use crate::errors::{RagError, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::Path;
use tokenizers::Tokenizer;

/// Counts tokens the way the generation model would
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> Result<usize>;
}

/// Character-based estimate, 1 token ≈ 4 characters
#[derive(Debug, Clone, Default)]
pub struct HeuristicCounter;

impl HeuristicCounter {
    pub fn new() -> Self {
        Self
    }

    /// Estimate token count for text
    ///
    /// ```
    /// # use docbuddy::chunking::tokens::HeuristicCounter;
    /// let counter = HeuristicCounter::new();
    /// assert_eq!(counter.estimate(&"a".repeat(100)), 25);
    /// ```
    pub fn estimate(&self, text: &str) -> usize {
        // Ceiling division to avoid underestimation
        (text.chars().count() + 3) / 4
    }
}

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.estimate(text))
    }
}

/// Counter backed by a Hugging Face `tokenizer.json`
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
}

impl HfTokenCounter {
    /// Load a tokenizer from a local `tokenizer.json`
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            RagError::Configuration(format!(
                "Failed to load tokenizer from {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { tokenizer })
    }

    /// Download (or reuse the cached) `tokenizer.json` of a hub repo
    pub fn from_hub(repo_id: &str) -> Result<Self> {
        let api = Api::new().map_err(|e| {
            RagError::Configuration(format!("Failed to create HuggingFace API client: {}", e))
        })?;
        let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));
        let path = repo.get("tokenizer.json").map_err(|e| {
            RagError::Configuration(format!(
                "Failed to download tokenizer for {}: {}",
                repo_id, e
            ))
        })?;
        tracing::debug!("tokenizer for {} cached at {}", repo_id, path.display());
        Self::from_file(&path)
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| RagError::Chunking(format!("Tokenization failed: {}", e)))?;
        Ok(encoding.get_ids().len())
    }
}

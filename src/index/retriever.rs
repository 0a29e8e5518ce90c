//! Retrieval with a relevance gate

use super::handle::KnowledgeHandle;
use crate::config::RetrievalConfig;
use crate::errors::Result;
use crate::types::ScoredPassage;

/// Result of a retrieval after the relevance gate
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// At least one passage within the threshold, ascending by distance
    Found(Vec<ScoredPassage>),
    /// Nothing close enough to answer from
    NotFound,
}

impl Retrieval {
    pub fn passages(&self) -> &[ScoredPassage] {
        match self {
            Retrieval::Found(passages) => passages,
            Retrieval::NotFound => &[],
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Retrieval::Found(_))
    }
}

/// Keep passages with distance <= threshold; none left means `NotFound`
pub fn apply_gate(results: Vec<ScoredPassage>, threshold: f32) -> Retrieval {
    let relevant: Vec<ScoredPassage> = results
        .into_iter()
        .filter(|scored| scored.distance <= threshold)
        .collect();

    if relevant.is_empty() {
        Retrieval::NotFound
    } else {
        Retrieval::Found(relevant)
    }
}

#[derive(Debug, Clone)]
pub struct Retriever {
    knowledge: KnowledgeHandle,
    top_k: usize,
    threshold: f32,
}

impl Retriever {
    pub fn new(knowledge: KnowledgeHandle, top_k: usize, threshold: f32) -> Self {
        Self {
            knowledge,
            top_k,
            threshold,
        }
    }

    pub fn from_config(knowledge: KnowledgeHandle, config: &RetrievalConfig) -> Self {
        Self::new(knowledge, config.top_k, config.threshold)
    }

    pub fn knowledge(&self) -> &KnowledgeHandle {
        &self.knowledge
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Top-k search against the published knowledge base, then the gate.
    ///
    /// Fails with `KnowledgeBaseUnavailable` when nothing is published and
    /// `DimensionMismatch` when the query does not fit the index.
    pub fn retrieve(&self, query: &[f32]) -> Result<Retrieval> {
        let knowledge = self.knowledge.current()?;
        let results = knowledge.search(query, self.top_k)?;

        if let Some(best) = results.first() {
            tracing::debug!(
                "retrieved {} passages, best distance {:.4} (threshold {})",
                results.len(),
                best.distance,
                self.threshold
            );
        }

        Ok(apply_gate(results, self.threshold))
    }
}

//! Document ingestion: load → chunk → embed → build → save → publish

use crate::chunking::{load_blocks, Chunker};
use crate::embedding::EmbeddingGateway;
use crate::errors::{RagError, Result};
use crate::index::{KnowledgeBase, KnowledgeHandle};
use crate::types::Vector;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Passages produced by chunking
    pub passages: usize,
    /// Passages that made it into the knowledge base
    pub indexed: usize,
    pub failed_batches: usize,
    pub dimension: usize,
    pub elapsed: Duration,
}

pub struct Ingestor {
    chunker: Chunker,
    gateway: EmbeddingGateway,
    knowledge: KnowledgeHandle,
    output: PathBuf,
}

impl Ingestor {
    pub fn new(
        chunker: Chunker,
        gateway: EmbeddingGateway,
        knowledge: KnowledgeHandle,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            chunker,
            gateway,
            knowledge,
            output: output.into(),
        }
    }

    /// Ingest `document`. The knowledge base is saved and published only
    /// once it is complete; on error the previous one stays in place.
    pub async fn run(&self, document: &Path) -> Result<IngestReport> {
        let started = Instant::now();
        tracing::info!("ingesting {}", document.display());

        let blocks = load_blocks(document)?;
        let passages = self.chunker.chunk(&blocks)?;
        if passages.is_empty() {
            return Err(RagError::Chunking(format!(
                "{} produced no passages",
                document.display()
            )));
        }

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let report = self.gateway.embed_all(&texts).await?;
        let dimension = report.dimension().ok_or_else(|| {
            RagError::provider(
                self.gateway.provider_name(),
                "every embedding batch failed, nothing to index",
            )
        })?;

        if !report.is_complete() {
            tracing::warn!(
                "{} of {} passages dropped after failed embedding batches",
                passages.len() - report.vectors.len(),
                passages.len()
            );
        }

        // keep only embedded passages so index rows and passages stay aligned
        let total = passages.len();
        let mut slots: Vec<Option<_>> = passages.into_iter().map(Some).collect();
        let mut kept = Vec::with_capacity(report.vectors.len());
        let mut vectors: Vec<Vector> = Vec::with_capacity(report.vectors.len());
        for (position, vector) in report.vectors.iter() {
            if let Some(passage) = slots.get_mut(*position).and_then(Option::take) {
                kept.push(passage);
                vectors.push(vector.clone());
            }
        }

        let source = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let knowledge = KnowledgeBase::new(kept, &vectors, source)?;
        knowledge.save(&self.output)?;

        let indexed = knowledge.len();
        self.knowledge.publish(knowledge);

        let ingest = IngestReport {
            source: document.to_path_buf(),
            output: self.output.clone(),
            passages: total,
            indexed,
            failed_batches: report.failed_batches.len(),
            dimension,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "ingested {} ({} passages indexed, dim {}) in {:.1}s",
            document.display(),
            indexed,
            dimension,
            ingest.elapsed.as_secs_f64()
        );
        Ok(ingest)
    }
}

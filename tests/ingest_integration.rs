//! Ingestion through to a saved, reloadable, queryable knowledge base

mod common;

use async_trait::async_trait;
use common::{KeywordEmbedder, ScriptedGenerator};
use docbuddy::chunking::{Chunker, ChunkerConfig, HeuristicCounter};
use docbuddy::conversation::Session;
use docbuddy::embedding::{EmbeddingGateway, GatewayConfig};
use docbuddy::errors::{RagError, Result};
use docbuddy::index::{KnowledgeBase, KnowledgeHandle, Retriever};
use docbuddy::pipeline::{Assistant, Ingestor, Input, Outcome};
use docbuddy::providers::EmbeddingProvider;
use docbuddy::types::Vector;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const DOCUMENT: &str = "\
# The Sun

The sun sits at the centre of the solar system.
It is very hot.

# The Moon

The moon orbits the earth every 27 days.

# The Stars

Every star you see at night is far away.
";

fn gateway(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> EmbeddingGateway {
    EmbeddingGateway::new(
        provider,
        GatewayConfig {
            batch_size,
            concurrency: 2,
            pacing: Duration::ZERO,
            retry_backoff: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        },
    )
}

fn chunker() -> Chunker {
    Chunker::new(ChunkerConfig::default(), Arc::new(HeuristicCounter::new())).unwrap()
}

fn write_document(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("sky.md");
    fs::write(&path, DOCUMENT).unwrap();
    path
}

/// Refuses any batch mentioning the moon
struct MoonAllergicEmbedder;

#[async_trait]
impl EmbeddingProvider for MoonAllergicEmbedder {
    fn name(&self) -> &str {
        "moon-allergic"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.iter().any(|t| t.contains("moon")) {
            return Err(RagError::provider("moon-allergic", "rejected"));
        }
        Ok(texts.iter().map(|t| KeywordEmbedder::vector(t)).collect())
    }
}

#[tokio::test]
async fn test_ingest_save_reload_round_trip() {
    let dir = TempDir::new().unwrap();
    let document = write_document(&dir);
    let output = dir.path().join("kb").join("knowledge.json");
    let handle = KnowledgeHandle::new();

    let ingestor = Ingestor::new(
        chunker(),
        gateway(Arc::new(KeywordEmbedder::new()), 2),
        handle.clone(),
        &output,
    );
    let report = ingestor.run(&document).await.unwrap();

    assert_eq!(report.passages, 3);
    assert_eq!(report.indexed, 3);
    assert_eq!(report.failed_batches, 0);
    assert_eq!(report.dimension, 3);
    assert!(output.exists());

    let published = handle.current().unwrap();
    assert_eq!(published.source(), Some("sky.md"));
    assert_eq!(
        published.passages().get(0).unwrap().text,
        "The Sun\nThe sun sits at the centre of the solar system. It is very hot."
    );

    let reloaded = KnowledgeBase::load(&output).unwrap();
    assert_eq!(reloaded.len(), published.len());
    assert_eq!(reloaded.index().len(), reloaded.passages().len());
    assert_eq!(reloaded.checksum(), published.checksum());

    for query in [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.5, 0.5, 2.0]] {
        assert_eq!(
            reloaded.search(&query, 3).unwrap(),
            published.search(&query, 3).unwrap()
        );
    }
}

#[tokio::test]
async fn test_failed_batch_dropped_and_ids_stay_aligned() {
    let dir = TempDir::new().unwrap();
    let document = write_document(&dir);
    let output = dir.path().join("knowledge.json");
    let handle = KnowledgeHandle::new();

    let ingestor = Ingestor::new(
        chunker(),
        gateway(Arc::new(MoonAllergicEmbedder), 1),
        handle.clone(),
        &output,
    );
    let report = ingestor.run(&document).await.unwrap();

    assert_eq!(report.passages, 3);
    assert_eq!(report.indexed, 2);
    assert_eq!(report.failed_batches, 1);

    let kb = KnowledgeBase::load(&output).unwrap();
    assert_eq!(kb.len(), 2);
    for (i, passage) in kb.passages().iter().enumerate() {
        assert_eq!(passage.id, i);
        assert!(!passage.text.contains("moon"));
        let expected = KeywordEmbedder::vector(&passage.text);
        assert_eq!(kb.index().row(i).unwrap(), expected.as_slice());
    }
}

#[tokio::test]
async fn test_total_embedding_failure_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let document = write_document(&dir);
    let output = dir.path().join("knowledge.json");
    let handle = KnowledgeHandle::new();

    let ingestor = Ingestor::new(
        chunker(),
        gateway(Arc::new(KeywordEmbedder::failing()), 10),
        handle.clone(),
        &output,
    );

    assert!(matches!(
        ingestor.run(&document).await,
        Err(RagError::Provider { .. })
    ));
    assert!(!output.exists());
    assert!(!handle.is_available());
}

#[tokio::test]
async fn test_empty_document_is_rejected() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("empty.txt");
    fs::write(&document, "\n\n   \n").unwrap();
    let output = dir.path().join("knowledge.json");

    let ingestor = Ingestor::new(
        chunker(),
        gateway(Arc::new(KeywordEmbedder::new()), 10),
        KnowledgeHandle::new(),
        &output,
    );

    assert!(matches!(
        ingestor.run(&document).await,
        Err(RagError::Chunking(_))
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_reingest_publishes_new_knowledge() {
    let dir = TempDir::new().unwrap();
    let document = write_document(&dir);
    let output = dir.path().join("knowledge.json");
    let handle = KnowledgeHandle::new();

    let generator = Arc::new(ScriptedGenerator::new("Far away."));
    let assistant = Assistant::new(
        gateway(Arc::new(KeywordEmbedder::new()), 10),
        Retriever::new(handle.clone(), 3, 1.5),
        generator,
    );
    let mut session = Session::new(5);

    let before = assistant
        .answer(&mut session, Input::Text("Where is a star?".into()))
        .await;
    assert_eq!(before.outcome, Outcome::Unavailable);

    Ingestor::new(
        chunker(),
        gateway(Arc::new(KeywordEmbedder::new()), 10),
        handle.clone(),
        &output,
    )
    .run(&document)
    .await
    .unwrap();

    let after = assistant
        .answer(&mut session, Input::Text("Where is a star?".into()))
        .await;
    assert_eq!(after.outcome, Outcome::Answered);
    assert_eq!(after.text, "Far away.");
}

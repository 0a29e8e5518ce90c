//! Embedding gateway
//!
//! Ingestion embeds passages in fixed-size batches:
//! - at most `concurrency` batches in flight
//! - batch starts spaced by the pacing interval
//! - a failing batch is retried once after a fixed backoff, then recorded as failed
//!
//! Results come back in input order whatever order the batches finish in.

pub mod pacing;

pub use pacing::Pacer;

use crate::config::EmbeddingConfig;
use crate::errors::{RagError, Result};
use crate::providers::EmbeddingProvider;
use crate::retry::RetryPolicy;
use crate::types::Vector;
use futures_util::stream::{self, StreamExt};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wait before retrying a failed query embedding
const QUERY_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Called after each finished batch with (batches done, batches total)
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub batch_size: usize,
    pub concurrency: usize,
    pub pacing: Duration,
    pub retry_backoff: Duration,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from(&EmbeddingConfig::default())
    }
}

impl From<&EmbeddingConfig> for GatewayConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            concurrency: config.concurrency.max(1),
            pacing: Duration::from_millis(config.pacing_ms),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            timeout: config.provider.timeout(),
        }
    }
}

/// A batch that failed after its retry
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub batch: usize,
    /// Input positions the batch covered
    pub range: Range<usize>,
    pub error: String,
}

/// Outcome of embedding a whole document
#[derive(Debug, Clone, Default)]
pub struct EmbeddingReport {
    /// (input position, vector), ascending by position
    pub vectors: Vec<(usize, Vector)>,
    pub failed_batches: Vec<BatchFailure>,
}

impl EmbeddingReport {
    pub fn dimension(&self) -> Option<usize> {
        self.vectors.first().map(|(_, v)| v.len())
    }

    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    config: GatewayConfig,
    progress: Option<ProgressFn>,
}

impl EmbeddingGateway {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: GatewayConfig) -> Self {
        Self {
            provider,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn batch_policy(&self) -> RetryPolicy {
        RetryPolicy::retry_once(self.config.retry_backoff).with_timeout(self.config.timeout)
    }

    async fn embed_batch(&self, texts: &[String], policy: &RetryPolicy, label: &str) -> Result<Vec<Vector>> {
        let vectors = policy
            .execute(label, || self.provider.embed(texts))
            .await?;

        if vectors.len() != texts.len() {
            return Err(RagError::provider(
                self.provider.name(),
                format!("expected {} vectors, got {}", texts.len(), vectors.len()),
            ));
        }
        Ok(vectors)
    }

    /// Embed every text. Only a dimension disagreement fails the call;
    /// provider failures are reported per batch.
    pub async fn embed_all(&self, texts: &[String]) -> Result<EmbeddingReport> {
        let batch_size = self.config.batch_size.max(1);
        let total = texts.len().div_ceil(batch_size);
        let pacer = Pacer::new(self.config.pacing);
        let policy = self.batch_policy();
        let done = AtomicUsize::new(0);

        tracing::info!(
            "embedding {} texts in {} batches via {}",
            texts.len(),
            total,
            self.provider.name()
        );

        let outcomes: Vec<(usize, Range<usize>, Result<Vec<Vector>>)> =
            stream::iter(texts.chunks(batch_size).enumerate())
                .map(|(batch, chunk)| {
                    let pacer = &pacer;
                    let policy = &policy;
                    let done = &done;
                    async move {
                        pacer.wait().await;
                        let start = batch * batch_size;
                        let label = format!("embedding batch {}/{}", batch + 1, total);
                        let result = self.embed_batch(chunk, policy, &label).await;

                        let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                        if let Some(progress) = &self.progress {
                            progress(finished, total);
                        }
                        (batch, start..start + chunk.len(), result)
                    }
                })
                .buffered(self.config.concurrency.max(1))
                .collect()
                .await;

        let mut report = EmbeddingReport::default();
        for (batch, range, result) in outcomes {
            match result {
                Ok(vectors) => report.vectors.extend(range.zip(vectors)),
                Err(e) => {
                    tracing::warn!("batch {} (texts {:?}) dropped: {}", batch + 1, range, e);
                    report.failed_batches.push(BatchFailure {
                        batch,
                        range,
                        error: e.to_string(),
                    });
                }
            }
        }

        check_dimensions(report.vectors.iter().map(|(_, v)| v))?;

        tracing::info!(
            "embedded {} of {} texts ({} failed batches)",
            report.vectors.len(),
            texts.len(),
            report.failed_batches.len()
        );
        Ok(report)
    }

    /// Embed a single query, retried once on failure or timeout
    pub async fn embed_query(&self, text: &str) -> Result<Vector> {
        let policy = RetryPolicy::retry_once(QUERY_RETRY_DELAY).with_timeout(self.config.timeout);
        let input = [text.to_string()];

        let mut vectors = self
            .embed_batch(&input, &policy, "query embedding")
            .await
            .map_err(|e| match e {
                RagError::Timeout { .. } | RagError::Http(_) => {
                    RagError::provider(self.provider.name(), e.to_string())
                }
                other => other,
            })?;

        vectors
            .pop()
            .ok_or_else(|| RagError::provider(self.provider.name(), "no vector returned"))
    }
}

/// Every vector must have the first vector's length
pub fn check_dimensions<'a>(mut vectors: impl Iterator<Item = &'a Vector>) -> Result<()> {
    let Some(first) = vectors.next() else {
        return Ok(());
    };
    let expected = first.len();
    for v in vectors {
        if v.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: v.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Embeds each text as [len, first byte]; fails listed batches a set number of times
    struct FakeEmbedder {
        calls: Mutex<usize>,
        failing: Mutex<HashSet<String>>,
        fail_forever: bool,
        delay_first: bool,
    }

    impl FakeEmbedder {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
                failing: Mutex::new(HashSet::new()),
                fail_forever: false,
                delay_first: false,
            }
        }

        fn failing_on(text: &str, forever: bool) -> Self {
            let fake = Self::new();
            fake.failing.lock().unwrap().insert(text.to_string());
            Self {
                fail_forever: forever,
                ..fake
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        fn name(&self) -> &str {
            "fake"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
            *self.calls.lock().unwrap() += 1;
            if self.delay_first && texts.first().map(|t| t == "t0").unwrap_or(false) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            {
                let mut failing = self.failing.lock().unwrap();
                if let Some(bad) = texts.iter().find(|t| failing.contains(*t)).cloned() {
                    if !self.fail_forever {
                        failing.remove(&bad);
                    }
                    return Err(RagError::provider("fake", format!("rate limited on {}", bad)));
                }
            }
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, t.as_bytes()[0] as f32])
                .collect())
        }
    }

    fn fast_config(batch_size: usize, concurrency: usize) -> GatewayConfig {
        GatewayConfig {
            batch_size,
            concurrency,
            pacing: Duration::ZERO,
            retry_backoff: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t{}", i)).collect()
    }

    #[tokio::test]
    async fn test_order_preserved_across_batches() {
        let fake = FakeEmbedder {
            delay_first: true,
            ..FakeEmbedder::new()
        };
        let gateway = EmbeddingGateway::new(Arc::new(fake), fast_config(3, 4));
        let input = texts(10);

        let report = gateway.embed_all(&input).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.vectors.len(), 10);
        for (i, (pos, v)) in report.vectors.iter().enumerate() {
            assert_eq!(*pos, i);
            assert_eq!(v[0], input[i].len() as f32);
        }
        assert_eq!(report.dimension(), Some(2));
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let fake = Arc::new(FakeEmbedder::failing_on("t4", false));
        let gateway = EmbeddingGateway::new(fake.clone(), fast_config(2, 1));

        let report = gateway.embed_all(&texts(6)).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.vectors.len(), 6);
        // three batches plus one retry
        assert_eq!(*fake.calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_persistent_failure_drops_batch() {
        let fake = Arc::new(FakeEmbedder::failing_on("t2", true));
        let gateway = EmbeddingGateway::new(fake, fast_config(2, 2));

        let report = gateway.embed_all(&texts(6)).await.unwrap();
        assert_eq!(report.failed_batches.len(), 1);
        assert_eq!(report.failed_batches[0].range, 2..4);
        let positions: Vec<usize> = report.vectors.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0, 1, 4, 5]);
    }

    #[tokio::test]
    async fn test_progress_reports_every_batch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let gateway = EmbeddingGateway::new(Arc::new(FakeEmbedder::new()), fast_config(4, 2))
            .with_progress(Arc::new(move |done, total| sink.lock().unwrap().push((done, total))));

        gateway.embed_all(&texts(9)).await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(_, total)| *total == 3));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let gateway = EmbeddingGateway::new(Arc::new(FakeEmbedder::new()), fast_config(10, 2));
        let report = gateway.embed_all(&[]).await.unwrap();
        assert!(report.vectors.is_empty());
        assert_eq!(report.dimension(), None);
    }

    #[tokio::test]
    async fn test_embed_query_retries_then_fails() {
        let fake = Arc::new(FakeEmbedder::failing_on("hello", true));
        let gateway = EmbeddingGateway::new(fake.clone(), fast_config(10, 2));

        let result = gateway.embed_query("hello").await;
        assert!(matches!(result, Err(RagError::Provider { .. })));
        assert_eq!(*fake.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_embed_query() {
        let gateway = EmbeddingGateway::new(Arc::new(FakeEmbedder::new()), fast_config(10, 2));
        assert_eq!(gateway.embed_query("ab").await.unwrap(), vec![2.0, 97.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let vectors = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            check_dimensions(vectors.iter()),
            Err(RagError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}

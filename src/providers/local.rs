//! In-process embeddings with a BERT-family model on candle
//!
//! Model files (config.json, tokenizer.json, model.safetensors) come from the
//! Hugging Face hub on first use and are cached by hf-hub afterwards.

use super::EmbeddingProvider;
use crate::errors::{RagError, Result};
use crate::types::Vector;
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::Tokenizer;

const PROVIDER: &str = "local";

/// Default sentence embedding model
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

fn local_error(context: &str, e: impl std::fmt::Display) -> RagError {
    RagError::provider(PROVIDER, format!("{}: {}", context, e))
}

struct LocalModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Embedding provider running a BERT model on the CPU
#[derive(Clone)]
pub struct LocalEmbedder {
    inner: Arc<LocalModel>,
    model_id: String,
}

impl LocalEmbedder {
    /// Load a model from the hub (downloads on first use)
    pub fn from_hub(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().map_err(|e| local_error("Failed to create HuggingFace API client", e))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| local_error("Failed to download model config", e))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| local_error("Failed to download tokenizer", e))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| local_error("Failed to download model weights", e))?;

        let config_contents = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_contents)?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| local_error("Failed to load tokenizer", e))?;

        // SAFETY: the weights file is owned by the hf-hub cache and not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| local_error("Failed to load model weights", e))?
        };
        let model = BertModel::load(vb, &config).map_err(|e| local_error("Failed to build model", e))?;

        tracing::info!("loaded local embedding model {}", model_id);

        Ok(Self {
            inner: Arc::new(LocalModel {
                model,
                tokenizer,
                device,
            }),
            model_id: model_id.to_string(),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

impl LocalModel {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| local_error("Tokenization failed", e))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = texts.len();

        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let offset = row * max_len;
            flat_ids[offset..offset + ids.len()].copy_from_slice(ids);
            flat_mask[offset..offset + mask.len()].copy_from_slice(mask);
        }

        let forward = || -> candle_core::Result<Vec<Vec<f32>>> {
            let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
            let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
            let token_type_ids = token_ids.zeros_like()?;

            let hidden = self
                .model
                .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
            mean_pool(&hidden, &attention_mask)?.to_vec2::<f32>()
        };

        forward().map_err(|e| local_error("Forward pass failed", e))
    }
}

/// Mean over the sequence, padding excluded
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask
        .unsqueeze(2)?
        .expand(hidden.shape())?
        .to_dtype(hidden.dtype())?;

    let summed = (hidden * &mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    summed.broadcast_div(&counts)
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let inner = self.inner.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || inner.embed_batch(&texts))
            .await
            .map_err(|e| local_error("Embedding task panicked", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_ignores_padding() {
        let device = Device::Cpu;
        // one row, three positions, two dims; last position is padding
        let hidden =
            Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 100.0, 100.0], (1, 3, 2), &device).unwrap();
        let mask = Tensor::from_vec(vec![1u32, 1, 0], (1, 3), &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[tokio::test]
    #[ignore] // Integration test - requires model download
    async fn test_embed_batch() {
        let embedder = LocalEmbedder::from_hub(DEFAULT_MODEL_ID).expect("Failed to load model");
        let texts = vec!["Hello".to_string(), "World".to_string()];
        let vectors = embedder.embed(&texts).await.expect("Failed to embed");
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), vectors[1].len());
    }
}

//! Ollama API client
//!
//! Non-streaming calls against a local Ollama server:
//! - Embeddings: POST /api/embed
//! - Chat: POST /api/chat

use super::{error_body, EmbeddingProvider, GenerationProvider};
use crate::config::ProviderConfig;
use crate::errors::{RagError, Result};
use crate::types::{ChatMessage, Vector};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

const PROVIDER: &str = "ollama";

/// Ollama client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create Ollama client with custom configuration
    pub fn with_config(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::with_config(&config.base_url, &config.model, config.timeout())
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_body(PROVIDER, response).await);
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to parse embeddings: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(RagError::provider(
                PROVIDER,
                format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    body.embeddings.len()
                ),
            ));
        }

        Ok(body.embeddings)
    }
}

#[async_trait]
impl GenerationProvider for OllamaClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatOptions { temperature },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_body(PROVIDER, response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to parse chat reply: {}", e)))?;

        Ok(body.message.content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vector>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

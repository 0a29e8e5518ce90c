//! OpenAI-compatible and Azure OpenAI client
//!
//! OpenAI style: `{base_url}/embeddings`, `{base_url}/chat/completions`,
//! bearer auth. Azure style: `{base_url}/openai/deployments/{model}/...`
//! with `api-version` query and `api-key` header.

use super::{error_body, EmbeddingProvider, GenerationProvider};
use crate::config::{ProviderConfig, ProviderKind};
use crate::errors::{RagError, Result};
use crate::types::{ChatMessage, Vector};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
enum Flavor {
    OpenAi,
    Azure { api_version: String },
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    flavor: Flavor,
}

impl OpenAiClient {
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            RagError::Configuration(format!("{} model {} needs an API key", config.base_url, config.model))
        })?;

        let flavor = match config.kind {
            ProviderKind::Azure => Flavor::Azure {
                api_version: config.api_version.clone().ok_or_else(|| {
                    RagError::Configuration("Azure deployments need api_version".to_string())
                })?,
            },
            _ => Flavor::OpenAi,
        };

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            flavor,
        })
    }

    fn provider_name(&self) -> &'static str {
        match self.flavor {
            Flavor::OpenAi => "openai",
            Flavor::Azure { .. } => "azure",
        }
    }

    fn endpoint(&self, operation: &str) -> String {
        match &self.flavor {
            Flavor::OpenAi => format!("{}/{}", self.base_url, operation),
            Flavor::Azure { api_version } => format!(
                "{}/openai/deployments/{}/{}?api-version={}",
                self.base_url, self.model, operation, api_version
            ),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.flavor {
            Flavor::OpenAi => request.bearer_auth(&self.api_key),
            Flavor::Azure { .. } => request.header("api-key", &self.api_key),
        }
    }

    /// Azure takes the model from the deployment path
    fn model_field(&self) -> Option<&str> {
        match self.flavor {
            Flavor::OpenAi => Some(&self.model),
            Flavor::Azure { .. } => None,
        }
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<R> {
        let provider = self.provider_name();
        let response = self
            .authorize(self.client.post(self.endpoint(operation)))
            .json(body)
            .send()
            .await
            .map_err(|e| RagError::provider(provider, format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_body(provider, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| RagError::provider(provider, format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    fn name(&self) -> &str {
        self.provider_name()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let request = EmbeddingRequest {
            model: self.model_field(),
            input: texts,
        };
        let response: EmbeddingResponse = self.post("embeddings", &request).await?;

        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        if data.len() != texts.len() {
            return Err(RagError::provider(
                self.provider_name(),
                format!("expected {} embeddings, got {}", texts.len(), data.len()),
            ));
        }

        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl GenerationProvider for OpenAiClient {
    fn name(&self) -> &str {
        self.provider_name()
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let request = CompletionRequest {
            model: self.model_field(),
            messages,
            temperature,
        };
        let response: CompletionResponse = self.post("chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| RagError::provider(self.provider_name(), "response has no choices"))
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vector,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

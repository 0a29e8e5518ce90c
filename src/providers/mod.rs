//! External model interfaces
//!
//! Every black box the assistant talks to sits behind one narrow async trait.
//! Concrete backends live in the submodules; [`build_embedder`],
//! [`build_generator`], [`build_translator`] and [`build_speech`] pick one
//! from configuration.

pub mod detector;
pub mod local;
pub mod ollama;
pub mod openai;
pub mod speech;
pub mod translator;

pub use detector::ScriptDetector;
pub use local::LocalEmbedder;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use speech::AzureSpeech;
pub use translator::AzureTranslator;

use crate::config::{EmbeddingConfig, GenerationConfig, LanguageConfig, ProviderKind, SpeechConfig};
use crate::errors::{RagError, Result};
use crate::types::{ChatMessage, Vector};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns texts into fixed-length vectors, one per input, in input order
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>>;
}

/// Produces an answer from a chat transcript
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;
}

/// Translates text. `from: None` asks the backend to auto-detect.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, from: Option<&str>, to: &str) -> Result<String>;
}

/// Guesses the language tag of a text, `None` when it cannot tell
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn recognize(&self, audio: &[u8], language: &str) -> Result<String>;
}

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

/// Build the embedding backend named by config
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = &config.provider;
    Ok(match provider.kind {
        ProviderKind::Ollama => Arc::new(OllamaClient::from_config(provider)?),
        ProviderKind::OpenAi | ProviderKind::Azure => Arc::new(OpenAiClient::from_config(provider)?),
        ProviderKind::Local => Arc::new(LocalEmbedder::from_hub(&provider.model)?),
    })
}

/// Build the generation backend named by config
pub fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn GenerationProvider>> {
    let provider = &config.provider;
    Ok(match provider.kind {
        ProviderKind::Ollama => Arc::new(OllamaClient::from_config(provider)?),
        ProviderKind::OpenAi | ProviderKind::Azure => Arc::new(OpenAiClient::from_config(provider)?),
        ProviderKind::Local => {
            return Err(RagError::Configuration(
                "local generation is not supported".to_string(),
            ))
        }
    })
}

/// Translator, when translation is switched on
pub fn build_translator(config: &LanguageConfig) -> Result<Option<Arc<dyn TranslationProvider>>> {
    if !config.translate {
        return Ok(None);
    }
    Ok(Some(Arc::new(AzureTranslator::from_config(config)?)))
}

/// Speech backend, when speech is switched on
pub fn build_speech(config: &SpeechConfig) -> Result<Option<Arc<AzureSpeech>>> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(AzureSpeech::from_config(config)?)))
}

/// Read an error body for a failed HTTP response
pub(crate) async fn error_body(provider: &str, response: reqwest::Response) -> RagError {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    RagError::provider(provider, format!("HTTP {}: {}", status, text))
}

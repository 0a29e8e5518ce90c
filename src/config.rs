//! Configuration management for docbuddy
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.docbuddy/config.toml (or `--config <path>`).
//!
//! Credentials may be left out of the file and supplied through the
//! environment instead: `DOCBUDDY_API_KEY`, `AZURE_TRANSLATOR_KEY`,
//! `AZURE_SPEECH_KEY`.

use crate::errors::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted when a provider needs an API key
pub const API_KEY_ENV: &str = "DOCBUDDY_API_KEY";
pub const TRANSLATOR_KEY_ENV: &str = "AZURE_TRANSLATOR_KEY";
pub const SPEECH_KEY_ENV: &str = "AZURE_SPEECH_KEY";

/// Complete configuration for docbuddy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub conversation: ConversationConfig,
    pub language: LanguageConfig,
    pub speech: SpeechConfig,
    pub logging: LoggingConfig,
}

/// Which backend serves an external model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible HTTP API
    OpenAi,
    /// Azure OpenAI deployment
    Azure,
    /// In-process candle model (embeddings only)
    Local,
}

impl ProviderKind {
    /// Whether this backend cannot work without an API key
    pub fn needs_api_key(&self) -> bool {
        matches!(self, ProviderKind::OpenAi | ProviderKind::Azure)
    }
}

/// Connection settings shared by embedding and generation providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Model name, or deployment name for Azure
    pub model: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Azure OpenAI api-version query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Per-request deadline
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Embedding gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    #[serde(flatten)]
    pub provider: ProviderConfig,
    /// Texts per provider call during ingestion
    pub batch_size: usize,
    /// Batches in flight at once
    pub concurrency: usize,
    /// Minimum spacing between batch starts
    pub pacing_ms: u64,
    /// Fixed wait before retrying a failed batch
    pub retry_backoff_ms: u64,
}

/// Answer generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(flatten)]
    pub provider: ProviderConfig,
    pub temperature: f32,
    pub retry_backoff_ms: u64,
}

/// Document chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub overlap: usize,
    /// Blocks whose largest span exceeds this size may be headings
    pub heading_font_size: f32,
    /// Headings are shorter than this many words
    pub heading_max_words: usize,
    /// Hugging Face repo holding the generation model's tokenizer.json
    pub tokenizer_repo: String,
    /// Local tokenizer.json, used instead of the repo when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_file: Option<PathBuf>,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Squared L2 distance above which a passage is considered irrelevant
    pub threshold: f32,
}

/// Conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Turns replayed into every prompt
    pub history_turns: usize,
    /// Retrieved passages placed in the context block
    pub max_passages: usize,
    pub system_instruction: String,
    pub separator: String,
    /// Write every input and answer to timestamped files
    pub transcripts: bool,
}

/// Translation and language handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language the document and generation model work in
    pub pivot: String,
    /// Reply language for code-mixed input
    pub code_mixed_reply: String,
    /// Enable the Azure translator
    pub translate: bool,
    pub translator_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator_region: Option<String>,
    pub timeout_secs: u64,
}

/// Speech synthesis and recognition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Voice for English replies
    pub voice_en: String,
    /// Voice for every other reply language
    pub voice_other: String,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
}

/// File system paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub state_dir: String,
    pub knowledge_file: String,
    pub transcript_dir: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                kind: ProviderKind::Ollama,
                model: "nomic-embed-text".to_string(),
                base_url: "http://127.0.0.1:11434".to_string(),
                api_key: None,
                api_version: None,
                timeout_secs: 30,
            },
            batch_size: 10,
            concurrency: 2,
            pacing_ms: 1000,
            retry_backoff_ms: 10_000,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                kind: ProviderKind::Ollama,
                model: "qwen2.5:7b-instruct".to_string(),
                base_url: "http://127.0.0.1:11434".to_string(),
                api_key: None,
                api_version: None,
                timeout_secs: 120,
            },
            temperature: 0.3,
            retry_backoff_ms: 2000,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            overlap: 100,
            heading_font_size: 12.0,
            heading_max_words: 15,
            tokenizer_repo: "Xenova/gpt-3.5-turbo".to_string(),
            tokenizer_file: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            threshold: 1.5,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_turns: 5,
            max_passages: 3,
            system_instruction:
                "You are an intelligent assistant. Answer based on the context provided."
                    .to_string(),
            separator: "\n---\n".to_string(),
            transcripts: false,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            pivot: "en".to_string(),
            code_mixed_reply: "hi".to_string(),
            translate: false,
            translator_endpoint: "https://api.cognitive.microsofttranslator.com".to_string(),
            translator_key: None,
            translator_region: None,
            timeout_secs: 15,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            region: "centralindia".to_string(),
            key: None,
            voice_en: "en-IN-NeerjaNeural".to_string(),
            voice_other: "hi-IN-SwaraNeural".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: "~/.docbuddy".to_string(),
            knowledge_file: "~/.docbuddy/knowledge.json".to_string(),
            transcript_dir: "~/.docbuddy/transcripts".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults, then fill credentials
    /// from the environment and validate.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(config_path) => Self::load_from_file(&config_path)?,
            None => Self::load_default()?,
        };
        config.resolve_credentials(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without validating it
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RagError::Configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents)
            .map_err(|e| RagError::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load from the standard location or fall back to built-in defaults
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_path();
        if config_path.exists() {
            return Self::load_from_file(&config_path);
        }
        Ok(Config::default())
    }

    /// Standard configuration file location
    pub fn default_path() -> PathBuf {
        Self::expand_path("~/.docbuddy/config.toml")
    }

    /// Fill unset credentials through `lookup` (the process environment in production)
    pub fn resolve_credentials<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for provider in [&mut self.embedding.provider, &mut self.generation.provider] {
            if provider.api_key.is_none() && provider.kind.needs_api_key() {
                provider.api_key = lookup(API_KEY_ENV);
            }
        }
        if self.language.translator_key.is_none() {
            self.language.translator_key = lookup(TRANSLATOR_KEY_ENV);
        }
        if self.speech.key.is_none() {
            self.speech.key = lookup(SPEECH_KEY_ENV);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.max_tokens == 0 {
            return Err(RagError::Configuration(
                "chunking.max_tokens must be greater than 0".to_string(),
            ));
        }
        if chunking.overlap >= chunking.max_tokens {
            return Err(RagError::Configuration(
                "chunking.overlap must be less than chunking.max_tokens".to_string(),
            ));
        }
        if chunking.heading_font_size <= 0.0 {
            return Err(RagError::Configuration(
                "chunking.heading_font_size must be positive".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 || self.embedding.concurrency == 0 {
            return Err(RagError::Configuration(
                "embedding.batch_size and embedding.concurrency must be greater than 0"
                    .to_string(),
            ));
        }
        if self.generation.provider.kind == ProviderKind::Local {
            return Err(RagError::Configuration(
                "generation.kind = \"local\" is not supported".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(RagError::Configuration(
                "generation.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        for (section, provider) in [
            ("embedding", &self.embedding.provider),
            ("generation", &self.generation.provider),
        ] {
            if provider.kind.needs_api_key() && provider.api_key.is_none() {
                return Err(RagError::Configuration(format!(
                    "{}: missing API key (set {}.api_key or {})",
                    section, section, API_KEY_ENV
                )));
            }
            if provider.kind == ProviderKind::Azure && provider.api_version.is_none() {
                return Err(RagError::Configuration(format!(
                    "{}: Azure deployments need api_version",
                    section
                )));
            }
            if provider.timeout_secs == 0 {
                return Err(RagError::Configuration(format!(
                    "{}.timeout_secs must be greater than 0",
                    section
                )));
            }
        }

        if self.retrieval.top_k == 0 {
            return Err(RagError::Configuration(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }
        if !(self.retrieval.threshold.is_finite() && self.retrieval.threshold > 0.0) {
            return Err(RagError::Configuration(
                "retrieval.threshold must be a positive number".to_string(),
            ));
        }

        if self.conversation.history_turns == 0 || self.conversation.max_passages == 0 {
            return Err(RagError::Configuration(
                "conversation.history_turns and conversation.max_passages must be greater than 0"
                    .to_string(),
            ));
        }

        if self.language.translate && self.language.translator_key.is_none() {
            return Err(RagError::Configuration(format!(
                "language.translate is on but no translator key is set ({})",
                TRANSLATOR_KEY_ENV
            )));
        }
        if self.speech.enabled && self.speech.key.is_none() {
            return Err(RagError::Configuration(format!(
                "speech.enabled is on but no speech key is set ({})",
                SPEECH_KEY_ENV
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RagError::Configuration(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RagError::Configuration(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get state directory path
    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.state_dir)
    }

    /// Get knowledge base file path
    pub fn knowledge_file(&self) -> PathBuf {
        Self::expand_path(&self.paths.knowledge_file)
    }

    /// Get transcript directory path
    pub fn transcript_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.transcript_dir)
    }
}

//! Fake providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use docbuddy::errors::{RagError, Result};
use docbuddy::providers::{EmbeddingProvider, GenerationProvider, TranslationProvider};
use docbuddy::types::{ChatMessage, Vector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Topic words, one vector dimension each
pub const TOPICS: [&str; 3] = ["sun", "moon", "star"];

/// Embeds a text as 2.0 × (occurrences of each topic word)
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn vector(text: &str) -> Vector {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        TOPICS
            .iter()
            .map(|topic| 2.0 * words.iter().filter(|w| *w == topic).count() as f32)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RagError::provider("keyword", "service unavailable"));
        }
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Answers with a fixed text and remembers every prompt
pub struct ScriptedGenerator {
    pub answer: String,
    pub fail: bool,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGenerator {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Vec<ChatMessage> {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        if self.fail {
            return Err(RagError::provider("scripted", "model crashed"));
        }
        Ok(self.answer.clone())
    }
}

/// Dictionary translator: known phrases map, anything else is tagged "[to] text"
pub struct DictionaryTranslator {
    pub phrases: HashMap<String, String>,
    pub calls: Mutex<Vec<(String, Option<String>, String)>>,
    pub fail: bool,
}

impl DictionaryTranslator {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            phrases: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }
}

#[async_trait]
impl TranslationProvider for DictionaryTranslator {
    async fn translate(&self, text: &str, from: Option<&str>, to: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), from.map(str::to_string), to.to_string()));
        if self.fail {
            return Err(RagError::provider("translator", "quota exceeded"));
        }
        Ok(self
            .phrases
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", to, text)))
    }
}

//! Query language classification and the translation plan it implies

use crate::providers::{LanguageDetector, ScriptDetector};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
    /// Detected language tag, e.g. "en", "hi"
    Known(String),
    /// Latin letters mixed with another script (Hinglish and friends)
    CodeMixed,
    /// Detector had no answer
    Unknown,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Known(tag) => write!(f, "{}", tag),
            Language::CodeMixed => write!(f, "code-mixed"),
            Language::Unknown => write!(f, "unknown"),
        }
    }
}

/// ASCII letters alongside any non-ASCII character
pub fn is_code_mixed(text: &str) -> bool {
    let has_ascii_letter = text.chars().any(|c| c.is_ascii_alphabetic());
    let has_non_ascii = text.chars().any(|c| !c.is_ascii());
    has_ascii_letter && has_non_ascii
}

pub struct LanguageClassifier {
    detector: Arc<dyn LanguageDetector>,
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::new(Arc::new(ScriptDetector::new()))
    }
}

impl LanguageClassifier {
    pub fn new(detector: Arc<dyn LanguageDetector>) -> Self {
        Self { detector }
    }

    /// Code-mixed check first, then the detector. Detector errors mean Unknown.
    pub async fn classify(&self, text: &str) -> Language {
        if is_code_mixed(text) {
            return Language::CodeMixed;
        }

        match self.detector.detect(text).await {
            Ok(Some(tag)) => Language::Known(tag),
            Ok(None) => Language::Unknown,
            Err(e) => {
                tracing::warn!("language detection failed, treating as unknown: {}", e);
                Language::Unknown
            }
        }
    }
}

/// Which translations a query needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationPlan {
    /// `Some(source)` when the query must be translated to the pivot;
    /// the inner `None` asks the translator to auto-detect
    pub query_from: Option<Option<String>>,
    /// Language the reply is delivered in
    pub reply_language: String,
}

impl TranslationPlan {
    pub fn for_language(language: &Language, pivot: &str, code_mixed_reply: &str) -> Self {
        match language {
            Language::Known(tag) if tag != pivot => Self {
                query_from: Some(Some(tag.clone())),
                reply_language: tag.clone(),
            },
            Language::CodeMixed => Self {
                query_from: Some(None),
                reply_language: code_mixed_reply.to_string(),
            },
            _ => Self {
                query_from: None,
                reply_language: pivot.to_string(),
            },
        }
    }

    pub fn translates_reply(&self, pivot: &str) -> bool {
        self.reply_language != pivot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{RagError, Result};
    use async_trait::async_trait;

    struct BrokenDetector;

    #[async_trait]
    impl LanguageDetector for BrokenDetector {
        async fn detect(&self, _text: &str) -> Result<Option<String>> {
            Err(RagError::provider("detector", "offline"))
        }
    }

    #[test]
    fn test_code_mixed() {
        assert!(is_code_mixed("chapter 2 में क्या है"));
        assert!(!is_code_mixed("What is in chapter 2?"));
        assert!(!is_code_mixed("अध्याय २ में क्या है?"));
    }

    #[tokio::test]
    async fn test_classify() {
        let classifier = LanguageClassifier::default();
        assert_eq!(classifier.classify("What is this?").await, Language::Known("en".into()));
        assert_eq!(classifier.classify("यह क्या है?").await, Language::Known("hi".into()));
        assert_eq!(classifier.classify("yeh book किसके बारे में है").await, Language::CodeMixed);
        assert_eq!(classifier.classify("42").await, Language::Unknown);
    }

    #[tokio::test]
    async fn test_detector_failure_is_unknown() {
        let classifier = LanguageClassifier::new(Arc::new(BrokenDetector));
        assert_eq!(classifier.classify("hello").await, Language::Unknown);
    }

    #[test]
    fn test_translation_plans() {
        let english = TranslationPlan::for_language(&Language::Known("en".into()), "en", "hi");
        assert_eq!(english.query_from, None);
        assert_eq!(english.reply_language, "en");

        let hindi = TranslationPlan::for_language(&Language::Known("hi".into()), "en", "hi");
        assert_eq!(hindi.query_from, Some(Some("hi".to_string())));
        assert!(hindi.translates_reply("en"));

        let mixed = TranslationPlan::for_language(&Language::CodeMixed, "en", "hi");
        assert_eq!(mixed.query_from, Some(None));
        assert_eq!(mixed.reply_language, "hi");

        let unknown = TranslationPlan::for_language(&Language::Unknown, "en", "hi");
        assert_eq!(unknown.query_from, None);
        assert_eq!(unknown.reply_language, "en");
    }
}

//! Offline language detection by Unicode script

use super::LanguageDetector;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Script ranges and the language tag each one implies
const SCRIPTS: &[(u32, u32, &str)] = &[
    (0x0400, 0x04FF, "ru"),
    (0x0600, 0x06FF, "ar"),
    (0x0900, 0x097F, "hi"),
    (0x0980, 0x09FF, "bn"),
    (0x0A00, 0x0A7F, "pa"),
    (0x0A80, 0x0AFF, "gu"),
    (0x0B00, 0x0B7F, "or"),
    (0x0B80, 0x0BFF, "ta"),
    (0x0C00, 0x0C7F, "te"),
    (0x0C80, 0x0CFF, "kn"),
    (0x0D00, 0x0D7F, "ml"),
    (0x3040, 0x30FF, "ja"),
    (0x4E00, 0x9FFF, "zh"),
    (0xAC00, 0xD7AF, "ko"),
];

/// Picks the language whose script covers most letters; Latin counts as English
#[derive(Debug, Clone, Default)]
pub struct ScriptDetector;

impl ScriptDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect_script(&self, text: &str) -> Option<&'static str> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();

        for c in text.chars().filter(|c| c.is_alphabetic() || is_combining_indic(*c)) {
            let tag = if c.is_ascii_alphabetic() {
                Some("en")
            } else {
                let code = c as u32;
                SCRIPTS
                    .iter()
                    .find(|(start, end, _)| (*start..=*end).contains(&code))
                    .map(|(_, _, tag)| *tag)
            };
            if let Some(tag) = tag {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }

        // ties go to the alphabetically first tag so the result is stable
        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(tag, _)| tag)
    }
}

/// Indic vowel signs are marks, not letters, but still identify the script
fn is_combining_indic(c: char) -> bool {
    (0x0900..=0x0D7F).contains(&(c as u32))
}

#[async_trait]
impl LanguageDetector for ScriptDetector {
    async fn detect(&self, text: &str) -> Result<Option<String>> {
        Ok(self.detect_script(text).map(str::to_string))
    }
}

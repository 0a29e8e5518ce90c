//! Azure Speech REST client
//!
//! - Text-to-speech: SSML to `{region}.tts.speech.microsoft.com`, WAV out
//! - Speech-to-text: short-audio recognition at `{region}.stt.speech.microsoft.com`

use super::{error_body, SpeechToText, TextToSpeech};
use crate::config::SpeechConfig;
use crate::errors::{RagError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "speech";
const OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";

#[derive(Debug, Clone)]
pub struct AzureSpeech {
    client: Client,
    region: String,
    key: String,
    voice_en: String,
    voice_other: String,
}

impl AzureSpeech {
    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        let key = config
            .key
            .clone()
            .ok_or_else(|| RagError::Configuration("speech key is not set".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            region: config.region.clone(),
            key,
            voice_en: config.voice_en.clone(),
            voice_other: config.voice_other.clone(),
        })
    }

    /// English gets the English voice, every other language the other one
    pub fn voice_for(&self, language: &str) -> &str {
        if language == "en" {
            &self.voice_en
        } else {
            &self.voice_other
        }
    }
}

/// Speech services want a full locale; Indian locales for the short tags we emit
pub fn locale_for(language: &str) -> String {
    if language.contains('-') {
        language.to_string()
    } else {
        format!("{}-IN", language)
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn ssml(text: &str, locale: &str, voice: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        locale,
        voice,
        escape_xml(text)
    )
}

#[async_trait]
impl TextToSpeech for AzureSpeech {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let url = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        );
        let body = ssml(text, &locale_for(language), self.voice_for(language));

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", "docbuddy")
            .body(body)
            .send()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_body(PROVIDER, response).await);
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechToText for AzureSpeech {
    async fn recognize(&self, audio: &[u8], language: &str) -> Result<String> {
        let url = format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={}",
            self.region,
            locale_for(language)
        );

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "audio/wav; codecs=audio/pcm; samplerate=16000")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_body(PROVIDER, response).await);
        }

        let result: RecognitionResult = response
            .json()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        recognized_text(result)
    }
}

fn recognized_text(result: RecognitionResult) -> Result<String> {
    match (result.status.as_str(), result.display_text) {
        ("Success", Some(text)) => Ok(text),
        (status, _) => Err(RagError::provider(
            PROVIDER,
            format!("recognition failed: {}", status),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(rename = "RecognitionStatus")]
    status: String,
    #[serde(rename = "DisplayText")]
    display_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speech() -> AzureSpeech {
        let config = SpeechConfig {
            enabled: true,
            key: Some("key".to_string()),
            ..Default::default()
        };
        AzureSpeech::from_config(&config).unwrap()
    }

    #[test]
    fn test_voice_selection() {
        let s = speech();
        assert_eq!(s.voice_for("en"), "en-IN-NeerjaNeural");
        assert_eq!(s.voice_for("hi"), "hi-IN-SwaraNeural");
    }

    #[test]
    fn test_locale_for() {
        assert_eq!(locale_for("hi"), "hi-IN");
        assert_eq!(locale_for("en-US"), "en-US");
    }

    #[test]
    fn test_ssml_escapes_text() {
        let doc = ssml("a < b & c", "en-IN", "en-IN-NeerjaNeural");
        assert!(doc.contains("a &lt; b &amp; c"));
        assert!(doc.contains("name='en-IN-NeerjaNeural'"));
    }

    #[test]
    fn test_recognition_result() {
        let ok: RecognitionResult =
            serde_json::from_str(r#"{"RecognitionStatus":"Success","DisplayText":"Hello."}"#).unwrap();
        assert_eq!(recognized_text(ok).unwrap(), "Hello.");

        let none: RecognitionResult =
            serde_json::from_str(r#"{"RecognitionStatus":"NoMatch"}"#).unwrap();
        assert!(recognized_text(none).is_err());
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(AzureSpeech::from_config(&SpeechConfig::default()).is_err());
    }
}

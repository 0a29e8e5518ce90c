//! Azure Translator REST v3 client

use super::{error_body, TranslationProvider};
use crate::config::LanguageConfig;
use crate::errors::{RagError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "translator";
const API_VERSION: &str = "3.0";

#[derive(Debug, Clone)]
pub struct AzureTranslator {
    client: Client,
    endpoint: String,
    key: String,
    region: Option<String>,
}

impl AzureTranslator {
    pub fn new(endpoint: &str, key: &str, region: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            region,
        })
    }

    pub fn from_config(config: &LanguageConfig) -> Result<Self> {
        let key = config
            .translator_key
            .as_deref()
            .ok_or_else(|| RagError::Configuration("translator key is not set".to_string()))?;
        Self::new(
            &config.translator_endpoint,
            key,
            config.translator_region.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, from: Option<&str>, to: &str) -> String {
        let mut url = format!(
            "{}/translate?api-version={}&to={}",
            self.endpoint, API_VERSION, to
        );
        if let Some(from) = from {
            url.push_str("&from=");
            url.push_str(from);
        }
        url
    }
}

#[async_trait]
impl TranslationProvider for AzureTranslator {
    async fn translate(&self, text: &str, from: Option<&str>, to: &str) -> Result<String> {
        let body = [TranslateItem { text }];

        let mut request = self
            .client
            .post(self.url(from, to))
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&body);
        if let Some(region) = &self.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_body(PROVIDER, response).await);
        }

        let results: Vec<TranslateResult> = response
            .json()
            .await
            .map_err(|e| RagError::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        first_translation(results)
    }
}

fn first_translation(results: Vec<TranslateResult>) -> Result<String> {
    results
        .into_iter()
        .next()
        .and_then(|r| r.translations.into_iter().next())
        .map(|t| t.text)
        .ok_or_else(|| RagError::provider(PROVIDER, "empty translation response"))
}

#[derive(Debug, Serialize)]
struct TranslateItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResult {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

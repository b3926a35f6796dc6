//! Google Cloud Translation (v2) connector

use async_trait::async_trait;
use sendcheck_campaign::Translate;
use sendcheck_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{self, HttpConfig};

/// Public Translation API endpoint
pub const DEFAULT_TRANSLATE_BASE_URL: &str = "https://translation.googleapis.com";

const COLLABORATOR: &str = "translation";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

/// [`Translate`] implementation for the Translation v2 REST API
///
/// Templates are sent with `format: html` so markup and the first-name
/// placeholder survive translation.
#[derive(Debug)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleTranslator {
    /// Create a translator from configuration
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = client::build_client(COLLABORATOR, config.timeout_secs)?;
        let endpoint = format!("{}/language/translate/v2", config.trimmed_base());
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl Translate for GoogleTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&TranslateRequest {
                q: text,
                target: target_language,
                format: "html",
            });

        let response = client::send(COLLABORATOR, request).await?;
        let response = client::require_success(COLLABORATOR, response).await?;
        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| Error::collaborator(COLLABORATOR, format!("malformed response: {}", e)))?;

        let translated = parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| Error::collaborator(COLLABORATOR, "response held no translation"))?;

        debug!(target = %target_language, chars = translated.len(), "Translated template");
        Ok(translated)
    }

    fn name(&self) -> &str {
        "google-translate"
    }
}

//! Gemini `generateContent` connector for delegated analysis

use async_trait::async_trait;
use sendcheck_core::{Error, Result};
use sendcheck_policy::Analyze;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{self, HttpConfig};

/// Public Generative Language API endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

const COLLABORATOR: &str = "analysis";

const INSTRUCTION: &str = "You review marketing email text for regulatory compliance. \
Check the email text against the rules below. Answer only with JSON of the form \
{\"compliant\": bool, \"violations\": [{\"rule\": string, \"phrase\": string, \"explanation\": string}]}. \
Use the rule names given. Quote the offending phrase exactly as it appears in the email. \
Report at most one violation per rule and an empty list when the email complies.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Build the single prompt sent to the model
pub fn build_prompt(visible_text: &str, rules_description: &str) -> String {
    format!(
        "{}\n\nRules:\n{}\nEmail text:\n\"\"\"\n{}\n\"\"\"\n",
        INSTRUCTION, rules_description, visible_text
    )
}

/// [`Analyze`] implementation backed by a Gemini model
#[derive(Debug)]
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiAnalyzer {
    /// Create an analyzer for `model`
    pub fn new(config: HttpConfig, model: impl Into<String>) -> Result<Self> {
        let client = client::build_client(COLLABORATOR, config.timeout_secs)?;
        let model = model.into();
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.trimmed_base(),
            model
        );
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model,
        })
    }

    /// Configured model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Analyze for GeminiAnalyzer {
    async fn analyze(&self, visible_text: &str, rules_description: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: build_prompt(visible_text, rules_description),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.0,
            },
        };

        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body);

        let response = client::send(COLLABORATOR, request).await?;
        let response = client::require_success(COLLABORATOR, response).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::collaborator(COLLABORATOR, format!("malformed response: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::collaborator(COLLABORATOR, "model returned no text"));
        }

        debug!(model = %self.model, answer_len = text.len(), "Model analysis received");
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

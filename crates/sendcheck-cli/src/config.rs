//! SendCheck configuration
//!
//! Loaded from YAML, defaulting when the file is absent, with command-line
//! overrides applied last. Secrets never live in the file: each section
//! names the environment variable holding its key.

use anyhow::Context;
use sendcheck_campaign::Language;
use sendcheck_connectors::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_MAILGUN_BASE_URL, DEFAULT_TIMEOUT_SECS,
    DEFAULT_TRANSLATE_BASE_URL,
};
use sendcheck_policy::EvaluatorStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Cli;

/// Subject used when neither config nor command line sets one
pub const DEFAULT_SUBJECT: &str = "Your Mutual Fund Update";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Operator access keys
    pub access: AccessConfig,

    /// Compliance evaluation
    pub evaluator: EvaluatorConfig,

    /// Delivery provider
    pub mailgun: MailgunSection,

    /// Optional translation step
    pub translation: TranslationSection,

    /// Delegated analysis and guideline context
    pub analysis: AnalysisSection,

    /// Campaign defaults
    pub campaign: CampaignSection,

    /// Report output
    pub report: ReportSection,
}

impl AppConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read config file '{}'", config_path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("invalid config file '{}'", config_path))?
        } else {
            Self::default()
        };

        if let Some(rules) = &cli.rules {
            config.evaluator.rules_path = Some(rules.clone());
        }

        if let Some(strategy) = cli.strategy {
            config.evaluator.strategy = strategy;
        }

        Ok(config)
    }
}

/// Where operator access keys come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Environment variable holding a comma-separated key list
    pub keys_env: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            keys_env: "SENDCHECK_ACCESS_KEYS".to_string(),
        }
    }
}

/// Compliance evaluation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Keyword matching or delegated analysis
    pub strategy: EvaluatorStrategy,

    /// YAML rule set; the built-in regulator set when unset
    pub rules_path: Option<String>,
}

/// Mailgun delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailgunSection {
    /// API endpoint
    pub base_url: String,

    /// Sending domain
    pub domain: String,

    /// Fixed sender identity
    pub from: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MailgunSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MAILGUN_BASE_URL.to_string(),
            domain: "evertechcms.in".to_string(),
            from: "Ever CMS <mailgun@evertechcms.in>".to_string(),
            api_key_env: "MAILGUN_API_KEY".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Translation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSection {
    /// Whether non-English sends are translated at all
    pub enabled: bool,

    /// API endpoint
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TranslationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_TRANSLATE_BASE_URL.to_string(),
            api_key_env: "TRANSLATE_API_KEY".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Delegated analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// API endpoint
    pub base_url: String,

    /// Model name
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Regulator guideline page fetched once per run
    pub guidelines_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            guidelines_url: None,
            timeout_secs: 60,
        }
    }
}

/// Campaign defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignSection {
    /// Subject line
    pub subject: String,

    /// Send language
    pub language: Language,

    /// Deliveries in flight
    pub concurrency: usize,
}

impl Default for CampaignSection {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            language: Language::En,
            concurrency: 1,
        }
    }
}

/// Report output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Write the report here when no `--report` flag is given
    pub path: Option<String>,
}

/// Read a secret from the environment variable named `env_name`
pub fn secret(env_name: &str) -> Option<String> {
    std::env::var(env_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! Mailgun delivery
//!
//! One `POST {base}/v3/{domain}/messages` per recipient, authenticated with
//! HTTP basic auth as user `api`.

use async_trait::async_trait;
use sendcheck_campaign::Deliver;
use sendcheck_core::Result;
use tracing::{debug, warn};

use crate::client::{self, excerpt, HttpConfig};

/// Public Mailgun API endpoint
pub const DEFAULT_MAILGUN_BASE_URL: &str = "https://api.mailgun.net";

const COLLABORATOR: &str = "delivery";

/// Mailgun account settings
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// Endpoint and API key
    pub http: HttpConfig,

    /// Sending domain registered with Mailgun
    pub domain: String,

    /// Fixed sender, e.g. `Ever CMS <mailgun@example.com>`
    pub from: String,
}

impl MailgunConfig {
    /// Settings against the public API endpoint
    pub fn new(
        api_key: impl Into<String>,
        domain: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            http: HttpConfig::new(DEFAULT_MAILGUN_BASE_URL, api_key),
            domain: domain.into(),
            from: from.into(),
        }
    }

    /// Point at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http.base_url = base_url.into();
        self
    }
}

/// [`Deliver`] implementation backed by the Mailgun messages API
#[derive(Debug)]
pub struct MailgunDeliverer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl MailgunDeliverer {
    /// Create a deliverer from configuration
    pub fn new(config: MailgunConfig) -> Result<Self> {
        let client = client::build_client(COLLABORATOR, config.http.timeout_secs)?;
        let endpoint = format!("{}/v3/{}/messages", config.http.trimmed_base(), config.domain);
        Ok(Self {
            client,
            endpoint,
            api_key: config.http.api_key,
            from: config.from,
        })
    }

    /// Messages endpoint this deliverer posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Deliver for MailgunDeliverer {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<bool> {
        let form = [
            ("from", self.from.as_str()),
            ("to", to),
            ("subject", subject),
            ("html", body),
        ];
        let request = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form);

        let response = client::send(COLLABORATOR, request).await?;
        let status = response.status();
        if status.is_success() {
            debug!(to = %to, status = %status, "Mailgun accepted message");
            return Ok(true);
        }

        let detail = response.text().await.unwrap_or_default();
        warn!(to = %to, status = %status, detail = %excerpt(&detail), "Mailgun refused message");
        Ok(false)
    }

    fn name(&self) -> &str {
        "mailgun"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_built_from_domain() {
        let config = MailgunConfig::new("key", "mg.example.com", "Ops <ops@example.com>")
            .with_base_url("https://api.eu.mailgun.net/");
        let deliverer = MailgunDeliverer::new(config).unwrap();
        assert_eq!(
            deliverer.endpoint(),
            "https://api.eu.mailgun.net/v3/mg.example.com/messages"
        );
    }
}

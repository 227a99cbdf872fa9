//! Webhook delivery of filtered report rows.

use crate::config::WebhookConfig;
use crate::error::{Error, Result};
use crate::report::ReportRow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

/// The JSON body posted to the webhook.
#[derive(Debug, Serialize)]
pub struct ReportPayload<'a> {
    /// When the payload was assembled.
    pub timestamp: DateTime<Utc>,
    /// Number of forwarded rows.
    pub total_reports: usize,
    /// The forwarded rows.
    pub reports: &'a [ReportRow],
}

/// HTTP client posting report payloads to the configured webhook.
///
/// Create using [`WebhookClient::new`]. Delivery succeeds on exactly
/// HTTP 200; any other status is reported as failure without retry.
#[derive(Debug)]
pub struct WebhookClient {
    http: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookClient {
    /// Creates a client from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// Posts the rows as a [`ReportPayload`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebhookRequest`] if the request never completes and
    /// [`Error::WebhookStatus`] for any response other than HTTP 200.
    #[instrument(
        name = "WebhookClient::send",
        skip(self, rows),
        fields(url = %self.config.url, rows = rows.len())
    )]
    pub async fn send(&self, rows: &[ReportRow]) -> Result<()> {
        let payload = ReportPayload {
            timestamp: Utc::now(),
            total_reports: rows.len(),
            reports: rows,
        };

        let response = self
            .http
            .post(&self.config.url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| Error::WebhookRequest {
                url: self.config.url.clone(),
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            debug!("Webhook accepted payload");
            Ok(())
        } else {
            Err(Error::WebhookStatus { status })
        }
    }

    /// Returns the configured webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

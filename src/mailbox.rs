//! Mailbox polling over the hosted messages API.
//!
//! The [`MailboxClient`] is the passcode source for the login flow. It
//! provides async methods to:
//!
//! - Fetch the most recent messages for the configured mailbox
//! - Wait for a message yielding a passcode
//! - Dump a snapshot of candidate messages (with extracted codes) to disk
//!
//! # Example
//!
//! ```no_run
//! use report_relay::{MailboxConfig, MailboxClient};
//! use report_relay::matcher::CodeMatcher;
//!
//! # async fn example() -> report_relay::Result<()> {
//! let config = MailboxConfig::builder()
//!     .tenant_id("tenant-guid")
//!     .client_id("client-guid")
//!     .client_secret("secret-value")
//!     .mailbox("ops@example.com")
//!     .sender("noreply@vendor.example")
//!     .subject("Login security code")
//!     .build()?;
//!
//! let client = MailboxClient::connect(config).await?;
//! let code = client.wait_for_code(&CodeMatcher::vendor_default()).await?;
//! println!("Got passcode: {}", code);
//! # Ok(())
//! # }
//! ```

use crate::auth;
use crate::config::MailboxConfig;
use crate::error::{Error, Result};
use crate::matcher::Matcher;
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// A message fetched from the mailbox API.
///
/// Only the fields the passcode flow reads are retained; everything else the
/// API returns is dropped at the wire boundary.
#[derive(Debug, Clone)]
pub struct Message {
    /// When the message was received.
    pub received: DateTime<Utc>,
    /// The message subject.
    pub subject: String,
    /// Plain-text preview of the message body.
    pub body_preview: String,
    /// The sender's address.
    pub sender: String,
}

/// A passcode together with the message it was extracted from.
#[derive(Debug, Clone)]
pub struct LatestCode {
    /// The extracted passcode.
    pub code: String,
    /// The sender of the message the code came from.
    pub sender: String,
    /// When that message was received.
    pub received: DateTime<Utc>,
}

/// One element of the snapshot file written by [`MailboxClient::snapshot`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// When the message was received.
    pub received_date_time: DateTime<Utc>,
    /// The message subject.
    pub subject: String,
    /// Plain-text preview of the message body.
    pub body_preview: String,
    /// The sender's address.
    pub sender_email: String,
    /// The code extracted from the body preview, if any.
    pub otp_code: Option<String>,
}

/// Keeps only messages whose sender is on the allow-list (case-insensitive)
/// and whose subject equals `subject` exactly.
#[must_use]
pub fn filter_candidates<'m>(
    messages: &'m [Message],
    senders: &[EmailAddress],
    subject: &str,
) -> Vec<&'m Message> {
    messages
        .iter()
        .filter(|message| {
            senders
                .iter()
                .any(|allowed| allowed.as_str().eq_ignore_ascii_case(&message.sender))
                && message.subject == subject
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    #[serde(default)]
    value: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(default)]
    received_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body_preview: String,
    #[serde(default)]
    from: Option<WireRecipient>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecipient {
    #[serde(default)]
    email_address: WireEmailAddress,
}

#[derive(Debug, Default, Deserialize)]
struct WireEmailAddress {
    #[serde(default)]
    address: String,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self {
            received: wire.received_date_time.unwrap_or(DateTime::<Utc>::MIN_UTC),
            subject: wire.subject,
            body_preview: wire.body_preview,
            sender: wire
                .from
                .map(|f| f.email_address.address)
                .unwrap_or_default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Async client for polling the mailbox and extracting passcodes.
///
/// Create using [`MailboxClient::connect`], which acquires the access token.
pub struct MailboxClient {
    http: reqwest::Client,
    token: SecretString,
    config: MailboxConfig,
}

impl MailboxClient {
    /// Acquires an access token and prepares the client for polling.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the
    /// client-credentials grant is rejected.
    #[instrument(
        name = "MailboxClient::connect",
        skip_all,
        fields(mailbox = %config.mailbox(), tenant_id = %config.tenant_id)
    )]
    pub async fn connect(config: MailboxConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let token = auth::acquire_token(&http, &config).await?;

        debug!("Mailbox client ready");

        Ok(Self {
            http,
            token,
            config,
        })
    }

    /// Fetches the most recent messages, newest first.
    ///
    /// Sends the configured `$top` along with `$orderby` and `$expand`, and
    /// deserializes only the fields the passcode flow reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API answers with a
    /// non-success status.
    #[instrument(
        name = "MailboxClient::fetch_recent",
        skip(self),
        fields(mailbox = %self.config.mailbox(), top = self.config.fetch_count)
    )]
    pub async fn fetch_recent(&self) -> Result<Vec<Message>> {
        let endpoint = self.config.messages_endpoint();
        let query = [
            ("$orderby", "receivedDateTime desc".to_string()),
            ("$top", self.config.fetch_count.to_string()),
            ("$expand", "attachments".to_string()),
        ];

        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(self.token.expose_secret())
            .query(&query)
            .send()
            .await
            .map_err(|source| Error::MessageFetch {
                mailbox: self.config.mailbox().to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApiStatus {
                mailbox: self.config.mailbox().to_string(),
                status,
            });
        }

        let envelope: MessageEnvelope =
            response
                .json()
                .await
                .map_err(|source| Error::MessageFetch {
                    mailbox: self.config.mailbox().to_string(),
                    source,
                })?;

        let messages: Vec<Message> = envelope.value.into_iter().map(Message::from).collect();

        debug!(count = messages.len(), "Fetched messages");

        Ok(messages)
    }

    /// Filters fetched messages to passcode candidates, newest first.
    #[must_use]
    pub fn candidate_messages(&self, messages: &[Message]) -> Vec<Message> {
        let mut candidates: Vec<Message> = filter_candidates(
            messages,
            self.config.allowed_senders(),
            &self.config.subject,
        )
        .into_iter()
        .cloned()
        .collect();

        candidates.sort_by(|a, b| b.received.cmp(&a.received));
        candidates
    }

    /// Extracts the passcode from the newest candidate message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCode`] if no candidate message exists or the newest
    /// one yields no match.
    #[instrument(
        name = "MailboxClient::latest_code",
        skip(self, matcher),
        fields(matcher = %matcher.description())
    )]
    pub async fn latest_code(&self, matcher: &dyn Matcher) -> Result<LatestCode> {
        let messages = self.fetch_recent().await?;
        let candidates = self.candidate_messages(&messages);

        debug!(
            fetched = messages.len(),
            candidates = candidates.len(),
            "Filtered candidate messages"
        );

        extract_newest(&candidates, matcher).ok_or(Error::NoCode)
    }

    /// Waits for a passcode email, polling at the configured interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CodeTimeout`] if the configured deadline elapses
    /// without a code, or any fetch error encountered while polling.
    #[instrument(
        name = "MailboxClient::wait_for_code",
        skip(self, matcher),
        fields(matcher = %matcher.description())
    )]
    pub async fn wait_for_code(&self, matcher: &dyn Matcher) -> Result<String> {
        let timeout = self.config.polling.max_wait;
        let poll_interval = self.config.polling.interval;
        let deadline = Instant::now() + timeout;

        loop {
            if Instant::now() > deadline {
                return Err(Error::CodeTimeout { timeout });
            }

            match self.latest_code(matcher).await {
                Ok(hit) => return Ok(hit.code),
                Err(Error::NoCode) => {
                    debug!("No passcode yet, polling again");
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Fetches, filters, extracts per-message codes, and writes the JSON
    /// snapshot array to `path`.
    ///
    /// Returns the records written, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching fails or the snapshot cannot be written.
    #[instrument(
        name = "MailboxClient::snapshot",
        skip(self, matcher),
        fields(path = %path.display())
    )]
    pub async fn snapshot(&self, matcher: &dyn Matcher, path: &Path) -> Result<Vec<MessageRecord>> {
        let messages = self.fetch_recent().await?;
        let candidates = self.candidate_messages(&messages);

        let records: Vec<MessageRecord> = candidates
            .iter()
            .map(|message| {
                let otp_code = matcher
                    .find_match(&message.body_preview)
                    .map(|code| code.into_owned());
                if otp_code.is_none() {
                    warn!(
                        received = %message.received,
                        "Candidate message yields no code"
                    );
                }
                MessageRecord {
                    received_date_time: message.received,
                    subject: message.subject.clone(),
                    body_preview: message.body_preview.clone(),
                    sender_email: message.sender.clone(),
                    otp_code,
                }
            })
            .collect();

        let json = serde_json::to_vec_pretty(&records).map_err(|e| Error::SnapshotWrite {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        tokio::fs::write(path, json)
            .await
            .map_err(|source| Error::SnapshotWrite {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(records = records.len(), "Snapshot written");

        Ok(records)
    }

    /// Returns the polled mailbox address.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.config.mailbox()
    }
}

impl std::fmt::Debug for MailboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxClient")
            .field("mailbox", &self.config.mailbox())
            .field("fetch_count", &self.config.fetch_count)
            .finish_non_exhaustive()
    }
}

/// Extracts a code from the newest candidate (the slice must be sorted
/// newest first). Only the newest candidate is consulted - at most one code
/// is selected per run.
fn extract_newest(candidates: &[Message], matcher: &dyn Matcher) -> Option<LatestCode> {
    let newest = candidates.first()?;

    matcher
        .find_match(&newest.body_preview)
        .map(|code| LatestCode {
            code: code.into_owned(),
            sender: newest.sender.clone(),
            received: newest.received,
        })
}

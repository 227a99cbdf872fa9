//! Configuration for the mailbox poller, portal driver, and report relay.
//!
//! Each stage has its own config struct created through a builder with
//! sensible defaults:
//!
//! ```
//! use report_relay::MailboxConfig;
//!
//! let config = MailboxConfig::builder()
//!     .tenant_id("tenant-guid")
//!     .client_id("client-guid")
//!     .client_secret("secret-value")
//!     .mailbox("ops@example.com")
//!     .sender("noreply@vendor.example")
//!     .subject("Login security code")
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;

/// Default identity provider authority.
const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Default Graph API base URL.
const DEFAULT_GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Validates an email address format.
fn validate_email(email: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(email, email_address::Options::default()).map_err(|_| {
        Error::InvalidEmailFormat {
            email: email.to_string(),
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Mailbox
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for polling the hosted mailbox API.
///
/// Create using [`MailboxConfig::builder()`].
///
/// Note: the `client_secret` field is stored as a [`SecretString`] to prevent
/// accidental logging of credentials. The `mailbox` and sender addresses are
/// stored as validated [`EmailAddress`] values.
#[derive(Clone)]
pub struct MailboxConfig {
    /// Identity provider authority base URL.
    pub authority: String,
    /// Directory (tenant) identifier used in the token endpoint path.
    pub tenant_id: String,
    /// OAuth2 application (client) identifier.
    pub client_id: String,
    /// OAuth2 client secret (protected from accidental logging).
    client_secret: SecretString,
    /// Graph API base URL.
    pub graph_base: String,
    /// Mailbox whose messages are polled.
    mailbox: EmailAddress,
    /// Senders whose messages count as passcode candidates.
    allowed_senders: Vec<EmailAddress>,
    /// Exact subject a candidate message must carry.
    pub subject: String,
    /// How many of the most recent messages to fetch per poll.
    pub fetch_count: u32,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Polling configuration for waiting operations.
    pub polling: PollingConfig,
}

impl std::fmt::Debug for MailboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxConfig")
            .field("authority", &self.authority)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("graph_base", &self.graph_base)
            .field("mailbox", &self.mailbox.as_str())
            .field("allowed_senders", &self.allowed_senders)
            .field("subject", &self.subject)
            .field("fetch_count", &self.fetch_count)
            .field("http_timeout", &self.http_timeout)
            .field("polling", &self.polling)
            .finish()
    }
}

impl MailboxConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MailboxConfigBuilder {
        MailboxConfigBuilder::default()
    }

    /// Returns the polled mailbox address as a string slice.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.mailbox.as_str()
    }

    /// Returns the validated sender allow-list.
    #[must_use]
    pub fn allowed_senders(&self) -> &[EmailAddress] {
        &self.allowed_senders
    }

    /// Returns the client secret as a string slice.
    ///
    /// The secret is intentionally not directly accessible to prevent
    /// accidental logging.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }

    /// Returns the OAuth2 token endpoint for this tenant.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// Returns the messages resource endpoint for the polled mailbox.
    #[must_use]
    pub fn messages_endpoint(&self) -> String {
        format!(
            "{}/users/{}/messages",
            self.graph_base.trim_end_matches('/'),
            self.mailbox
        )
    }
}

/// Builder for [`MailboxConfig`].
#[derive(Debug, Default)]
pub struct MailboxConfigBuilder {
    authority: Option<String>,
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    graph_base: Option<String>,
    mailbox: Option<String>,
    senders: Vec<String>,
    subject: Option<String>,
    fetch_count: Option<u32>,
    http_timeout: Option<Duration>,
    polling: Option<PollingConfig>,
}

impl MailboxConfigBuilder {
    /// Sets the identity provider authority base URL.
    ///
    /// Default is `https://login.microsoftonline.com`.
    #[must_use]
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Sets the directory (tenant) identifier (required).
    #[must_use]
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the application (client) identifier (required).
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the client secret (required).
    #[must_use]
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Sets the Graph API base URL.
    ///
    /// Default is `https://graph.microsoft.com/v1.0`.
    #[must_use]
    pub fn graph_base(mut self, graph_base: impl Into<String>) -> Self {
        self.graph_base = Some(graph_base.into());
        self
    }

    /// Sets the mailbox to poll (required).
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = Some(mailbox.into());
        self
    }

    /// Adds a sender to the allow-list (at least one is required).
    #[must_use]
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.senders.push(sender.into());
        self
    }

    /// Adds several senders to the allow-list.
    #[must_use]
    pub fn senders<I, S>(mut self, senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.senders.extend(senders.into_iter().map(Into::into));
        self
    }

    /// Sets the exact subject a candidate message must carry (required).
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets how many of the most recent messages to fetch per poll.
    ///
    /// Default is 20.
    #[must_use]
    pub fn fetch_count(mut self, fetch_count: u32) -> Self {
        self.fetch_count = Some(fetch_count);
        self
    }

    /// Sets the per-request HTTP timeout.
    #[must_use]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets polling configuration.
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = Some(polling);
        self
    }

    /// Sets the polling interval for wait operations.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .interval = interval;
        self
    }

    /// Sets the maximum wait time for a passcode email.
    #[must_use]
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .max_wait = max_wait;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or invalid.
    pub fn build(self) -> Result<MailboxConfig> {
        let tenant_id = self.tenant_id.ok_or_else(|| Error::InvalidConfig {
            message: "tenant_id is required".into(),
        })?;
        let client_id = self.client_id.ok_or_else(|| Error::InvalidConfig {
            message: "client_id is required".into(),
        })?;
        let client_secret = self.client_secret.ok_or_else(|| Error::InvalidConfig {
            message: "client_secret is required".into(),
        })?;
        let mailbox_raw = self.mailbox.ok_or_else(|| Error::InvalidConfig {
            message: "mailbox is required".into(),
        })?;
        let mailbox = validate_email(&mailbox_raw)?;

        if self.senders.is_empty() {
            return Err(Error::InvalidConfig {
                message: "at least one allowed sender is required".into(),
            });
        }
        let allowed_senders = self
            .senders
            .iter()
            .map(|s| validate_email(s))
            .collect::<Result<Vec<_>>>()?;

        let subject = self.subject.ok_or_else(|| Error::InvalidConfig {
            message: "subject is required".into(),
        })?;
        if subject.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "subject must not be empty".into(),
            });
        }

        let fetch_count = self.fetch_count.unwrap_or(20);
        if fetch_count == 0 {
            return Err(Error::InvalidConfig {
                message: "fetch_count must be at least 1".into(),
            });
        }

        Ok(MailboxConfig {
            authority: self
                .authority
                .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string()),
            tenant_id,
            client_id,
            client_secret: SecretString::from(client_secret),
            graph_base: self
                .graph_base
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE.to_string()),
            mailbox,
            allowed_senders,
            subject,
            fetch_count,
            http_timeout: self.http_timeout.unwrap_or(Duration::from_secs(30)),
            polling: self.polling.unwrap_or_default(),
        })
    }
}

/// Polling configuration for wait operations.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Interval between polling attempts when waiting for a passcode email.
    pub interval: Duration,
    /// Maximum time to wait for a passcode email.
    pub max_wait: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(120),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Portal
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for driving the vendor portal through WebDriver.
///
/// Create using [`PortalConfig::builder()`].
#[derive(Clone)]
pub struct PortalConfig {
    /// Login page URL.
    pub login_url: String,
    /// Report dashboard URL navigated to after login.
    pub report_url: String,
    /// Portal account email.
    email: EmailAddress,
    /// Portal account password (protected from accidental logging).
    password: SecretString,
    /// WebDriver server URL.
    pub webdriver_url: String,
    /// Folder the browser saves exported files into.
    pub download_dir: PathBuf,
    /// Run the browser headless. The portal's export flow was written against
    /// a headful session, so this defaults to `false`.
    pub headless: bool,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
    /// Fixed delays pacing the UI sequence.
    pub delays: DelayConfig,
}

impl std::fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalConfig")
            .field("login_url", &self.login_url)
            .field("report_url", &self.report_url)
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .field("webdriver_url", &self.webdriver_url)
            .field("download_dir", &self.download_dir)
            .field("headless", &self.headless)
            .field("timeouts", &self.timeouts)
            .field("delays", &self.delays)
            .finish()
    }
}

impl PortalConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> PortalConfigBuilder {
        PortalConfigBuilder::default()
    }

    /// Returns the portal account email as a string slice.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the portal account password as a string slice.
    ///
    /// The password is intentionally not directly accessible to prevent
    /// accidental logging.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Builder for [`PortalConfig`].
#[derive(Debug, Default)]
pub struct PortalConfigBuilder {
    login_url: Option<String>,
    report_url: Option<String>,
    email: Option<String>,
    password: Option<String>,
    webdriver_url: Option<String>,
    download_dir: Option<PathBuf>,
    headless: bool,
    timeouts: Option<TimeoutConfig>,
    delays: Option<DelayConfig>,
}

impl PortalConfigBuilder {
    /// Sets the login page URL (required).
    #[must_use]
    pub fn login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    /// Sets the report dashboard URL (required).
    #[must_use]
    pub fn report_url(mut self, url: impl Into<String>) -> Self {
        self.report_url = Some(url.into());
        self
    }

    /// Sets the portal account email (required).
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the portal account password (required).
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the WebDriver server URL.
    ///
    /// Default is `http://localhost:9515` (chromedriver's default).
    #[must_use]
    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = Some(url.into());
        self
    }

    /// Sets the folder exported files are saved into.
    ///
    /// Default is `reports`.
    #[must_use]
    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Runs the browser headless.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets delay configuration.
    #[must_use]
    pub fn delays(mut self, delays: DelayConfig) -> Self {
        self.delays = Some(delays);
        self
    }

    /// Sets the delay between requesting the passcode email and reading the
    /// mailbox.
    #[must_use]
    pub fn email_arrival_delay(mut self, delay: Duration) -> Self {
        self.delays
            .get_or_insert_with(DelayConfig::default)
            .email_arrival = delay;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or invalid.
    pub fn build(self) -> Result<PortalConfig> {
        let login_url = self.login_url.ok_or_else(|| Error::InvalidConfig {
            message: "login_url is required".into(),
        })?;
        let report_url = self.report_url.ok_or_else(|| Error::InvalidConfig {
            message: "report_url is required".into(),
        })?;
        let email_raw = self.email.ok_or_else(|| Error::InvalidConfig {
            message: "email is required".into(),
        })?;
        let email = validate_email(&email_raw)?;
        let password = self.password.ok_or_else(|| Error::InvalidConfig {
            message: "password is required".into(),
        })?;

        Ok(PortalConfig {
            login_url,
            report_url,
            email,
            password: SecretString::from(password),
            webdriver_url: self
                .webdriver_url
                .unwrap_or_else(|| "http://localhost:9515".to_string()),
            download_dir: self.download_dir.unwrap_or_else(|| PathBuf::from("reports")),
            headless: self.headless,
            timeouts: self.timeouts.unwrap_or_default(),
            delays: self.delays.unwrap_or_default(),
        })
    }
}

/// Timeout configuration for portal interactions.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for resolving a required element (passcode prompt, passcode
    /// inputs, export control).
    pub element: Duration,
    /// Per-candidate timeout when probing the date picker selector list.
    pub picker_probe: Duration,
    /// Per-candidate timeout when probing the confirm button selector list.
    pub confirm_probe: Duration,
    /// Timeout for the exported file to appear in the download folder.
    pub download: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            element: Duration::from_secs(10),
            picker_probe: Duration::from_secs(5),
            confirm_probe: Duration::from_secs(3),
            download: Duration::from_secs(60),
        }
    }
}

/// Fixed delays pacing the portal UI sequence.
///
/// The portal renders asynchronously with no reliable readiness signals, so
/// the sequence is paced by fixed sleeps. Values mirror what the vendor UI
/// tolerates.
#[derive(Debug, Clone)]
pub struct DelayConfig {
    /// Wait between requesting the passcode email and reading the mailbox.
    pub email_arrival: Duration,
    /// Pause between typing individual passcode digits.
    pub keystroke: Duration,
    /// Wait for login processing after the passcode is submitted.
    pub post_login: Duration,
    /// Wait after navigating to the report page.
    pub page_settle: Duration,
    /// Wait before interacting with the report page controls.
    pub pre_interaction: Duration,
    /// Wait for the date picker panel to open after clicking it.
    pub picker_open: Duration,
    /// Pause between filling the date inputs and confirming.
    pub pre_confirm: Duration,
    /// Wait for the dashboard to reload after the range is confirmed.
    pub data_load: Duration,
    /// Grace period before the browser is closed at the end of a run.
    pub post_export: Duration,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            email_arrival: Duration::from_secs(30),
            keystroke: Duration::from_millis(100),
            post_login: Duration::from_secs(30),
            page_settle: Duration::from_secs(15),
            pre_interaction: Duration::from_secs(30),
            picker_open: Duration::from_secs(3),
            pre_confirm: Duration::from_secs(2),
            data_load: Duration::from_secs(5),
            post_export: Duration::from_secs(5),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook / relay
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for webhook delivery.
///
/// Create using [`WebhookConfig::builder()`].
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Webhook endpoint URL.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl WebhookConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> WebhookConfigBuilder {
        WebhookConfigBuilder::default()
    }
}

/// Builder for [`WebhookConfig`].
#[derive(Debug, Default)]
pub struct WebhookConfigBuilder {
    url: Option<String>,
    timeout: Option<Duration>,
}

impl WebhookConfigBuilder {
    /// Sets the webhook endpoint URL (required).
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    ///
    /// Default is 30 seconds.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is missing or empty.
    pub fn build(self) -> Result<WebhookConfig> {
        let url = self.url.ok_or_else(|| Error::InvalidConfig {
            message: "webhook url is required".into(),
        })?;
        if url.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "webhook url must not be empty".into(),
            });
        }

        Ok(WebhookConfig {
            url,
            timeout: self.timeout.unwrap_or(Duration::from_secs(30)),
        })
    }
}

/// Configuration for the report relay stage.
///
/// Create using [`RelayConfig::builder()`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Folder searched for exported report files.
    pub folder: PathBuf,
    /// File extension (without dot) a report file must carry.
    pub extension: String,
    /// Column holding the row timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub date_column: String,
    /// Webhook delivery configuration.
    pub webhook: WebhookConfig,
}

impl RelayConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }
}

/// Builder for [`RelayConfig`].
#[derive(Debug, Default)]
pub struct RelayConfigBuilder {
    folder: Option<PathBuf>,
    extension: Option<String>,
    date_column: Option<String>,
    webhook: Option<WebhookConfig>,
}

impl RelayConfigBuilder {
    /// Sets the folder searched for report files.
    ///
    /// Default is `reports`.
    #[must_use]
    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Sets the report file extension (without dot).
    ///
    /// Default is `csv`.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Sets the timestamp column name.
    ///
    /// Default is `Date & Time`.
    #[must_use]
    pub fn date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }

    /// Sets the webhook delivery configuration (required).
    #[must_use]
    pub fn webhook(mut self, webhook: WebhookConfig) -> Self {
        self.webhook = Some(webhook);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook configuration is missing.
    pub fn build(self) -> Result<RelayConfig> {
        let webhook = self.webhook.ok_or_else(|| Error::InvalidConfig {
            message: "webhook configuration is required".into(),
        })?;

        Ok(RelayConfig {
            folder: self.folder.unwrap_or_else(|| PathBuf::from("reports")),
            extension: self.extension.unwrap_or_else(|| "csv".to_string()),
            date_column: self
                .date_column
                .unwrap_or_else(|| "Date & Time".to_string()),
            webhook,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox_builder() -> MailboxConfigBuilder {
        MailboxConfig::builder()
            .tenant_id("tenant")
            .client_id("client")
            .client_secret("secret")
            .mailbox("ops@example.com")
            .sender("noreply@vendor.example")
            .subject("Login security code")
    }

    #[test]
    fn test_mailbox_builder_minimal() {
        let config = mailbox_builder().build().unwrap();

        assert_eq!(config.mailbox(), "ops@example.com");
        assert_eq!(config.client_secret(), "secret");
        assert_eq!(config.fetch_count, 20);
        assert_eq!(config.allowed_senders().len(), 1);
        assert_eq!(
            config.token_endpoint(),
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );
        assert_eq!(
            config.messages_endpoint(),
            "https://graph.microsoft.com/v1.0/users/ops@example.com/messages"
        );
    }

    #[test]
    fn test_mailbox_builder_full() {
        let config = mailbox_builder()
            .authority("https://login.example.net/")
            .graph_base("https://graph.example.net/beta/")
            .senders(["second@vendor.example", "third@vendor.example"])
            .fetch_count(50)
            .poll_interval(Duration::from_secs(2))
            .max_wait(Duration::from_secs(60))
            .build()
            .unwrap();

        assert_eq!(config.allowed_senders().len(), 3);
        assert_eq!(config.fetch_count, 50);
        assert_eq!(config.polling.interval, Duration::from_secs(2));
        assert_eq!(config.polling.max_wait, Duration::from_secs(60));
        assert_eq!(
            config.token_endpoint(),
            "https://login.example.net/tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_mailbox_builder_missing_tenant() {
        let result = MailboxConfig::builder()
            .client_id("client")
            .client_secret("secret")
            .mailbox("ops@example.com")
            .sender("noreply@vendor.example")
            .subject("Login security code")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_mailbox_builder_invalid_mailbox() {
        let result = mailbox_builder().mailbox("not-an-email").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_mailbox_builder_invalid_sender() {
        let result = mailbox_builder().sender("not-an-email").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_mailbox_builder_no_senders() {
        let result = MailboxConfig::builder()
            .tenant_id("tenant")
            .client_id("client")
            .client_secret("secret")
            .mailbox("ops@example.com")
            .subject("Login security code")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_mailbox_builder_zero_fetch_count() {
        let result = mailbox_builder().fetch_count(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_mailbox_secret_not_in_debug() {
        let config = mailbox_builder()
            .client_secret("super-secret-value")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret-value"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    fn portal_builder() -> PortalConfigBuilder {
        PortalConfig::builder()
            .login_url("https://portal.example.com/")
            .report_url("https://portal.example.com/reporting/call")
            .email("ops@example.com")
            .password("hunter2")
    }

    #[test]
    fn test_portal_builder_minimal() {
        let config = portal_builder().build().unwrap();

        assert_eq!(config.email(), "ops@example.com");
        assert_eq!(config.password(), "hunter2");
        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert_eq!(config.download_dir, PathBuf::from("reports"));
        assert!(!config.headless);
        assert_eq!(config.delays.email_arrival, Duration::from_secs(30));
        assert_eq!(config.delays.page_settle, Duration::from_secs(15));
    }

    #[test]
    fn test_portal_builder_overrides() {
        let config = portal_builder()
            .webdriver_url("http://localhost:4444")
            .download_dir("/tmp/exports")
            .headless(true)
            .email_arrival_delay(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/exports"));
        assert!(config.headless);
        assert_eq!(config.delays.email_arrival, Duration::from_secs(5));
        // Untouched delays keep their defaults
        assert_eq!(config.delays.post_login, Duration::from_secs(30));
    }

    #[test]
    fn test_portal_builder_missing_password() {
        let result = PortalConfig::builder()
            .login_url("https://portal.example.com/")
            .report_url("https://portal.example.com/reporting/call")
            .email("ops@example.com")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_portal_password_not_in_debug() {
        let config = portal_builder().password("super-secret-password").build().unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret-password"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_webhook_builder() {
        let config = WebhookConfig::builder()
            .url("https://hooks.example.com/report")
            .build()
            .unwrap();

        assert_eq!(config.url, "https://hooks.example.com/report");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_webhook_builder_empty_url() {
        let result = WebhookConfig::builder().url("  ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_relay_builder_defaults() {
        let webhook = WebhookConfig::builder()
            .url("https://hooks.example.com/report")
            .build()
            .unwrap();
        let config = RelayConfig::builder().webhook(webhook).build().unwrap();

        assert_eq!(config.folder, PathBuf::from("reports"));
        assert_eq!(config.extension, "csv");
        assert_eq!(config.date_column, "Date & Time");
    }

    #[test]
    fn test_relay_builder_missing_webhook() {
        let result = RelayConfig::builder().build();
        assert!(result.is_err());
    }
}

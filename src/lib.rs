//! # report-relay
//!
//! Automated portal login with email OTP retrieval and report relay to a webhook.
//!
//! This crate automates one vendor workflow end to end:
//!
//! - Poll a hosted mailbox API (OAuth2 client-credentials) for the vendor's
//!   passcode emails and extract the 6-digit code by prioritized pattern
//!   matching
//! - Drive the vendor portal through a WebDriver session: credential login,
//!   passcode entry, date-range selection, report export
//! - Relay the exported report: latest CSV, latest-day rows only, posted as
//!   JSON to a webhook
//!
//! ## Features
//!
//! - **`observability`**: Enables OpenTelemetry integration for distributed tracing.
//!   Without this feature, tracing spans are still emitted but require no OTEL dependencies.
//! - **`integration-tests`**: Enables tests that require live credentials and
//!   a running WebDriver server.
//!
//! ## Quick Start
//!
//! ```no_run
//! use report_relay::{MailboxConfig, MailboxClient};
//! use report_relay::matcher::CodeMatcher;
//!
//! # async fn example() -> report_relay::Result<()> {
//! // Configure the mailbox poller
//! let config = MailboxConfig::builder()
//!     .tenant_id("tenant-guid")
//!     .client_id("client-guid")
//!     .client_secret("secret-value")
//!     .mailbox("ops@example.com")
//!     .sender("noreply@vendor.example")
//!     .subject("Login security code")
//!     .build()?;
//!
//! // Acquire a token and wait for a passcode email
//! let client = MailboxClient::connect(config).await?;
//! let code = client.wait_for_code(&CodeMatcher::vendor_default()).await?;
//! println!("Got passcode: {}", code);
//! # Ok(())
//! # }
//! ```
//!
//! ## Full Run
//!
//! ```no_run
//! use report_relay::{
//!     MailboxConfig, PortalAutomation, PortalConfig, RelayConfig, WebhookConfig,
//! };
//!
//! # async fn example() -> report_relay::Result<()> {
//! # let mailbox = MailboxConfig::builder()
//! #     .tenant_id("t").client_id("c").client_secret("s")
//! #     .mailbox("ops@example.com").sender("noreply@vendor.example")
//! #     .subject("Login security code").build()?;
//! # let portal = PortalConfig::builder()
//! #     .login_url("https://portal.example.com/")
//! #     .report_url("https://portal.example.com/reporting/call")
//! #     .email("ops@example.com").password("secret").build()?;
//! # let relay = RelayConfig::builder()
//! #     .webhook(WebhookConfig::builder().url("https://hooks.example.com/report").build()?)
//! #     .build()?;
//! let automation = PortalAutomation::new(mailbox, portal, relay);
//! let summary = automation.run().await?;
//! println!(
//!     "Exported {} and relayed {} rows",
//!     summary.export_path.display(),
//!     summary.relay.rows_sent
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Pattern Matching
//!
//! ```
//! use report_relay::matcher::{CodeMatcher, RegexMatcher, Matcher};
//!
//! // The default matcher prefers labeled phrases over bare digit runs
//! let matcher = CodeMatcher::vendor_default();
//! let text = "Ref 222222. Your security code: 111111";
//! assert_eq!(matcher.find_match(text).as_deref(), Some("111111"));
//!
//! // Or bring your own pattern
//! let custom = RegexMatcher::new(r"PIN:\s*(\d{4})").unwrap();
//! assert_eq!(custom.find_match("PIN: 1234").as_deref(), Some("1234"));
//! ```
//!
//! ## Error Handling
//!
//! All errors implement `std::error::Error` and provide context. No component
//! retries on its own; use [`Error::is_retryable`] to decide whether a failed
//! run is worth re-running:
//!
//! ```
//! use report_relay::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.is_retryable() {
//!         println!("Transient error, can re-run: {}", error);
//!     } else {
//!         println!("Permanent error: {}", error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All major operations emit spans with
//! structured fields suitable for distributed tracing.
//!
//! ### Span Naming Convention
//!
//! - `MailboxClient::connect` - Token acquisition
//! - `MailboxClient::fetch_recent` - Message fetch
//! - `MailboxClient::wait_for_code` - Passcode polling
//! - `PortalDriver::sign_in` - Credential login
//! - `PortalDriver::set_date_range` - Date-range selection
//! - `PortalDriver::export_report` - Export and download
//! - `ReportRelay::process_and_send` - Report relay
//! - `WebhookClient::send` - Webhook delivery
//! - `auth::acquire_token` - Client-credentials grant
//!
//! ### Standard Fields
//!
//! - `mailbox` - Polled mailbox address (credentials are never logged)
//! - `matcher` - Matcher description
//! - `login_url` / `report_url` - Portal pages
//! - `folder` / `file` - Report locations
//! - `url` - Webhook endpoint
//!
//! Enable the `observability` feature for OpenTelemetry integration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod matcher;

// Internal modules
mod auth;
mod mailbox;
mod pipeline;
mod portal;
mod report;
mod webhook;

/// User agent sent on every outbound HTTP request.
pub(crate) const APP_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// Re-exports for ergonomic API
pub use config::{
    DelayConfig, MailboxConfig, MailboxConfigBuilder, PollingConfig, PortalConfig,
    PortalConfigBuilder, RelayConfig, RelayConfigBuilder, TimeoutConfig, WebhookConfig,
    WebhookConfigBuilder,
};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use mailbox::{filter_candidates, LatestCode, MailboxClient, Message, MessageRecord};
pub use pipeline::{PortalAutomation, RunSummary};
pub use portal::PortalDriver;
pub use report::{
    latest_day, latest_report, parse_rows, rows_for_latest_day, RelaySummary, ReportRelay,
    ReportRow,
};
pub use webhook::{ReportPayload, WebhookClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // Ensure all public types are accessible
        let _ = MailboxConfig::builder();
        let _ = PortalConfig::builder();
        let _ = WebhookConfig::builder();
        let _ = matcher::CodeMatcher::vendor_default();
    }
}

//! Error types for the report-relay crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a login/export/relay run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid email address format.
    #[error("invalid email format: {email}")]
    InvalidEmailFormat {
        /// The invalid email address.
        email: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Token endpoint errors (mixed retryability)
    // ─────────────────────────────────────────────────────────────────────────
    /// The token request never produced a usable response.
    #[error("token request to {endpoint} failed")]
    TokenRequest {
        /// The token endpoint URL.
        endpoint: String,
        /// The underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// The identity provider rejected the client-credentials grant.
    #[error("token request rejected: {error}: {description}")]
    TokenRejected {
        /// The provider's error code (e.g. `invalid_client`).
        error: String,
        /// The provider's human-readable error description.
        description: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Mailbox API errors (RETRYABLE - could be transient network/server issues)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to fetch messages from the mailbox API.
    #[error("message fetch for {mailbox} failed")]
    MessageFetch {
        /// The mailbox address being polled.
        mailbox: String,
        /// The underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// The mailbox API answered with a non-success status.
    #[error("mailbox API returned {status} for {mailbox}")]
    ApiStatus {
        /// The mailbox address being polled.
        mailbox: String,
        /// The HTTP status received.
        status: reqwest::StatusCode,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Timeout errors (NOT retryable - we already waited)
    // ─────────────────────────────────────────────────────────────────────────
    /// Timeout waiting for a passcode email to arrive.
    #[error("timeout waiting for passcode email after {timeout:?}")]
    CodeTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Timeout waiting for the exported file to land in the download folder.
    #[error("timeout waiting for export download after {timeout:?}")]
    DownloadTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Browser / WebDriver errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to start a WebDriver session.
    #[error("failed to start WebDriver session at {webdriver_url}")]
    SessionStart {
        /// The WebDriver server URL.
        webdriver_url: String,
        /// The underlying WebDriver error.
        #[source]
        source: thirtyfour::error::WebDriverError,
    },

    /// A browser interaction failed.
    #[error("browser action failed: {action}")]
    Browser {
        /// Short description of the step that failed.
        action: String,
        /// The underlying WebDriver error.
        #[source]
        source: thirtyfour::error::WebDriverError,
    },

    /// A required page element resolved through none of its selector candidates.
    #[error("page element not found: {element}")]
    ElementNotFound {
        /// Human-readable name of the element.
        element: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Report errors (NOT retryable - folder/file state won't change on retry)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to access the reports folder.
    #[error("failed to access reports folder {}", path.display())]
    ReportDir {
        /// The folder that could not be accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No report file with the expected extension exists in the folder.
    #[error("no report file found in {}", path.display())]
    NoReport {
        /// The folder that was searched.
        path: PathBuf,
    },

    /// The report file could not be parsed as CSV.
    #[error("failed to parse report {}", path.display())]
    ReportParse {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The report contained no forwardable rows (no rows at all, or no
    /// parseable date in the timestamp column).
    #[error("report {} contains no forwardable rows", path.display())]
    EmptyReport {
        /// The file that produced no rows.
        path: PathBuf,
    },

    /// Failed to write the message snapshot file.
    #[error("failed to write snapshot {}", path.display())]
    SnapshotWrite {
        /// The snapshot path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Webhook errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The webhook request never produced a response.
    #[error("webhook delivery to {url} failed")]
    WebhookRequest {
        /// The webhook URL.
        url: String,
        /// The underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// The webhook answered with a status other than 200.
    #[error("webhook returned {status}")]
    WebhookStatus {
        /// The HTTP status received.
        status: reqwest::StatusCode,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Search result errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// No passcode could be extracted from the candidate messages.
    #[error("no passcode found in candidate messages")]
    NoCode,
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// No component of this crate retries on its own (first failure aborts the
    /// stage); this classification exists for callers and for logging:
    ///
    /// ```ignore
    /// if error.is_retryable() {
    ///     // Backoff and re-run
    /// } else {
    ///     // Fail permanently
    /// }
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            // RETRYABLE errors: transport failures, API hiccups, session startup
            Error::TokenRequest { .. }
            | Error::MessageFetch { .. }
            | Error::ApiStatus { .. }
            | Error::SessionStart { .. }
            | Error::Browser { .. }
            | Error::WebhookRequest { .. } => true,

            // NOT retryable: bad config, rejected credentials, exhausted waits,
            // pages/files that won't change, servers that answered
            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::TokenRejected { .. }
            | Error::CodeTimeout { .. }
            | Error::DownloadTimeout { .. }
            | Error::ElementNotFound { .. }
            | Error::ReportDir { .. }
            | Error::NoReport { .. }
            | Error::ReportParse { .. }
            | Error::EmptyReport { .. }
            | Error::SnapshotWrite { .. }
            | Error::WebhookStatus { .. }
            | Error::NoCode => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidEmailFormat { .. } | Error::InvalidConfig { .. } => {
                ErrorCategory::Configuration
            }

            Error::TokenRequest { .. } | Error::TokenRejected { .. } => ErrorCategory::Auth,

            Error::MessageFetch { .. }
            | Error::ApiStatus { .. }
            | Error::WebhookRequest { .. }
            | Error::WebhookStatus { .. } => ErrorCategory::Network,

            Error::CodeTimeout { .. } | Error::DownloadTimeout { .. } => ErrorCategory::Timeout,

            Error::SessionStart { .. } | Error::Browser { .. } | Error::ElementNotFound { .. } => {
                ErrorCategory::Browser
            }

            Error::ReportDir { .. } | Error::ReportParse { .. } | Error::SnapshotWrite { .. } => {
                ErrorCategory::Report
            }

            Error::NoReport { .. } | Error::EmptyReport { .. } | Error::NoCode => {
                ErrorCategory::NotFound
            }
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Token acquisition errors.
    Auth,
    /// HTTP transport or remote status errors.
    Network,
    /// Timeout errors.
    Timeout,
    /// Browser automation errors.
    Browser,
    /// Report reading/parsing errors.
    Report,
    /// No matching message, code, file, or row found.
    NotFound,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Auth => write!(f, "auth"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Browser => write!(f, "browser"),
            ErrorCategory::Report => write!(f, "report"),
            ErrorCategory::NotFound => write!(f, "not_found"),
        }
    }
}

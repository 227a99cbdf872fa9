//! Internal module for OAuth2 client-credentials token acquisition.

use crate::config::MailboxConfig;
use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Scope requested for application-permission mailbox reads.
const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Successful token endpoint response. Only the access token is consumed;
/// expiry is irrelevant for a single linear run.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Error body the identity provider returns on a rejected grant.
#[derive(Debug, Default, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Acquires an access token via the client-credentials grant.
#[instrument(
    name = "auth::acquire_token",
    skip_all,
    fields(tenant_id = %config.tenant_id, client_id = %config.client_id)
)]
pub(crate) async fn acquire_token(
    http: &reqwest::Client,
    config: &MailboxConfig,
) -> Result<SecretString> {
    let endpoint = config.token_endpoint();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret()),
        ("scope", DEFAULT_SCOPE),
        ("grant_type", "client_credentials"),
    ];

    let response = http
        .post(&endpoint)
        .form(&params)
        .send()
        .await
        .map_err(|source| Error::TokenRequest {
            endpoint: endpoint.clone(),
            source,
        })?;

    let status = response.status();
    if status.is_success() {
        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|source| Error::TokenRequest { endpoint, source })?;

        debug!("Token acquired");
        Ok(SecretString::from(token.access_token))
    } else {
        let body: TokenErrorBody = response.json().await.unwrap_or_default();

        Err(Error::TokenRejected {
            error: if body.error.is_empty() {
                status.to_string()
            } else {
                body.error
            },
            description: if body.error_description.is_empty() {
                "unknown error".to_string()
            } else {
                body.error_description
            },
        })
    }
}

//! Improvado API key verification and downstream token exchange

use crate::config::VerificationConfig;
use crate::error::Result;
use reqwest::{Client, StatusCode};
use secrecy::Secret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

/// Provider name sent when checking an Improvado key itself
pub const IMPROVADO_PROVIDER: &str = "improvado";

/// Provider name used to exchange a key for a Notion token
pub const NOTION_PROVIDER: &str = "notion";

/// Failure modes of a token exchange
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Verification failed with status: {0}")]
    Status(StatusCode),

    #[error("Verification service did not return an API key")]
    MissingToken,

    #[error("Verification request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Invalid verification response: {0}")]
    InvalidResponse(String),
}

/// Result of checking an API key against the verification service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCheck {
    /// The service accepted the key
    Valid,
    /// The service rejected the key
    Invalid,
    /// The service could not give an answer (5xx, transport failure)
    Unavailable,
}

impl KeyCheck {
    pub fn is_valid(self) -> bool {
        matches!(self, KeyCheck::Valid)
    }

    fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            KeyCheck::Valid
        } else if status.is_client_error() {
            KeyCheck::Invalid
        } else {
            KeyCheck::Unavailable
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(rename = "apiKey", default)]
    api_key: Option<String>,
}

/// Client for the Improvado verification endpoint
///
/// Every call goes to the network. Nothing is cached between calls, so a key
/// revoked upstream stops working on the very next invocation.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    client: Client,
    verify_url: String,
}

impl CredentialVerifier {
    /// Create a verifier posting to the given verification URL
    pub fn new(verify_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().use_rustls_tls().build()?;
        Ok(Self::with_client(client, verify_url))
    }

    /// Create a verifier sharing an existing HTTP client
    pub fn with_client(client: Client, verify_url: impl Into<String>) -> Self {
        Self {
            client,
            verify_url: verify_url.into(),
        }
    }

    /// Create a verifier from the verification section of the config
    pub fn from_config(config: &VerificationConfig) -> Result<Self> {
        Self::new(config.verify_url())
    }

    /// Check a key, distinguishing a rejected key from an unreachable service
    pub async fn check(&self, api_key: &str) -> KeyCheck {
        let response = self
            .client
            .post(&self.verify_url)
            .bearer_auth(api_key)
            .json(&json!({ "provider": IMPROVADO_PROVIDER }))
            .send()
            .await;

        match response {
            Ok(response) => {
                let check = KeyCheck::from_status(response.status());
                debug!("API key check returned {} ({:?})", response.status(), check);
                check
            }
            Err(e) => {
                warn!("API key check could not reach verification service: {}", e);
                KeyCheck::Unavailable
            }
        }
    }

    /// Returns true only when the service positively accepted the key
    pub async fn validate(&self, api_key: &str) -> bool {
        self.check(api_key).await.is_valid()
    }

    /// Exchange an Improvado key for a token usable against `provider`
    pub async fn exchange(
        &self,
        api_key: &str,
        provider: &str,
    ) -> std::result::Result<Secret<String>, VerificationError> {
        debug!("Exchanging API key for {} token", provider);

        let response = self
            .client
            .post(&self.verify_url)
            .bearer_auth(api_key)
            .json(&json!({ "provider": provider }))
            .send()
            .await
            .map_err(VerificationError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Token exchange for {} failed with status {}", provider, status);
            return Err(VerificationError::Status(status));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| VerificationError::InvalidResponse(e.to_string()))?;

        match body.api_key {
            Some(token) if !token.is_empty() => Ok(Secret::new(token)),
            _ => Err(VerificationError::MissingToken),
        }
    }
}

//! Authorization engine seam
//!
//! The engine owns OAuth protocol state: it parses `/authorize` requests,
//! issues grants once the user approves, and resolves access tokens back to
//! the session props recorded at approval time. The gateway only ever talks
//! to it through [`AuthorizationEngine`].

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// An in-flight authorization request, opaque to everything but the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
    /// Fields an engine may add that the gateway carries through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-session data handed to tool invocations
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl SessionProps {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }
}

impl fmt::Debug for SessionProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionProps")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Everything the engine needs to issue a grant
#[derive(Debug, Clone)]
pub struct CompleteAuthorizationOptions {
    pub request: AuthRequest,
    pub user_id: String,
    /// Display label recorded with the grant
    pub label: String,
    pub scope: Vec<String>,
    pub props: SessionProps,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAuthorization {
    /// Where the user agent continues (client redirect URI with the grant)
    pub redirect_to: String,
}

#[async_trait]
pub trait AuthorizationEngine: Send + Sync {
    /// Parse the query string of an `/authorize` request
    async fn parse_auth_request(&self, query: &str) -> Result<AuthRequest>;

    /// Record a grant for an approved request
    async fn complete_authorization(
        &self,
        options: CompleteAuthorizationOptions,
    ) -> Result<CompletedAuthorization>;

    /// Look up the props recorded for an access token, `None` when unknown
    async fn resolve_session(&self, access_token: &str) -> Result<Option<SessionProps>>;
}

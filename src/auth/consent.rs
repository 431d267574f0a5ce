//! Consent form codec
//!
//! The consent page carries the pending authorization request through the
//! browser round-trip as a hidden `state` field: base64 of
//! `{"oauthReqInfo": <AuthRequest>}`. Parsing keeps the encoded string as
//! received so a re-rendered form echoes it byte-for-byte.

use crate::auth::engine::AuthRequest;
use crate::error::Result;
use base64::{engine::general_purpose, Engine as _};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ACTION_FIELD: &str = "action";
pub const STATE_FIELD: &str = "state";
pub const API_KEY_FIELD: &str = "improvadoApiKey";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsentFormError {
    #[error("Consent form is missing the pending authorization request")]
    MissingRequest,

    #[error("Pending authorization request could not be decoded: {0}")]
    UndecodableRequest(String),
}

/// What the user clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentAction {
    Approve,
    /// Also covers a missing or unrecognised action value
    Reject,
}

impl ConsentAction {
    fn from_field(value: Option<&str>) -> Self {
        match value {
            Some("approve") => ConsentAction::Approve,
            _ => ConsentAction::Reject,
        }
    }
}

/// A decoded pending request together with the exact token it came from
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAuthorization {
    encoded: String,
    request: AuthRequest,
}

impl PendingAuthorization {
    /// Encode a freshly parsed request
    pub fn new(request: AuthRequest) -> Result<Self> {
        let encoded = ConsentFormCodec::encode_pending(&request)?;
        Ok(Self { encoded, request })
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn request(&self) -> &AuthRequest {
        &self.request
    }

    pub fn into_request(self) -> AuthRequest {
        self.request
    }
}

#[derive(Debug)]
pub struct ConsentDecision {
    pub action: ConsentAction,
    pub pending: PendingAuthorization,
    /// Supplied key exactly as submitted, `None` when absent or blank
    pub api_key: Option<Secret<String>>,
}

#[derive(Serialize, Deserialize)]
struct ConsentState {
    #[serde(rename = "oauthReqInfo")]
    oauth_req_info: AuthRequest,
}

pub struct ConsentFormCodec;

impl ConsentFormCodec {
    /// Encode a pending request into the token carried by the form
    pub fn encode_pending(request: &AuthRequest) -> Result<String> {
        let json = serde_json::to_vec(&ConsentState {
            oauth_req_info: request.clone(),
        })?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    pub fn decode_pending(encoded: &str) -> std::result::Result<AuthRequest, ConsentFormError> {
        if encoded.is_empty() {
            return Err(ConsentFormError::MissingRequest);
        }

        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ConsentFormError::UndecodableRequest(e.to_string()))?;
        let state: ConsentState = serde_json::from_slice(&bytes)
            .map_err(|e| ConsentFormError::UndecodableRequest(e.to_string()))?;
        Ok(state.oauth_req_info)
    }

    /// Parse an `application/x-www-form-urlencoded` consent submission
    pub fn parse(form_body: &[u8]) -> std::result::Result<ConsentDecision, ConsentFormError> {
        let mut action = None;
        let mut state = None;
        let mut api_key = None;

        for (key, value) in url::form_urlencoded::parse(form_body) {
            let slot = match &*key {
                ACTION_FIELD => &mut action,
                STATE_FIELD => &mut state,
                API_KEY_FIELD => &mut api_key,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let encoded = state.ok_or(ConsentFormError::MissingRequest)?;
        let request = Self::decode_pending(&encoded)?;

        Ok(ConsentDecision {
            action: ConsentAction::from_field(action.as_deref()),
            pending: PendingAuthorization { encoded, request },
            api_key: api_key
                .filter(|key| !key.trim().is_empty())
                .map(Secret::new),
        })
    }
}

//! Consent approval processing
//!
//! Turns a submitted consent form into one of four outcomes. Only an approval
//! with an acceptable key (or with no key at all) reaches the engine; every
//! other path leaves the pending request untouched so the form can be
//! submitted again.

use crate::auth::consent::{ConsentAction, ConsentDecision, ConsentFormCodec, PendingAuthorization};
use crate::auth::engine::{AuthorizationEngine, CompleteAuthorizationOptions, SessionProps};
use crate::auth::verifier::{CredentialVerifier, KeyCheck};
use crate::error::Result;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const INVALID_KEY_MESSAGE: &str = "Invalid API key. Please try again with a valid API key.";

pub const VERIFICATION_UNAVAILABLE_MESSAGE: &str =
    "We could not reach the Improvado verification service to check your API key. Please try again in a moment.";

/// Label recorded with every grant issued by the gateway
pub const USER_LABEL: &str = "Improvado User";

/// A scope shown on the consent screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentScope {
    pub name: &'static str,
    pub description: &'static str,
}

pub const CONSENT_SCOPES: &[ConsentScope] = &[ConsentScope {
    name: "improvado_api",
    description: "Access your Improvado data using your API key",
}];

/// Why the consent form is shown again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReProposeReason {
    InvalidKey,
    VerificationUnavailable,
}

impl ReProposeReason {
    pub fn message(self) -> &'static str {
        match self {
            ReProposeReason::InvalidKey => INVALID_KEY_MESSAGE,
            ReProposeReason::VerificationUnavailable => VERIFICATION_UNAVAILABLE_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalOutcome {
    /// The pending request could not be recovered from the form
    InvalidRequest,
    Rejected {
        return_to: String,
    },
    ReProposed {
        pending: PendingAuthorization,
        reason: ReProposeReason,
    },
    Approved {
        redirect_to: String,
        user_id: String,
    },
}

pub struct ApprovalProcessor {
    engine: Arc<dyn AuthorizationEngine>,
    verifier: Arc<CredentialVerifier>,
}

impl ApprovalProcessor {
    pub fn new(engine: Arc<dyn AuthorizationEngine>, verifier: Arc<CredentialVerifier>) -> Self {
        Self { engine, verifier }
    }

    /// Parse an `/authorize` query into a request ready for the consent form
    pub async fn begin(&self, query: &str) -> Result<PendingAuthorization> {
        let request = self.engine.parse_auth_request(query).await?;
        debug!("Authorization requested by client '{}'", request.client_id);
        PendingAuthorization::new(request)
    }

    /// Process a raw form body posted to `/approve`
    pub async fn process_form(&self, form_body: &[u8], return_to: &str) -> Result<ApprovalOutcome> {
        match ConsentFormCodec::parse(form_body) {
            Ok(decision) => self.decide(decision, return_to).await,
            Err(e) => {
                warn!("Rejecting consent submission: {}", e);
                Ok(ApprovalOutcome::InvalidRequest)
            }
        }
    }

    /// Apply a parsed consent decision
    ///
    /// Errors are reserved for engine failures during completion.
    pub async fn decide(&self, decision: ConsentDecision, return_to: &str) -> Result<ApprovalOutcome> {
        let ConsentDecision {
            action,
            pending,
            api_key,
        } = decision;

        if action == ConsentAction::Reject {
            info!("User rejected authorization for client '{}'", pending.request().client_id);
            return Ok(ApprovalOutcome::Rejected {
                return_to: return_to.to_string(),
            });
        }

        if let Some(key) = &api_key {
            let reason = match self.verifier.check(key.expose_secret()).await {
                KeyCheck::Valid => None,
                KeyCheck::Invalid => Some(ReProposeReason::InvalidKey),
                KeyCheck::Unavailable => Some(ReProposeReason::VerificationUnavailable),
            };
            if let Some(reason) = reason {
                info!("Re-proposing consent form: {:?}", reason);
                return Ok(ApprovalOutcome::ReProposed { pending, reason });
            }
        }

        let request = pending.into_request();
        let user_id = format!("improvado_user_{}", Uuid::new_v4());
        let props = SessionProps {
            api_key: api_key.map(|key| key.expose_secret().clone()),
        };

        let completed = self
            .engine
            .complete_authorization(CompleteAuthorizationOptions {
                scope: request.scope.clone(),
                request,
                user_id: user_id.clone(),
                label: USER_LABEL.to_string(),
                props,
            })
            .await?;

        info!("Authorization approved for {}", user_id);
        Ok(ApprovalOutcome::Approved {
            redirect_to: completed.redirect_to,
            user_id,
        })
    }
}

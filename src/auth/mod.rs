//! Authorization for the Improvado gateway
//!
//! Covers the consent flow (form codec, approval processing), the
//! authorization engine seam with its in-memory development implementation,
//! and credential verification against the Improvado service.

pub mod approval;
pub mod consent;
pub mod engine;
pub mod memory_engine;
pub mod verifier;

pub use approval::{
    ApprovalOutcome, ApprovalProcessor, ConsentScope, ReProposeReason, CONSENT_SCOPES,
    INVALID_KEY_MESSAGE, USER_LABEL, VERIFICATION_UNAVAILABLE_MESSAGE,
};
pub use consent::{
    ConsentAction, ConsentDecision, ConsentFormCodec, ConsentFormError, PendingAuthorization,
};
pub use engine::{
    AuthRequest, AuthorizationEngine, CompleteAuthorizationOptions, CompletedAuthorization,
    SessionProps,
};
pub use memory_engine::{Grant, InMemoryAuthorizationEngine, DEFAULT_MAX_GRANTS};
pub use verifier::{CredentialVerifier, KeyCheck, VerificationError, NOTION_PROVIDER};

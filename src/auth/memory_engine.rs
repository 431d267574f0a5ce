//! In-process authorization engine for development and tests

use crate::auth::engine::{
    AuthRequest, AuthorizationEngine, CompleteAuthorizationOptions, CompletedAuthorization,
    SessionProps,
};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Map;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// A grant recorded on approval
#[derive(Debug, Clone)]
pub struct Grant {
    pub client_id: String,
    pub user_id: String,
    pub label: String,
    pub scope: Vec<String>,
    pub props: SessionProps,
    pub created_at: DateTime<Utc>,
}

/// Grants kept before the oldest is evicted
pub const DEFAULT_MAX_GRANTS: usize = 10_000;

/// Keeps grants in memory, keyed by the code handed back to the client.
///
/// The code doubles as the bearer token for `/mcp`. There is no signing,
/// expiry or persistence; restart the process and every grant is gone.
/// At most `max_grants` are held, and the oldest is dropped first.
#[derive(Debug)]
pub struct InMemoryAuthorizationEngine {
    grants: DashMap<String, Grant>,
    issued: Mutex<VecDeque<String>>,
    max_grants: usize,
}

impl Default for InMemoryAuthorizationEngine {
    fn default() -> Self {
        Self::with_max_grants(DEFAULT_MAX_GRANTS)
    }
}

impl InMemoryAuthorizationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_grants(max_grants: usize) -> Self {
        Self {
            grants: DashMap::new(),
            issued: Mutex::new(VecDeque::new()),
            max_grants: max_grants.max(1),
        }
    }

    fn record(&self, code: String, grant: Grant) {
        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        self.grants.insert(code.clone(), grant);
        issued.push_back(code);
        while issued.len() > self.max_grants {
            if let Some(oldest) = issued.pop_front() {
                self.grants.remove(&oldest);
                debug!("Evicted oldest grant, {} held", self.max_grants);
            }
        }
    }

    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }

    pub fn grant(&self, code: &str) -> Option<Grant> {
        self.grants.get(code).map(|entry| entry.value().clone())
    }

    fn parse_redirect_uri(raw: &str) -> Result<Url> {
        let url = Url::parse(raw)
            .map_err(|e| GatewayError::auth(format!("Invalid redirect_uri '{}': {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(GatewayError::auth(format!(
                "Unsupported redirect_uri scheme: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl AuthorizationEngine for InMemoryAuthorizationEngine {
    async fn parse_auth_request(&self, query: &str) -> Result<AuthRequest> {
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }

        let response_type = params.remove("response_type").unwrap_or_default();
        if response_type != "code" {
            return Err(GatewayError::auth(format!(
                "Unsupported response_type: '{}'",
                response_type
            )));
        }

        let client_id = params
            .remove("client_id")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| GatewayError::auth("Missing client_id"))?;

        let redirect_uri = params
            .remove("redirect_uri")
            .ok_or_else(|| GatewayError::auth("Missing redirect_uri"))?;
        Self::parse_redirect_uri(&redirect_uri)?;

        let scope = params
            .remove("scope")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(AuthRequest {
            response_type,
            client_id,
            redirect_uri,
            scope,
            state: params.remove("state").unwrap_or_default(),
            code_challenge: params.remove("code_challenge"),
            code_challenge_method: params.remove("code_challenge_method"),
            extra: Map::new(),
        })
    }

    async fn complete_authorization(
        &self,
        options: CompleteAuthorizationOptions,
    ) -> Result<CompletedAuthorization> {
        let mut redirect = Self::parse_redirect_uri(&options.request.redirect_uri)?;
        let code = Uuid::new_v4().simple().to_string();

        {
            let mut query = redirect.query_pairs_mut();
            query.append_pair("code", &code);
            if !options.request.state.is_empty() {
                query.append_pair("state", &options.request.state);
            }
        }

        info!(
            "Issued grant for client '{}' to user {}",
            options.request.client_id, options.user_id
        );
        self.record(
            code,
            Grant {
                client_id: options.request.client_id,
                user_id: options.user_id,
                label: options.label,
                scope: options.scope,
                props: options.props,
                created_at: Utc::now(),
            },
        );

        Ok(CompletedAuthorization {
            redirect_to: redirect.to_string(),
        })
    }

    async fn resolve_session(&self, access_token: &str) -> Result<Option<SessionProps>> {
        let props = self.grants.get(access_token).map(|g| g.props.clone());
        if props.is_none() {
            debug!("No grant found for presented access token");
        }
        Ok(props)
    }
}

//! HTTP server for the gateway: consent flow pages and the MCP endpoint

use crate::auth::{
    ApprovalOutcome, ApprovalProcessor, AuthorizationEngine, CredentialVerifier, SessionProps,
    CONSENT_SCOPES,
};
use crate::config::Config;
use crate::error::Result;
use crate::mcp::errors::McpError;
use crate::mcp::types::{McpRequest, McpResponse, ToolCall, ToolListResponse, PROTOCOL_VERSION};
use crate::routing::ToolDispatcher;
use crate::web::{render_approved, render_authorize, render_home, render_rejected};
use actix_web::http::header::{self, ContentType};
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Body returned when a consent submission has lost its pending request
pub const INVALID_REQUEST_BODY: &str = "INVALID REQUEST";

/// Where a rejected consent sends the user
const REJECT_RETURN_TO: &str = "/";

pub struct GatewayServer {
    engine: Arc<dyn AuthorizationEngine>,
    processor: ApprovalProcessor,
    dispatcher: ToolDispatcher,
}

impl GatewayServer {
    pub fn new(
        engine: Arc<dyn AuthorizationEngine>,
        verifier: Arc<CredentialVerifier>,
        dispatcher: ToolDispatcher,
    ) -> Self {
        Self {
            processor: ApprovalProcessor::new(Arc::clone(&engine), verifier),
            engine,
            dispatcher,
        }
    }

    /// Build the server and its collaborators from configuration
    pub fn from_config(config: &Config, engine: Arc<dyn AuthorizationEngine>) -> Result<Self> {
        let verifier = Arc::new(CredentialVerifier::from_config(&config.verification)?);
        let dispatcher = ToolDispatcher::new(config, Arc::clone(&verifier))?;
        Ok(Self::new(engine, verifier, dispatcher))
    }

    /// Resolve the bearer token of an MCP request to its session props
    pub async fn resolve_session(&self, req: &HttpRequest) -> Option<SessionProps> {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())?;

        match self.engine.resolve_session(token).await {
            Ok(props) => props,
            Err(e) => {
                error!("Session lookup failed: {}", e);
                None
            }
        }
    }

    /// Handle one JSON-RPC message; `None` for notifications
    pub async fn handle_mcp_request(
        &self,
        request: McpRequest,
        session: &SessionProps,
    ) -> Option<McpResponse> {
        if request.jsonrpc != "2.0" {
            return Some(McpResponse::error(
                request.id,
                McpError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }

        if request.is_notification() {
            debug!("Received notification: {}", request.method);
            return None;
        }

        let id = request.id;
        let result = match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": "Improvado MCP",
                    "version": crate::VERSION
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => serde_json::to_value(ToolListResponse {
                tools: self.dispatcher.list_tools(),
            })
            .map_err(|e| McpError::internal_error(e.to_string())),
            "tools/call" => self.call_tool(request.params, session).await,
            other => Err(McpError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => McpResponse::error(id, e),
        })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        session: &SessionProps,
    ) -> std::result::Result<Value, McpError> {
        let call: ToolCall = params
            .ok_or_else(|| McpError::invalid_params("Missing params for tools/call"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| McpError::invalid_params(e.to_string()))
            })?;

        let result = self.dispatcher.invoke(&call, session).await.map_err(|e| {
            warn!("Rejected call to tool '{}': {}", call.name, e);
            McpError::from(e)
        })?;
        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }

    /// Bind and serve until shutdown
    pub async fn start(self, host: &str, port: u16) -> Result<()> {
        info!("Starting Improvado MCP gateway on {}:{}", host, port);
        let server_data = web::Data::new(Arc::new(self));

        HttpServer::new(move || {
            App::new()
                .app_data(server_data.clone())
                .wrap(Logger::default())
                .configure(configure_routes)
        })
        .bind((host, port))?
        .run()
        .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

/// Register every gateway route. Expects `web::Data<Arc<GatewayServer>>`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home_handler))
        .route("/health", web::get().to(health_check))
        .route("/authorize", web::get().to(authorize_handler))
        .route("/approve", web::post().to(approve_handler))
        .route("/mcp", web::post().to(mcp_jsonrpc_handler))
        .route("/mcp/tools", web::get().to(list_tools_handler))
        .route("/mcp/call", web::post().to(call_tool_handler));
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
        .json(json!({
            "error": "invalid_token",
            "error_description": "Missing or unknown access token"
        }))
}

pub async fn home_handler() -> HttpResponse {
    html(render_home())
}

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

pub async fn authorize_handler(
    req: HttpRequest,
    server: web::Data<Arc<GatewayServer>>,
) -> HttpResponse {
    match server.processor.begin(req.query_string()).await {
        Ok(pending) => html(render_authorize(&pending, CONSENT_SCOPES, None)),
        Err(e) => {
            warn!("Invalid authorization request: {}", e);
            HttpResponse::BadRequest()
                .content_type(ContentType::plaintext())
                .body(format!("Invalid authorization request: {}", e))
        }
    }
}

pub async fn approve_handler(
    body: web::Bytes,
    server: web::Data<Arc<GatewayServer>>,
) -> HttpResponse {
    match server.processor.process_form(&body, REJECT_RETURN_TO).await {
        Ok(ApprovalOutcome::InvalidRequest) => HttpResponse::Unauthorized()
            .content_type(ContentType::plaintext())
            .body(INVALID_REQUEST_BODY),
        Ok(ApprovalOutcome::Rejected { return_to }) => html(render_rejected(&return_to)),
        Ok(ApprovalOutcome::ReProposed { pending, reason }) => {
            html(render_authorize(&pending, CONSENT_SCOPES, Some(reason.message())))
        }
        Ok(ApprovalOutcome::Approved { redirect_to, .. }) => html(render_approved(&redirect_to)),
        Err(e) => {
            error!("Failed to complete authorization ({}): {}", e.category(), e);
            HttpResponse::InternalServerError()
                .content_type(ContentType::plaintext())
                .body("Failed to complete authorization. Please try again.")
        }
    }
}

/// MCP JSON-RPC 2.0 endpoint
pub async fn mcp_jsonrpc_handler(
    req: HttpRequest,
    body: web::Bytes,
    server: web::Data<Arc<GatewayServer>>,
) -> HttpResponse {
    let session = match server.resolve_session(&req).await {
        Some(session) => session,
        None => return unauthorized(),
    };

    let request: McpRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let error = if serde_json::from_slice::<Value>(&body).is_ok() {
                McpError::invalid_request(e.to_string())
            } else {
                McpError::parse_error(e.to_string())
            };
            return HttpResponse::Ok().json(McpResponse::error(None, error));
        }
    };

    match server.handle_mcp_request(request, &session).await {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    }
}

/// List tools endpoint
pub async fn list_tools_handler(
    req: HttpRequest,
    server: web::Data<Arc<GatewayServer>>,
) -> HttpResponse {
    if server.resolve_session(&req).await.is_none() {
        return unauthorized();
    }
    HttpResponse::Ok().json(ToolListResponse {
        tools: server.dispatcher.list_tools(),
    })
}

/// Call tool endpoint
pub async fn call_tool_handler(
    req: HttpRequest,
    tool_call: web::Json<ToolCall>,
    server: web::Data<Arc<GatewayServer>>,
) -> HttpResponse {
    let session = match server.resolve_session(&req).await {
        Some(session) => session,
        None => return unauthorized(),
    };

    match server.dispatcher.invoke(&tool_call, &session).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => {
            warn!("Failed to call tool '{}': {}", tool_call.name, e);
            let mcp_error: McpError = e.into();
            HttpResponse::BadRequest().json(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": mcp_error
            }))
        }
    }
}

//! HTTP server.
//!
//! Serves the tool registry two ways on one listener: as an MCP
//! Streamable HTTP endpoint for MCP clients, and as plain JSON routes for
//! scripts and curl.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (version and manifest size) |
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `POST` | `/ask` | Answer a prompt with the chat model |
//! | `*`    | `/mcp` | MCP Streamable HTTP transport |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "prompt must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500),
//! `upstream_error` (502), `unavailable` (503).
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::agent::{Agent, ChatError};
use crate::loader::ContextLoader;
use crate::mcp::McpBridge;
use crate::resource::ResourceError;
use crate::traits::{validate_params, ParamError, ToolContext, ToolRegistry};

/// Shared state for the REST handlers.
#[derive(Clone)]
struct AppState {
    ctx: ToolContext,
    tools: Arc<ToolRegistry>,
    agent: Arc<Agent>,
}

/// Build the router without binding it; used by [`run_server`] and tests.
pub fn router(
    loader: Arc<ContextLoader>,
    tools: Arc<ToolRegistry>,
    agent: Arc<Agent>,
) -> Router {
    let bridge = McpBridge::new(loader.clone(), tools.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    let state = AppState {
        ctx: ToolContext::new(loader),
        tools,
        agent,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/ask", post(handle_ask))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(state)
}

/// Bind to `bind_addr` and serve until the process is terminated.
pub async fn run_server(
    bind_addr: &str,
    loader: Arc<ContextLoader>,
    tools: Arc<ToolRegistry>,
    agent: Arc<Agent>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let local = listener.local_addr()?;

    info!(
        manifest = loader.manifest_path(),
        documents = loader.manifest().len(),
        max_docs = loader.max_docs(),
        "context loader ready"
    );
    for t in tools.tools() {
        let tag = if t.is_builtin() { "builtin" } else { "rust" };
        info!("POST /tools/{} ({})", t.name(), tag);
    }
    info!("POST /ask (model: {})", agent.default_model());
    info!("MCP endpoint: http://{}/mcp", local);
    info!("listening on http://{}", local);

    let app = router(loader, tools, agent);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error",
        message: message.into(),
    }
}

fn upstream_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_error",
        message: message.into(),
    }
}

fn unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        code: "unavailable",
        message: message.into(),
    }
}

/// True when `err` was caused by the caller's input.
fn is_caller_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ParamError>().is_some()
        || matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::OutsideRoot { .. })
        )
}

/// Map a tool failure to a status code. Empty parameters and paths outside
/// the context root are the caller's fault; everything else is the tool's.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let message = format!("{}: {}", tool_name, err);
    if is_caller_error(&err) {
        bad_request(message)
    } else {
        tool_error(message)
    }
}

fn classify_ask_error(err: anyhow::Error) -> AppError {
    if is_caller_error(&err) {
        return bad_request(err.to_string());
    }
    match err.downcast_ref::<ChatError>() {
        Some(ChatError::Unavailable(_)) => unavailable(err.to_string()),
        Some(_) => upstream_error(err.to_string()),
        None => tool_error(err.to_string()),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    documents: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        documents: state.ctx.manifest().len(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    builtin: bool,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            builtin: t.is_builtin(),
            parameters: t.parameters_schema(),
        })
        .collect();

    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let params = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| bad_request(e.to_string()))?;

    debug!(tool = %name, "rest tool call");

    let result = tool
        .execute(params, &state.ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    prompt: String,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    debug!(model = ?req.model, "ask");

    let answer = state
        .agent
        .ask(&req.prompt, req.model.as_deref())
        .await
        .map_err(classify_ask_error)?;

    Ok(Json(AskResponse { answer }))
}

//! HTTP API server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Answer a question (store first, LLM fallback) |
//! | `POST` | `/describe-image` | Describe an uploaded image |
//! | `POST` | `/generate-image` | Generate an image from a prompt |
//! | `POST` | `/generate-audio` | Synthesize speech from text |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Known paths reject other methods with 405.
//!
//! # Error Contract
//!
//! Validation and provider errors use one JSON schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `payload_too_large` (413),
//! `provider_error` (500). Pipeline trouble never surfaces as a 5xx; the
//! ask endpoint degrades through its fallback tiers instead.
//!
//! The request body limit is sized from `server.max_image_bytes` plus
//! base64 overhead, so in-cap image uploads always reach the image
//! handler's own cap check.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser chat UI
//! can call the API from anywhere it is hosted.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::llm::LlmClient;
use crate::media::{decode_image, ImageError};
use crate::pipeline::{AskDebug, AskOutcome, Pipeline, Suggestion};
use crate::store::rest::RestStore;
use crate::store::RecordStore;

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pipeline: Arc<Pipeline>,
    llm: Arc<LlmClient>,
}

/// Starts the API server with the backends from config: the REST record
/// store and the LLM provider resolved from the environment.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn RecordStore> = Arc::new(RestStore::from_config(&config.store)?);
    let llm = Arc::new(LlmClient::from_config(config)?);
    run_server_with_backends(config, store, llm).await
}

/// Starts the API server with explicit backends. Integration tests use
/// this with the in-memory store and a pinned LLM provider.
pub async fn run_server_with_backends(
    config: &Config,
    store: Arc<dyn RecordStore>,
    llm: Arc<LlmClient>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    // base64 inflates the decoded image cap by 4/3; the rest is JSON
    // envelope slack
    let body_limit = config.server.max_image_bytes * 4 / 3 + 64 * 1024;
    let config = Arc::new(config.clone());
    let pipeline = Arc::new(Pipeline::new(store, llm.clone(), config.clone()));

    let state = AppState {
        config,
        pipeline,
        llm,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ask", post(handle_ask))
        .route("/describe-image", post(handle_describe_image))
        .route("/generate-image", post(handle_generate_image))
        .route("/generate-audio", post(handle_generate_audio))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state);

    println!("campus-desk API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable
/// message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 413 Payload Too Large error.
fn payload_too_large(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        code: "payload_too_large".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error carrying the provider's diagnostic text.
fn provider_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "provider_error".to_string(),
        message: message.into(),
    }
}

// ============ /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: Option<String>,
    /// Include the diagnostics object in the response.
    #[serde(default)]
    debug: bool,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestions: Option<Vec<Suggestion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<AskDebug>,
}

impl AskResponse {
    fn from_outcome(outcome: AskOutcome, include_debug: bool) -> Self {
        Self {
            answer: outcome.answer,
            source: outcome.source,
            matched_alias: outcome.matched_alias,
            suggestions: outcome.suggestions,
            debug: include_debug.then_some(outcome.debug),
        }
    }
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let question = request.question.as_deref().map(str::trim).unwrap_or("");
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let outcome = state.pipeline.ask(question).await;
    Ok(Json(AskResponse::from_outcome(outcome, request.debug)))
}

// ============ /describe-image ============

#[derive(Deserialize)]
struct DescribeImageRequest {
    /// Data URL or raw base64.
    image: Option<String>,
    filename: Option<String>,
    #[serde(default)]
    debug: bool,
}

#[derive(Serialize)]
struct DescribeImageResponse {
    ok: bool,
    answer: String,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<serde_json::Value>,
}

async fn handle_describe_image(
    State(state): State<AppState>,
    Json(request): Json<DescribeImageRequest>,
) -> Result<Json<DescribeImageResponse>, AppError> {
    let payload = request.image.as_deref().map(str::trim).unwrap_or("");
    if payload.is_empty() {
        return Err(bad_request("image payload is required"));
    }

    let cap = state.config.server.max_image_bytes;
    let image = decode_image(payload, request.filename.as_deref(), cap).map_err(|e| match e {
        ImageError::Unparseable(_) => bad_request(e.to_string()),
        ImageError::TooLarge { .. } => payload_too_large(e.to_string()),
    })?;

    let reply = state.llm.describe_image(&image.bytes, &image.mime).await;
    let source = if state.llm.is_configured() {
        "llm"
    } else {
        "generic"
    };
    let debug = request.debug.then(|| {
        serde_json::json!({
            "mime": image.mime,
            "bytes": image.bytes.len(),
        })
    });
    Ok(Json(DescribeImageResponse {
        ok: reply.is_meaningful(),
        answer: reply.text,
        source: source.to_string(),
        debug,
    }))
}

// ============ /generate-image and /generate-audio ============

#[derive(Deserialize)]
struct GenerateImageRequest {
    prompt: Option<String>,
}

#[derive(Deserialize)]
struct GenerateAudioRequest {
    text: Option<String>,
}

async fn handle_generate_image(
    State(state): State<AppState>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let prompt = request.prompt.as_deref().map(str::trim).unwrap_or("");
    if prompt.is_empty() {
        return Err(bad_request("prompt must not be empty"));
    }
    let image = state
        .llm
        .generate_image(prompt)
        .await
        .map_err(|e| provider_error(format!("{:#}", e)))?;
    Ok(Json(serde_json::json!({ "image": image })))
}

async fn handle_generate_audio(
    State(state): State<AppState>,
    Json(request): Json<GenerateAudioRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let text = request.text.as_deref().map(str::trim).unwrap_or("");
    if text.is_empty() {
        return Err(bad_request("text must not be empty"));
    }
    let audio = state
        .llm
        .synthesize_audio(text)
        .await
        .map_err(|e| provider_error(format!("{:#}", e)))?;
    Ok(Json(serde_json::json!({ "audio": audio })))
}

// ============ /health ============

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

//! HTTP surface: chat-stream proxy, correlation API, phase API.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::correlation::{CorrelationError, CorrelationStore};
use crate::phase::PhaseJump;
use crate::reasoning::SplitterConfig;
use crate::stream::{DispatcherConfig, StreamDispatcher, SERVICE_ERROR_FALLBACK};

pub struct AppState {
    pub client: reqwest::Client,
    pub config: ServiceConfig,
    pub correlation: Arc<CorrelationStore>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;
        let correlation = Arc::new(CorrelationStore::new(Duration::from_secs(
            config.correlation_ttl_secs,
        )));
        Ok(Self {
            client,
            config,
            correlation,
        })
    }

    fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            emit_interval: Duration::from_millis(self.config.emit_interval_ms),
            splitter: SplitterConfig {
                start_marker: self.config.think_start_marker.clone(),
                end_marker: self.config.think_end_marker.clone(),
                max_buffer_size: self.config.max_buffer_size,
                ..Default::default()
            },
        }
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/readiness", get(readiness))
        .route("/v1/chat/stream", post(chat_stream))
        .route("/v1/messages", post(register_message))
        .route("/v1/messages/update", post(update_message))
        .route("/v1/messages/{message_id}", get(get_message))
        .route(
            "/v1/conversations/{conversation_id}/message",
            get(get_conversation_message),
        )
        .route("/v1/phase/update", post(update_phase))
        .with_state(state)
}

pub async fn startup(config: ServiceConfig) -> anyhow::Result<()> {
    config.validate()?;
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    let state = Arc::new(AppState::new(config.clone())?);
    let _sweeper = state.correlation.spawn_sweeper(sweep_interval);

    let app = build_app(state);
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    "OK"
}

async fn readiness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "inflight_messages": state.correlation.len(),
    }))
}

#[derive(Debug, Deserialize)]
struct ChatStreamRequest {
    conversation_id: String,
    query: String,
}

/// Proxy one conversation turn: forward the query upstream, pump the SSE
/// feed through the dispatcher, and stream display updates back out.
async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatStreamRequest>,
) -> Response {
    let message_id = Uuid::new_v4().to_string();
    state
        .correlation
        .register(&message_id, Some(&request.conversation_id));

    let payload = json!({
        "conversation_id": request.conversation_id,
        "message_id": message_id,
        "query": request.query,
    });

    let response = match state
        .client
        .post(&state.config.upstream_url)
        .header("Accept", "text/event-stream")
        .json(&payload)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            warn!(%message_id, "upstream request failed: {}", err);
            return upstream_failure();
        }
    };

    if !response.status().is_success() {
        warn!(
            %message_id,
            status = %response.status(),
            "upstream returned non-success"
        );
        return upstream_failure();
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = StreamDispatcher::new(state.dispatcher_config(), tx);
    tokio::spawn(dispatcher.run(response.bytes_stream()));

    let body_stream = UnboundedReceiverStream::new(rx).map(|update| {
        let line = serde_json::to_string(&update).unwrap_or_default();
        Ok::<Bytes, std::io::Error>(Bytes::from(format!("data: {}\n\n", line)))
    });

    let mut response = Response::new(Body::from_stream(body_stream));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    response
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    message_id: Option<String>,
    conversation_id: Option<String>,
}

async fn register_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    let message_id = request
        .message_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let record = state
        .correlation
        .register(&message_id, request.conversation_id.as_deref());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn get_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> Response {
    match state.correlation.get_message(&message_id) {
        Ok(record) => Json(record).into_response(),
        Err(err) => not_found(err),
    }
}

async fn get_conversation_message(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Response {
    match state.correlation.get_by_conversation(&conversation_id) {
        Ok(record) => Json(record).into_response(),
        Err(err) => not_found(err),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    message_id: Option<String>,
    conversation_id: Option<String>,
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

async fn update_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateRequest>,
) -> Response {
    let result = match (&request.message_id, &request.conversation_id) {
        (Some(message_id), _) => state
            .correlation
            .update_message(message_id, request.attributes),
        (None, Some(conversation_id)) => state
            .correlation
            .update_by_conversation(conversation_id, request.attributes),
        (None, None) => {
            return invalid_request("message_id or conversation_id is required");
        }
    };
    match result {
        Ok(record) => Json(record).into_response(),
        Err(err) => not_found(err),
    }
}

#[derive(Debug, Deserialize)]
struct PhaseUpdateRequest {
    phase: String,
    conversation_id: Option<String>,
    message_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct PhaseUpdateResponse {
    requested: String,
    actual: String,
    jumped: bool,
}

/// Apply the canonical-phase jump and, when a correlation key was supplied,
/// record the resolved phase on the in-flight message.
async fn update_phase(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PhaseUpdateRequest>,
) -> Response {
    if request.phase.is_empty() {
        return invalid_request("phase is required");
    }

    let jump = PhaseJump::resolve(&request.phase);
    let mut patch = serde_json::Map::new();
    patch.insert(
        "phase".to_string(),
        serde_json::Value::String(jump.actual.clone()),
    );

    let applied = match (&request.message_id, &request.conversation_id) {
        (Some(message_id), _) => Some(state.correlation.update_message(message_id, patch)),
        (None, Some(conversation_id)) => Some(
            state
                .correlation
                .update_by_conversation(conversation_id, patch),
        ),
        (None, None) => None,
    };
    if let Some(Err(err)) = applied {
        return not_found(err);
    }

    Json(PhaseUpdateResponse {
        requested: jump.requested,
        actual: jump.actual,
        jumped: jump.jumped,
    })
    .into_response()
}

/// Transport failures toward the upstream are fatal for the turn; the client
/// only ever sees the fixed fallback, never the raw error.
fn upstream_failure() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": "upstream_unavailable",
            "detail": SERVICE_ERROR_FALLBACK,
        })),
    )
        .into_response()
}

fn not_found(err: CorrelationError) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not_found", "detail": err.to_string() })),
    )
        .into_response()
}

fn invalid_request(detail: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_request", "detail": detail })),
    )
        .into_response()
}

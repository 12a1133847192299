//! HTTP handlers for the chatter server.
//!
//! This module maps the HTTP surface onto the broadcast core: posting a
//! message appends to a room's stream, and subscribing holds the response
//! open while the room's receive loop feeds it.

use crate::config::Config;
use crate::metrics::{self, SubscriberMetricsGuard};
use crate::workspace::{WorkspaceError, WorkspaceRoot};
use anyhow::Result;
use axum::{
    body::Body,
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use chatter_core::{registry, ChatMessage, StreamRegistry};
use futures_util::stream::unfold;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// The room registry.
    pub registry: StreamRegistry,
    /// The browsable workspace tree.
    pub workspaces: WorkspaceRoot,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            registry: StreamRegistry::new(),
            workspaces: WorkspaceRoot::new(&config.workspace.root),
            config,
        }
    }
}

/// Run the HTTP server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route("/chatter/:room", get(stream_room).post(post_message))
        .route("/workspaces", get(list_workspaces))
        .route("/workspaces/:workspace", get(list_files))
        .route("/workspaces/:workspace/:file", get(fetch_file))
        .route("/health", get(health_handler))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Chatter server listening on {}", addr);
    info!("Chat endpoint: http://{}/chatter/:room", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.registry.stats();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": stats.room_count,
        "listeners": stats.listener_count,
        "messages": stats.message_count,
    }))
}

/// A message submission. Both fields must be present and non-empty for a
/// send to happen.
#[derive(Debug, Default, Deserialize)]
pub struct SendForm {
    name: Option<String>,
    text: Option<String>,
}

/// Strip one trailing newline, as form fields arrive from a textarea.
fn chomp(value: &str) -> &str {
    value
        .strip_suffix("\r\n")
        .or_else(|| value.strip_suffix('\n'))
        .unwrap_or(value)
}

/// Accept a message for a room.
///
/// A post with a missing or empty field is dropped silently, not
/// rejected: the original form UI fires half-filled submissions.
async fn post_message(
    Path(room): Path<String>,
    State(state): State<Arc<AppState>>,
    Form(form): Form<SendForm>,
) -> Response {
    if let Err(reason) = registry::validate_room_name(&room) {
        return (StatusCode::BAD_REQUEST, reason).into_response();
    }

    let (name, text) = match (&form.name, &form.text) {
        (Some(name), Some(text)) => (chomp(name), chomp(text)),
        _ => return StatusCode::NO_CONTENT.into_response(),
    };
    if name.is_empty() || text.is_empty() {
        debug!(room = %room, "ignoring message with missing fields");
        return StatusCode::NO_CONTENT.into_response();
    }

    let message = ChatMessage::new(name, text);
    metrics::record_message(message.sender.len() + message.text.len(), "posted");
    state.registry.room(&room).send(message);
    metrics::set_active_rooms(state.registry.room_count());

    StatusCode::NO_CONTENT.into_response()
}

/// Render one message as a delivery line.
fn render_line(message: &ChatMessage) -> Bytes {
    Bytes::from(format!("[{}] {}\n", message.sender, message.text))
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Subscribe to a room.
///
/// Replays the room's history, then holds the response open and writes
/// each new message as it arrives, until the client disconnects.
/// Disconnect drops the body stream, which aborts the receive task and
/// releases the room's listener entry.
async fn stream_room(Path(room): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    if let Err(reason) = registry::validate_room_name(&room) {
        return (StatusCode::BAD_REQUEST, reason).into_response();
    }

    let stream = state.registry.room(&room);
    metrics::set_active_rooms(state.registry.room_count());
    debug!(room = %room, "subscriber connected");

    let (tx, rx) = mpsc::unbounded_channel::<Bytes>();
    let worker = tokio::spawn(async move {
        stream
            .receive(move |message| tx.send(render_line(&message)).is_ok())
            .await;
    });

    let guards = (AbortOnDrop(worker), SubscriberMetricsGuard::new());
    let body = Body::from_stream(unfold((rx, guards), |(mut rx, guards)| async move {
        let chunk = rx.recv().await?;
        metrics::record_message(chunk.len(), "delivered");
        Some((Ok::<_, Infallible>(chunk), (rx, guards)))
    }));

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

/// List workspace names.
async fn list_workspaces(State(state): State<Arc<AppState>>) -> Response {
    match state.workspaces.workspaces().await {
        Ok(names) => Json(json!({ "workspaces": names })).into_response(),
        Err(e) => workspace_error(e),
    }
}

/// List the files of one workspace.
async fn list_files(
    Path(workspace): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.workspaces.files(&workspace).await {
        Ok(files) => Json(json!({ "workspace": workspace, "files": files })).into_response(),
        Err(e) => workspace_error(e),
    }
}

/// Fetch one file's contents.
async fn fetch_file(
    Path((workspace, file)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.workspaces.read_file(&workspace, &file).await {
        Ok(contents) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            contents,
        )
            .into_response(),
        Err(e) => workspace_error(e),
    }
}

fn workspace_error(err: WorkspaceError) -> Response {
    match err {
        WorkspaceError::InvalidName(_) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        WorkspaceError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
        WorkspaceError::Io(e) => {
            warn!(error = %e, "workspace I/O error");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

//! HTTP transports: SSE mode and streamable HTTP mode.
//!
//! Both modes drive the same [`McpSession`] dispatch as the stdio loop; only
//! the connection model differs.
//!
//! - **SSE mode**: `GET /sse` opens a long-lived event stream and announces a
//!   companion message path; the client POSTs JSON-RPC to
//!   `/messages/?session_id=...` and responses ride the stream.
//! - **Streamable HTTP mode**: one logical session multiplexed over
//!   request/response pairs at the root path. `initialize` mints an
//!   `Mcp-Session-Id`; every outbound message is recorded in the
//!   [`EventStore`] so a reconnecting client can resume with `Last-Event-ID`.
//!
//! Both modes expose `GET /health`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::io;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::header::HeaderMap;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::mcp::event_store::{EventMessage, EventStore};
use crate::mcp::protocol::{parse_value, JsonRpcError, JsonRpcResponse};
use crate::mcp::server::McpSession;
use crate::tools::ToolRegistry;

/// Header carrying the streamable HTTP session id.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Header carrying the last event id seen by a resuming client.
const LAST_EVENT_ID_HEADER: &str = "last-event-id";

/// Static facts reported by `GET /health`.
#[derive(Debug, Clone)]
struct HealthInfo {
    mode: &'static str,
    port: u16,
    endpoint: String,
}

impl HealthInfo {
    fn body(&self) -> Value {
        json!({
            "status": "healthy",
            "mode": self.mode,
            "port": self.port,
            "endpoint": self.endpoint,
        })
    }
}

/// Error representation for HTTP responses outside the JSON-RPC envelope.
#[derive(Debug)]
struct McpHttpError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl McpHttpError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for McpHttpError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

/// Serialises a session reply for transmission.
fn reply_to_value(reply: &Result<JsonRpcResponse, JsonRpcError>) -> Value {
    match reply {
        Ok(resp) => serde_json::to_value(resp).unwrap_or_else(|_| json!({})),
        Err(err) => serde_json::to_value(err).unwrap_or_else(|_| json!({})),
    }
}

// =============================================================================
// SSE mode
// =============================================================================

/// One SSE connection: a session plus the channel feeding its event stream.
struct SseSession {
    session: Mutex<McpSession>,
    tx: mpsc::UnboundedSender<Value>,
}

/// Shared state for the SSE application.
#[derive(Clone)]
pub struct SseState {
    registry: Arc<ToolRegistry>,
    sessions: Arc<RwLock<HashMap<String, Arc<SseSession>>>>,
    health: HealthInfo,
}

impl SseState {
    /// Builds SSE-mode state.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, settings: &Settings, port: u16) -> Self {
        Self {
            registry,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            health: HealthInfo {
                mode: "SSE",
                port,
                endpoint: settings.endpoint.clone(),
            },
        }
    }
}

/// Removes the session from the shared map when the event stream drops.
struct SessionGuard {
    sessions: Arc<RwLock<HashMap<String, Arc<SseSession>>>>,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(&self.id);
        }
        info!(session = %self.id, "SSE connection closed");
    }
}

/// Builds the SSE-mode router.
#[must_use]
pub fn sse_app(state: SseState) -> Router {
    Router::new()
        .route("/sse", get(handle_sse_connect))
        .route("/messages/", post(handle_sse_message))
        .route("/health", get(sse_health))
        .with_state(state)
}

async fn sse_health(State(state): State<SseState>) -> Json<Value> {
    Json(state.health.body())
}

/// Opens a new SSE connection and session.
///
/// The first frame is an `endpoint` event naming the companion message path
/// for this session; every subsequent frame is a protocol message.
async fn handle_sse_connect(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::unbounded_channel();

    let session = Arc::new(SseSession {
        session: Mutex::new(McpSession::new(Arc::clone(&state.registry))),
        tx,
    });
    state
        .sessions
        .write()
        .expect("SSE session map lock poisoned")
        .insert(session_id.clone(), session);

    info!(session = %session_id, "new SSE connection established");

    let endpoint_event =
        Event::default()
            .event("endpoint")
            .data(format!("/messages/?session_id={session_id}"));

    let guard = SessionGuard {
        sessions: Arc::clone(&state.sessions),
        id: session_id,
    };

    let messages = UnboundedReceiverStream::new(rx).map(move |message: Value| {
        // The guard lives inside the stream; dropping the stream drops the
        // session.
        let _keep = &guard;
        Ok(Event::default().event("message").data(message.to_string()))
    });

    let stream =
        futures::stream::once(async move { Ok::<_, Infallible>(endpoint_event) }).chain(messages);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    )
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    session_id: String,
}

/// Accepts one client-to-server message for an SSE session.
///
/// The reply (success or JSON-RPC error) travels down the session's event
/// stream; the POST itself is acknowledged with 202 Accepted.
async fn handle_sse_message(
    State(state): State<SseState>,
    Query(query): Query<MessagesQuery>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, McpHttpError> {
    let session = state
        .sessions
        .read()
        .expect("SSE session map lock poisoned")
        .get(&query.session_id)
        .cloned()
        .ok_or_else(|| McpHttpError::not_found("unknown_session", "Session not found"))?;

    let msg = parse_value(&payload).map_err(|e| {
        warn!(session = %query.session_id, code = e.error.code, "rejected SSE message");
        McpHttpError::bad_request("invalid_message", e.error.message)
    })?;

    let reply = {
        let mut mcp = session.session.lock().await;
        mcp.handle_message(msg).await
    };

    if let Some(reply) = reply {
        // A send failure means the event stream already disconnected; the
        // in-flight reply is dropped, matching fire-and-forget semantics.
        let _ = session.tx.send(reply_to_value(&reply));
    }

    Ok(StatusCode::ACCEPTED)
}

/// Runs the SSE-mode server until shutdown.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run_sse(
    registry: Arc<ToolRegistry>,
    settings: &Settings,
    port: u16,
) -> io::Result<()> {
    let state = SseState::new(registry, settings, port);
    let app = sse_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "SSE mode listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

// =============================================================================
// Streamable HTTP mode
// =============================================================================

/// One negotiated streamable session: dispatch state plus the live channel
/// tailed by `GET /`.
struct StreamableSession {
    session: Mutex<McpSession>,
    tx: broadcast::Sender<EventMessage>,
}

/// The streamable-HTTP session manager.
///
/// Owns the session map and the event store. Created when the mode starts,
/// dropped (clearing every session) when the server shuts down.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<StreamableSession>>>,
    event_store: EventStore,
}

impl SessionManager {
    fn new() -> Self {
        info!("session manager started");
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_store: EventStore::new(),
        }
    }

    fn create_session(&self, registry: Arc<ToolRegistry>) -> (String, Arc<StreamableSession>) {
        let id = Uuid::new_v4().to_string();
        let (tx, _rx) = broadcast::channel(64);
        let session = Arc::new(StreamableSession {
            session: Mutex::new(McpSession::new(registry)),
            tx,
        });
        self.sessions
            .write()
            .expect("session map lock poisoned")
            .insert(id.clone(), Arc::clone(&session));
        info!(session = %id, "created streamable session");
        (id, session)
    }

    fn get_session(&self, id: &str) -> Option<Arc<StreamableSession>> {
        self.sessions
            .read()
            .expect("session map lock poisoned")
            .get(id)
            .cloned()
    }

    /// Records an outbound message under the session's stream and offers it
    /// to any live subscriber.
    fn publish(&self, session_id: &str, session: &StreamableSession, message: Value) {
        let event_id = self.event_store.store_event(session_id, message.clone());
        let _ = session.tx.send(EventMessage { event_id, message });
    }

    /// Releases every session. Called on shutdown.
    fn stop(&self) {
        self.sessions
            .write()
            .expect("session map lock poisoned")
            .clear();
        info!("session manager stopped");
    }
}

/// Shared state for the streamable HTTP application.
#[derive(Clone)]
pub struct StreamableState {
    registry: Arc<ToolRegistry>,
    manager: Arc<SessionManager>,
    health: HealthInfo,
}

impl StreamableState {
    /// Builds streamable-mode state with a fresh session manager.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, settings: &Settings, port: u16) -> Self {
        Self {
            registry,
            manager: Arc::new(SessionManager::new()),
            health: HealthInfo {
                mode: "StreamableHTTP",
                port,
                endpoint: settings.endpoint.clone(),
            },
        }
    }
}

/// Builds the streamable-mode router, mounted at the root path.
#[must_use]
pub fn streamable_app(state: StreamableState) -> Router {
    Router::new()
        .route("/", post(handle_streamable_post).get(handle_streamable_get))
        .route("/health", get(streamable_health))
        .with_state(state)
}

async fn streamable_health(State(state): State<StreamableState>) -> Json<Value> {
    Json(state.health.body())
}

/// Handles one JSON-RPC message POSTed to the streamable endpoint.
async fn handle_streamable_post(
    State(state): State<StreamableState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Response, McpHttpError> {
    let msg = parse_value(&payload)
        .map_err(|e| McpHttpError::bad_request("invalid_message", e.error.message))?;

    // initialize creates the session; everything else must present its id.
    let (session_id, session) = if msg.method() == "initialize" {
        state.manager.create_session(Arc::clone(&state.registry))
    } else {
        let id = session_id_header(&headers)?;
        let session = state
            .manager
            .get_session(&id)
            .ok_or_else(|| McpHttpError::not_found("unknown_session", "Session not found"))?;
        (id, session)
    };

    let reply = {
        let mut mcp = session.session.lock().await;
        mcp.handle_message(msg).await
    };

    match reply {
        Some(reply) => {
            let body = reply_to_value(&reply);
            state.manager.publish(&session_id, &session, body.clone());

            let response = (
                StatusCode::OK,
                [(MCP_SESSION_ID_HEADER, session_id)],
                Json(body),
            );
            Ok(response.into_response())
        }
        // Notifications are acknowledged without a body.
        None => Ok(StatusCode::ACCEPTED.into_response()),
    }
}

/// Opens the SSE channel of a streamable session, replaying missed events.
async fn handle_streamable_get(
    State(state): State<StreamableState>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, McpHttpError> {
    let session_id = session_id_header(&headers)?;
    let session = state
        .manager
        .get_session(&session_id)
        .ok_or_else(|| McpHttpError::not_found("unknown_session", "Session not found"))?;

    // Subscribe before replaying so nothing published in between is lost;
    // duplicates are preferable to gaps for resumability.
    let rx = session.tx.subscribe();

    let mut backlog = Vec::new();
    if let Some(last_event_id) = headers
        .get(LAST_EVENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        let stream_id = state
            .manager
            .event_store
            .replay_events_after(last_event_id, |event| backlog.push(event));
        if stream_id.is_none() {
            return Err(McpHttpError::not_found(
                "unknown_event",
                format!("Event {last_event_id} not found in any stream"),
            ));
        }
    }

    let backlog_stream =
        futures::stream::iter(backlog.into_iter().map(event_to_sse)).map(Ok::<_, Infallible>);

    let live_stream = BroadcastStream::new(rx)
        .filter_map(|result| async move {
            match result {
                Ok(event) => Some(event_to_sse(event)),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    let warning = Event::default()
                        .event("warning")
                        .data(format!("{{\"message\":\"dropped {skipped} events\"}}"));
                    Some(warning)
                }
            }
        })
        .map(Ok::<_, Infallible>);

    let stream = backlog_stream.chain(live_stream);

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    ))
}

fn session_id_header(headers: &HeaderMap) -> Result<String, McpHttpError> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .ok_or_else(|| {
            McpHttpError::bad_request("missing_session", "Mcp-Session-Id header is required")
        })?
        .to_str()
        .map(ToString::to_string)
        .map_err(|_| {
            McpHttpError::bad_request("invalid_session", "Mcp-Session-Id must be valid UTF-8")
        })
}

fn event_to_sse(event: EventMessage) -> Event {
    Event::default()
        .id(event.event_id)
        .data(event.message.to_string())
}

/// Runs the streamable-HTTP server until shutdown, then releases sessions.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run_streamable_http(
    registry: Arc<ToolRegistry>,
    settings: &Settings,
    port: u16,
) -> io::Result<()> {
    let state = StreamableState::new(registry, settings, port);
    let manager = Arc::clone(&state.manager);
    let app = streamable_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "streamable HTTP mode listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    manager.stop();
    result
}

/// Resolves when the process receives a termination signal.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl+C handler");
    }
}

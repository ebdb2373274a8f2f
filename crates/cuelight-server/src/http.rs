//! HTTP and WebSocket surface.
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | `/api/cues` | GET | `{"cues":[...],"count":N}` |
//! | `/api/cues/trigger` | POST | form `cue`, optional `text` |
//! | `/api/cues/release` | POST | form `cue` |
//! | `/api/cues/snapshot` | POST | push a full snapshot to every observer |
//! | `/save_wifi` | POST | form `ssid`, `password`; restarts on success |
//! | `/api/health` | GET | `{"status":"ok"}` |
//! | `/ws` | GET | duplex observer channel |
//!
//! Every response carries `Cache-Control: no-store` and a wildcard CORS
//! origin. Unknown paths get 404 `Not found`.

use std::{sync::Arc, time::Duration};

use axum::{
    Form, Json, Router,
    extract::{
        State, WebSocketUpgrade,
        rejection::FormRejection,
        ws::{Message, WebSocket},
    },
    http::{
        HeaderValue, StatusCode,
        header::CACHE_CONTROL,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cuelight_core::{CommandError, ObserverId, Store, credentials, error::CredentialsError};
use cuelight_proto::InboundFrame;
use futures::{SinkExt, StreamExt, stream::SplitSink};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use tracing::{debug, info, warn};

use crate::runtime::Handle;

/// Delay between answering a credential save and restarting.
pub const RESTART_GRACE: Duration = Duration::from_millis(100);

/// Why the serving surface stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// New credentials were saved; bootstrap again
    Restart,
    /// Process is shutting down
    Shutdown,
}

/// Shared state passed to all request handlers.
#[derive(Clone)]
pub struct AppState {
    runtime: Handle,
    store: Arc<dyn Store>,
    exit: watch::Sender<Option<Exit>>,
    restart_grace: Duration,
}

impl AppState {
    /// Handlers talk to `runtime` and save credentials to `store`; a
    /// successful save publishes [`Exit::Restart`] on `exit`.
    pub fn new(runtime: Handle, store: Arc<dyn Store>, exit: watch::Sender<Option<Exit>>) -> Self {
        Self { runtime, store, exit, restart_grace: RESTART_GRACE }
    }
}

/// Build the router with every endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/cues", get(list_cues))
        .route("/api/cues/trigger", post(trigger_cue))
        .route("/api/cues/release", post(release_cue))
        .route("/api/cues/snapshot", post(push_snapshot))
        .route("/save_wifi", post(save_wifi))
        .route("/api/health", get(health))
        .route("/ws", get(websocket))
        .fallback(not_found)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CueForm {
    cue: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WifiForm {
    ssid: Option<String>,
    password: Option<String>,
}

fn text(status: StatusCode, body: &'static str) -> Response {
    (status, body).into_response()
}

fn unavailable() -> Response {
    text(StatusCode::SERVICE_UNAVAILABLE, "Controller unavailable")
}

/// Parse the `cue` field. `Err` carries the 400 body.
fn cue_param(
    form: Result<Form<CueForm>, FormRejection>,
) -> Result<(i64, Option<String>), &'static str> {
    let Ok(Form(CueForm { cue: Some(raw), text: label })) = form else {
        return Err("Missing cue parameter");
    };
    let cue = raw.trim().parse::<i64>().map_err(|_| "Invalid cue index")?;
    Ok((cue, label))
}

fn command_response(outcome: Option<Result<(), CommandError>>) -> Response {
    match outcome {
        Some(Ok(())) => text(StatusCode::OK, "OK"),
        Some(Err(CommandError::InvalidCueIndex)) => {
            text(StatusCode::BAD_REQUEST, "Invalid cue index")
        },
        None => unavailable(),
    }
}

async fn list_cues(State(state): State<AppState>) -> Response {
    match state.runtime.list().await {
        Some(list) => Json(list).into_response(),
        None => unavailable(),
    }
}

async fn trigger_cue(
    State(state): State<AppState>,
    form: Result<Form<CueForm>, FormRejection>,
) -> Response {
    let (cue, label) = match cue_param(form) {
        Ok(parsed) => parsed,
        Err(body) => return text(StatusCode::BAD_REQUEST, body),
    };
    // An empty label leaves the current one alone.
    let label = label.filter(|label| !label.is_empty());
    command_response(state.runtime.trigger(Some(cue), label).await)
}

async fn release_cue(
    State(state): State<AppState>,
    form: Result<Form<CueForm>, FormRejection>,
) -> Response {
    let (cue, _) = match cue_param(form) {
        Ok(parsed) => parsed,
        Err(body) => return text(StatusCode::BAD_REQUEST, body),
    };
    command_response(state.runtime.release(Some(cue)).await)
}

async fn push_snapshot(State(state): State<AppState>) -> Response {
    if state.runtime.snapshot().await {
        text(StatusCode::OK, "OK")
    } else {
        unavailable()
    }
}

async fn save_wifi(
    State(state): State<AppState>,
    form: Result<Form<WifiForm>, FormRejection>,
) -> Response {
    let Ok(Form(WifiForm { ssid: Some(ssid), password: Some(password) })) = form else {
        return text(StatusCode::BAD_REQUEST, "Missing credentials");
    };

    match credentials::save(state.store.as_ref(), &ssid, &password) {
        Ok(_) => {},
        Err(CredentialsError::EmptySsid) => {
            return text(StatusCode::BAD_REQUEST, "Missing credentials");
        },
        Err(error @ CredentialsError::Store(_)) => {
            warn!(%error, "failed to save credentials");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Unable to persist credentials");
        },
    }

    let exit = state.exit.clone();
    let grace = state.restart_grace;
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        info!("restarting with new credentials");
        exit.send_replace(Some(Exit::Restart));
    });
    text(StatusCode::OK, "Credentials saved. Rebooting...")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found() -> Response {
    text(StatusCode::NOT_FOUND, "Not found")
}

async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| observer_session(socket, state.runtime))
}

/// One duplex observer, from upgrade to close.
async fn observer_session(socket: WebSocket, runtime: Handle) {
    let Some((observer, outbox)) = runtime.connect().await else {
        return;
    };
    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(forward_outbox(observer, outbox, sink));

    while let Some(received) = stream.next().await {
        let frame = match received {
            Ok(Message::Text(payload)) => InboundFrame::text(payload.as_str()),
            Ok(Message::Binary(payload)) => InboundFrame::binary(payload.to_vec()),
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Err(error) => {
                debug!(observer, %error, "socket read failed");
                break;
            },
        };
        if !runtime.frame(observer, frame).await {
            break;
        }
    }

    runtime.disconnect(observer).await;
    writer.abort();
}

/// Copy queued messages to the socket. When the runtime drops the outbox
/// (observer disconnected, stalled, or runtime stopped) the socket is
/// closed.
async fn forward_outbox(
    observer: ObserverId,
    mut outbox: mpsc::Receiver<String>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    while let Some(json) = outbox.recv().await {
        if let Err(error) = sink.send(Message::Text(json.into())).await {
            debug!(observer, %error, "socket write failed");
            return;
        }
    }
    let _ = sink.send(Message::Close(None)).await;
}

//! WebSocket session loop.
//!
//! Each connected client gets one task that repeats
//! receive frame -> analyze -> send outcome until the client goes away.
//! There is exactly one frame in flight per session and no queueing; a slow
//! analysis only delays that client's next receive.

use std::fmt::Display;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use gazewatch_models::AnalysisOutcome;
use gazewatch_vision::FrameAnalyzer;
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::state::AppState;

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Close frame or end of stream
    ClientDisconnected,
    /// Receive or send failed
    TransportError(String),
}

impl SessionEnd {
    fn as_str(&self) -> &'static str {
        match self {
            SessionEnd::ClientDisconnected => "disconnected",
            SessionEnd::TransportError(_) => "transport_error",
        }
    }
}

/// Inbound frame payload.
enum Frame {
    /// Base64 text, optionally data-URI prefixed
    Text(String),
    /// Raw encoded image bytes
    Binary(Vec<u8>),
}

impl Frame {
    fn kind(&self) -> &'static str {
        match self {
            Frame::Text(_) => "text",
            Frame::Binary(_) => "binary",
        }
    }
}

/// WebSocket analysis endpoint: `GET /ws/:client_id`.
pub async fn ws_analyze(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    if !origin_allowed(&state.config.cors_origins, headers.get(header::ORIGIN)) {
        warn!(client_id = %client_id, "Rejected WebSocket upgrade from disallowed origin");
        return StatusCode::FORBIDDEN.into_response();
    }

    let analyzer = state.analyzer.clone();

    ws.on_upgrade(move |socket| async move {
        let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_ws_active_connections(count);
        metrics::record_ws_connection();

        let (sender, receiver) = socket.split();
        run_session(&client_id, receiver, sender, analyzer).await;

        let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_ws_active_connections(count);
    })
}

/// Whether an upgrade with this `Origin` header may proceed.
///
/// Requests without an `Origin` (non-browser clients) are always accepted.
pub fn origin_allowed(origins: &[String], origin: Option<&HeaderValue>) -> bool {
    if origins.iter().any(|o| o == "*") {
        return true;
    }
    match origin {
        None => true,
        Some(value) => value
            .to_str()
            .map(|v| origins.iter().any(|o| o == v))
            .unwrap_or(false),
    }
}

/// Drive one client session until it disconnects or the transport fails.
///
/// Every text or binary message yields exactly one JSON outcome.
pub async fn run_session<R, W, E>(
    client_id: &str,
    mut receiver: R,
    mut sender: W,
    analyzer: FrameAnalyzer,
) -> SessionEnd
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    info!(client_id = %client_id, "Client connected");

    let end = loop {
        let frame = match receiver.next().await {
            Some(Ok(Message::Text(text))) => Frame::Text(text),
            Some(Ok(Message::Binary(bytes))) => Frame::Binary(bytes),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break SessionEnd::ClientDisconnected,
            Some(Err(e)) => break SessionEnd::TransportError(e.to_string()),
        };

        metrics::record_frame_received(frame.kind());

        let start = Instant::now();
        let outcome = analyze_frame(&analyzer, frame).await;
        metrics::record_outcome(&outcome, start.elapsed().as_secs_f64());

        debug!(
            client_id = %client_id,
            status = outcome.status.as_str(),
            emotion = %outcome.emotion,
            gaze_alert = outcome.gaze_alert,
            duration_ms = start.elapsed().as_millis() as u64,
            "Frame analyzed"
        );

        if let Err(e) = sender.send(Message::Text(encode_outcome(&outcome))).await {
            break SessionEnd::TransportError(e.to_string());
        }
    };

    match &end {
        SessionEnd::ClientDisconnected => info!(client_id = %client_id, "Client disconnected"),
        SessionEnd::TransportError(e) => {
            warn!(client_id = %client_id, error = %e, "Connection error")
        }
    }
    metrics::record_session_ended(end.as_str());

    end
}

/// Reply sent when an outcome cannot be serialized.
const ENCODE_FAILED_REPLY: &str =
    r#"{"status":"error","emotion":"Neutral","gaze_alert":false,"debug_msg":"Outcome encoding failed"}"#;

/// Serialize an outcome, falling back to a fixed error reply.
fn encode_outcome(outcome: &AnalysisOutcome) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialize outcome");
        ENCODE_FAILED_REPLY.to_string()
    })
}

/// Run the analyzer on the blocking pool. A panic inside the analysis is
/// reported as an error outcome.
async fn analyze_frame(analyzer: &FrameAnalyzer, frame: Frame) -> AnalysisOutcome {
    let analyzer = analyzer.clone();
    let task = tokio::task::spawn_blocking(move || match frame {
        Frame::Text(text) => analyzer.analyze(&text),
        Frame::Binary(bytes) => analyzer.analyze_bytes(&bytes),
    });

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Analysis task failed");
            AnalysisOutcome::error(format!("Analysis task failed: {e}"))
        }
    }
}

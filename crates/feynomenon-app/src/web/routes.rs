use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message as WsMessage, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use colored::Colorize;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use feynomenon_tutor::{SessionId, TutorError, TutorService};

use crate::web::protocol::{
    ChatRequest, ChatResponse, ClientMessage, ServerMessage, SessionStateResponse,
};

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub tutor: TutorService,
}

/// Create router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/session/:session_id/state", get(session_state))
        .route("/session/:session_id", delete(delete_session))
        .route("/health", get(health))
        // WebSocket endpoint
        .route("/ws/:session_id", get(websocket_handler))
        .with_state(state)
}

/// POST /chat - Send a message, creating a session when needed
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;

    // Unknown or missing ids start a fresh session and get the greeting.
    let known = match request.session_id {
        Some(id) => {
            let id = SessionId::from(id);
            state.tutor.contains(&id).await.then_some(id)
        }
        None => None,
    };
    let Some(session_id) = known else {
        let created = state.tutor.create().await;
        println!("{} Session {} created", "✨".bright_green(), created.session_id);
        return Ok(Json(ChatResponse::greeting(created)));
    };

    let outcome = state.tutor.submit_message(&session_id, &request.message).await?;
    if outcome.session_ended() {
        println!("{} Session {} ended by learner", "👋".bright_cyan(), session_id);
    }
    Ok(Json(ChatResponse::from_outcome(session_id, outcome)))
}

/// GET /session/:session_id/state
async fn session_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStateResponse>, AppError> {
    let session_id = SessionId::from(session_id);
    let session_state = state.tutor.state(&session_id).await?;
    Ok(Json(SessionStateResponse::new(session_id, session_state)))
}

/// DELETE /session/:session_id
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.tutor.delete(&SessionId::from(session_id)).await?;
    Ok(Json(serde_json::json!({ "message": "Session deleted successfully" })))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "active_sessions": state.tutor.session_count().await,
    }))
}

/// GET /ws/:session_id - WebSocket endpoint
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, state, SessionId::from(session_id)))
}

type WsSink = SplitSink<WebSocket, WsMessage>;

async fn send_frame(sink: &mut WsSink, message: &ServerMessage) -> anyhow::Result<()> {
    let json = serde_json::to_string(message)?;
    sink.send(WsMessage::Text(json)).await?;
    Ok(())
}

/// Handle WebSocket connection. The session lives as long as the socket.
async fn handle_websocket(socket: WebSocket, state: AppState, session_id: SessionId) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    if let Some(created) = state.tutor.get_or_create(session_id.clone()).await {
        println!("{} WebSocket session {} created", "✨".bright_green(), session_id);
        if send_frame(&mut ws_sink, &ServerMessage::greeting(created.greeting)).await.is_err() {
            close_session(&state, &session_id).await;
            return;
        }
    }

    // Reader runs separately so a disconnect is noticed while a model call
    // is still in flight.
    let cancel = CancellationToken::new();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();
    let reader_cancel = cancel.clone();
    let reader = tokio::spawn(async move {
        while let Some(Ok(frame)) = ws_stream.next().await {
            match frame {
                WsMessage::Text(text) => {
                    if frame_tx.send(text).is_err() {
                        break;
                    }
                }
                WsMessage::Close(_) => break,
                _ => {}
            }
        }
        reader_cancel.cancel();
    });

    loop {
        let text = tokio::select! {
            _ = cancel.cancelled() => break,
            next = frame_rx.recv() => match next {
                Some(text) => text,
                None => break,
            },
        };

        let message = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(message) => message,
            Err(e) => {
                eprintln!("❌ Failed to parse WebSocket frame: {} - Error: {}", text, e);
                let frame = ServerMessage::Error {
                    message: format!("invalid message: {}", e),
                    recoverable: true,
                };
                if send_frame(&mut ws_sink, &frame).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = state.tutor.submit_message(&session_id, &message.message) => result,
        };

        match result {
            Ok(outcome) => {
                let ended = outcome.session_ended();
                if send_frame(&mut ws_sink, &ServerMessage::from_outcome(outcome)).await.is_err() {
                    break;
                }
                if ended {
                    println!("{} Session {} ended by learner", "👋".bright_cyan(), session_id);
                    let _ = ws_sink.send(WsMessage::Close(None)).await;
                    break;
                }
            }
            Err(e) => {
                eprintln!("{} Session {}: {}", "❌".bright_red(), session_id, e);
                // Upstream failures leave the session usable; anything else
                // means it is gone or broken.
                let recoverable = !e.is_client_error();
                let frame = ServerMessage::Error {
                    message: e.to_string(),
                    recoverable,
                };
                if send_frame(&mut ws_sink, &frame).await.is_err() {
                    break;
                }
                if !recoverable {
                    let _ = ws_sink.send(WsMessage::Close(None)).await;
                    break;
                }
            }
        }
    }

    reader.abort();
    close_session(&state, &session_id).await;
}

async fn close_session(state: &AppState, session_id: &SessionId) {
    if state.tutor.delete(session_id).await.is_ok() {
        println!("{} WebSocket session {} closed", "🔌".bright_blue(), session_id);
    }
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    Tutor(TutorError),
    BadRequest(String),
}

impl From<TutorError> for AppError {
    fn from(err: TutorError) -> Self {
        AppError::Tutor(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Tutor(TutorError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Session not found".to_string())
            }
            AppError::Tutor(err @ TutorError::InvalidState(_)) => (StatusCode::CONFLICT, err.to_string()),
            AppError::Tutor(err @ TutorError::Remote(_)) => {
                eprintln!("{} {}", "❌".bright_red(), err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

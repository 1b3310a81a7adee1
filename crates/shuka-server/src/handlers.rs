//! HTTP/WebSocket Handlers

use axum::{
    Json,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::Response,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use serde::{Deserialize, Serialize};

use shuka_core::{
    AgentError, CancellationToken, ChatReply, Conversation, ConversationHeader, ConversationMessage, Language,
    ProviderKind, TurnEvents, TurnStatus,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: ProviderKind,
    pub model: String,
    pub mock_data: bool,
    pub configured: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub message: ConversationMessage,
    #[serde(flatten)]
    pub status: TurnStatus,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            conversation_id: reply.conversation.id,
            message: reply.message,
            status: reply.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map an agent error to an HTTP status and a localized body
fn api_error(err: &AgentError, language: Language) -> ApiError {
    let (status, code) = match err {
        AgentError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "CONFIG_ERROR"),
        AgentError::Busy(_) => (StatusCode::CONFLICT, "TURN_IN_FLIGHT"),
        AgentError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        AgentError::Store(_) => (StatusCode::BAD_GATEWAY, "STORE_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(language),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.settings.provider,
        model: state.settings.active_model().to_string(),
        mock_data: state.settings.use_mock_data,
        configured: state.settings.validate().is_ok(),
    })
}

/// Main chat endpoint (non-streaming)
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let reply = state
        .chat
        .send(
            payload.conversation_id.as_deref(),
            &payload.message,
            TurnEvents::none(),
            CancellationToken::new(),
        )
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "chat request rejected");
            api_error(&e, state.chat.language())
        })?;

    Ok(Json(reply.into()))
}

/// Stop the turn running for a conversation
pub async fn cancel_handler(State(state): State<AppState>, Path(id): Path<String>) -> Json<CancelResponse> {
    let cancelled = state.chat.cancel(&id);
    tracing::info!(conversation = %id, cancelled, "cancel requested");
    Json(CancelResponse { cancelled })
}

pub async fn list_conversations(State(state): State<AppState>) -> Json<Vec<ConversationHeader>> {
    Json(state.chat.store().list().await)
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, StatusCode> {
    state
        .chat
        .store()
        .get(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Delete failures are reported so the client keeps the item
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .chat
        .store()
        .delete(&id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| {
            let (_, body) = api_error(&e, state.chat.language());
            (StatusCode::BAD_GATEWAY, body)
        })
}

// ============================================================================
// WebSocket
// ============================================================================

/// Client frame: a chat request or `{"type":"cancel"}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClientFrame {
    Chat(ChatRequest),
    Control {
        #[serde(rename = "type")]
        kind: String,
    },
}

/// Turn epilogue; step and source events go out as bare [`shuka_core::TurnEvent`]s
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame<'a> {
    Done(&'a ChatResponse),
    Error { error: String, code: String },
}

type WsSender = SplitSink<WebSocket, Message>;

async fn send_frame<T: Serialize>(sender: &mut WsSender, frame: &T) -> bool {
    match serde_json::to_string(frame) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode frame");
            false
        }
    }
}

async fn send_error(sender: &mut WsSender, err: ApiError) -> bool {
    let (_, Json(body)) = err;
    send_frame(
        sender,
        &ServerFrame::Error {
            error: body.error,
            code: body.code,
        },
    )
    .await
}

/// WebSocket streaming chat
pub async fn chat_stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let language = state.chat.language();

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            _ => continue,
        };

        let request = match serde_json::from_str::<ClientFrame>(text.as_str()) {
            Ok(ClientFrame::Chat(request)) => request,
            // Nothing is running between turns
            Ok(ClientFrame::Control { .. }) => continue,
            Err(e) => {
                let err = AgentError::InvalidRequest(e.to_string());
                if !send_error(&mut sender, api_error(&err, language)).await {
                    break;
                }
                continue;
            }
        };

        let cancel = CancellationToken::new();
        let (events, mut rx) = TurnEvents::channel();
        let chat = state.chat.clone();
        let token = cancel.clone();
        let mut turn = tokio::spawn(async move {
            chat.send(request.conversation_id.as_deref(), &request.message, events, token)
                .await
        });

        let mut closed = false;
        let result = loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    if !send_frame(&mut sender, &event).await {
                        cancel.cancel();
                    }
                }
                frame = receiver.next(), if !closed => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if matches!(serde_json::from_str::<ClientFrame>(text.as_str()), Ok(ClientFrame::Control { kind }) if kind == "cancel") {
                            tracing::info!("turn cancelled over WebSocket");
                            cancel.cancel();
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => {
                        closed = true;
                        cancel.cancel();
                    }
                    Some(Ok(_)) => {}
                },
                joined = &mut turn => break joined,
            }
        };

        if closed {
            break;
        }
        while let Ok(event) = rx.try_recv() {
            send_frame(&mut sender, &event).await;
        }

        let delivered = match result {
            Ok(Ok(reply)) => send_frame(&mut sender, &ServerFrame::Done(&reply.into())).await,
            Ok(Err(e)) => send_error(&mut sender, api_error(&e, language)).await,
            Err(e) => {
                tracing::error!(error = %e, "turn task failed");
                let err = AgentError::Other(e.to_string());
                send_error(&mut sender, api_error(&err, language)).await
            }
        };
        if !delivered {
            break;
        }
    }
}

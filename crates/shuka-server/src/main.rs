//! shuka HTTP Server
//!
//! Axum-based server providing REST and WebSocket endpoints for the
//! scripture study agent.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shuka_backend::{HttpConversationStore, build_search};
use shuka_core::{AgentBuilder, ChatService, ConversationStore, MemoryConversationStore, Settings};
use shuka_runtime::build_provider;

use crate::handlers::{
    cancel_handler, chat_handler, chat_stream_handler, delete_conversation, get_conversation, health_check,
    list_conversations,
};
use crate::state::AppState;

/// Wire the agent, its collaborators and the store from settings
fn build_state(settings: Settings) -> anyhow::Result<AppState> {
    let provider = build_provider(&settings)?;
    let search = build_search(&settings)?;

    let store: Arc<dyn ConversationStore> = if settings.use_mock_data {
        tracing::info!("conversations are kept in memory");
        Arc::new(MemoryConversationStore::new())
    } else {
        Arc::new(HttpConversationStore::from_settings(&settings)?)
    };

    let agent = AgentBuilder::new()
        .settings(&settings)
        .provider(provider)
        .search(search)
        .build()?;

    let chat = ChatService::new(Arc::new(agent), store, settings.history_window);

    Ok(AppState {
        chat: Arc::new(chat),
        settings: Arc::new(settings),
    })
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        // Agent API
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", get(chat_stream_handler))
        .route("/api/chat/{id}/cancel", post(cancel_handler))
        // Conversation history
        .route("/api/conversations", get(list_conversations))
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let settings = Settings::from_env();
    match settings.validate() {
        Ok(()) => tracing::info!(
            provider = ?settings.provider,
            model = settings.active_model(),
            "✓ provider configured"
        ),
        Err(e) => {
            tracing::warn!("⚠ {e} - chat requests will be rejected");
            tracing::warn!("  Set GOOGLE_API_KEY or OPENROUTER_API_KEY in .env");
        }
    }
    if settings.use_mock_data {
        tracing::info!("mock data enabled - search and history stay offline");
    }

    let app = router(build_state(settings)?);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("shuka server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                  - Health check");
    tracing::info!("  POST   /api/chat                - Send message");
    tracing::info!("  GET    /api/chat/stream         - WebSocket streaming");
    tracing::info!("  POST   /api/chat/{{id}}/cancel    - Stop a running turn");
    tracing::info!("  GET    /api/conversations       - List conversations");
    tracing::info!("  GET    /api/conversations/{{id}}  - Load a conversation");
    tracing::info!("  DELETE /api/conversations/{{id}}  - Delete a conversation");

    axum::serve(listener, app).await?;

    Ok(())
}

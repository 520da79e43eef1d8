//! HTTP API server for integration with other systems.
//!
//! Exposes the tutor over REST so web frontends can hold sessions against
//! the same index the CLI uses.

use crate::bootstrap::{BootstrapConfig, Tutor};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::{ChatTurn, TutorSession};
use crate::vector_store::IndexedSource;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// A session shared between handlers. The inner mutex serializes turns per
/// session while leaving other sessions free to proceed.
type SharedSession = Arc<Mutex<TutorSession>>;

/// Shared application state.
struct AppState {
    tutor: Arc<Tutor>,
    sessions: Mutex<HashMap<Uuid, SharedSession>>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docent doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let config = BootstrapConfig::from_settings(&settings)?;
    let spinner = if config.index_path.exists() {
        Output::spinner("Loading course index...")
    } else {
        Output::spinner("Reading course materials and building the index...")
    };

    let tutor = match Tutor::bootstrap(config).await {
        Ok(tutor) => {
            spinner.finish_and_clear();
            tutor
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    let state = Arc::new(AppState {
        tutor,
        sessions: Mutex::new(HashMap::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/sessions/{session_id}/history", get(session_history))
        .route("/documents", get(list_documents))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Docent API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /chat");
    Output::kv("History", "GET  /sessions/:id/history");
    Output::kv("Documents", "GET  /documents");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    /// The question to relay to the tutor.
    message: String,
    /// Continue an existing session; omit to start a new one.
    #[serde(default)]
    session_id: Option<Uuid>,
}

#[derive(Serialize)]
struct ChatResponse {
    session_id: Uuid,
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<String>,
}

#[derive(Serialize)]
struct HistoryResponse {
    session_id: Uuid,
    turns: Vec<ChatTurn>,
}

#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<IndexedSource>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn not_found(session_id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session not found: {}", session_id),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    // Resolve the session under the map lock, then release it before the
    // turn so a slow LLM call never blocks other sessions.
    let (session_id, session) = {
        let mut sessions = state.sessions.lock().await;
        match req.session_id {
            Some(id) => match sessions.get(&id) {
                Some(session) => (id, session.clone()),
                None => return not_found(id),
            },
            None => {
                let id = Uuid::new_v4();
                let session = Arc::new(Mutex::new(state.tutor.new_session()));
                sessions.insert(id, session.clone());
                (id, session)
            }
        }
    };

    let mut session = session.lock().await;
    match session.send(&req.message).await {
        Ok(turn) => Json(ChatResponse {
            session_id,
            answer: turn.content,
            sources: turn.sources,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn session_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    let session = {
        let sessions = state.sessions.lock().await;
        sessions.get(&session_id).cloned()
    };

    match session {
        Some(session) => {
            let turns = session.lock().await.history().to_vec();
            Json(HistoryResponse { session_id, turns }).into_response()
        }
        None => not_found(session_id),
    }
}

async fn list_documents(State(state): State<Arc<AppState>>) -> Response {
    match state.tutor.vector_store().list_sources().await {
        Ok(documents) => Json(DocumentsResponse {
            total: documents.len(),
            documents,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chat_core::knowledge::load_knowledge;
use chat_core::persist::{load_snapshot, IndexPaths};
use chat_core::{ChatData, DialogGraph, Matcher, Message, Question, Turn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const INVALID_MESSAGE: &str = "Invalid message format";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Where the server gets its dialog and knowledge base from.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Chat data JSON: questions, scripted responses and (optionally) knowledge entries.
    pub data: PathBuf,
    /// Knowledge file or directory replacing the `knowledge` section of `data`.
    pub knowledge: Option<PathBuf>,
    /// Prebuilt index snapshot; takes precedence over `knowledge`.
    pub snapshot: Option<PathBuf>,
    pub threshold: f64,
    pub start: String,
}

#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<Matcher>,
    pub dialog: Arc<DialogGraph>,
}

impl AppState {
    pub fn new(matcher: Matcher, dialog: DialogGraph) -> Self {
        Self { matcher: Arc::new(matcher), dialog: Arc::new(dialog) }
    }
}

#[derive(Deserialize)]
pub struct OptionsParams {
    pub current: Option<String>,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub next: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Serialize)]
pub struct DialogView {
    pub current: String,
    pub messages: Vec<Message>,
    pub options: Vec<Question>,
}

#[derive(Serialize)]
pub struct TurnView {
    #[serde(flatten)]
    pub turn: Turn,
    pub options: Vec<Question>,
}

/// Build the matcher and dialog graph once; everything after this is read-only.
pub fn load_state(config: &ServerConfig) -> Result<AppState> {
    let data = ChatData::load(&config.data)?;
    let matcher = match (&config.snapshot, &config.knowledge) {
        (Some(dir), _) => {
            let (entries, index, meta) = load_snapshot(&IndexPaths::new(dir))?;
            tracing::info!(snapshot = %dir.display(), created_at = %meta.created_at, "using index snapshot");
            Matcher::from_parts(entries, index)?
        }
        (None, Some(path)) => Matcher::new(load_knowledge(path)?),
        (None, None) => Matcher::new(data.knowledge),
    }
    .with_threshold(config.threshold);
    tracing::info!(
        docs = matcher.index().num_docs(),
        terms = matcher.index().num_terms(),
        threshold = matcher.threshold(),
        "matcher ready"
    );
    let dialog = DialogGraph::new(data.questions, data.responses).with_start(config.start.clone());
    Ok(AppState::new(matcher, dialog))
}

pub fn build_app(config: &ServerConfig) -> Result<Router> {
    let state = load_state(config)?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/chat", post(chat_handler).fallback(method_not_allowed))
        .route("/api/dialog/start", get(start_handler))
        .route("/api/dialog/options", get(options_handler))
        .route("/api/dialog/select", post(select_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Free-text fallback: `{"message": "..."}` in, `{"response": "..."}` out.
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> (StatusCode, Json<ChatResponse>) {
    let message = match &payload {
        Ok(Json(body)) => body.get("message").and_then(serde_json::Value::as_str),
        Err(err) => {
            tracing::debug!(%err, "rejected chat request body");
            None
        }
    };
    let Some(message) = message else {
        return (StatusCode::BAD_REQUEST, Json(ChatResponse { response: INVALID_MESSAGE.into() }));
    };
    let result = state.matcher.query(message);
    tracing::info!(matched = result.is_matched(), doc = result.document_index(), "chat query");
    (StatusCode::OK, Json(ChatResponse { response: result.reply().to_string() }))
}

async fn method_not_allowed() -> (StatusCode, Json<ChatResponse>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json(ChatResponse { response: METHOD_NOT_ALLOWED.into() }))
}

fn owned_options(dialog: &DialogGraph, current: &str) -> Vec<Question> {
    dialog.options(current).into_iter().cloned().collect()
}

pub async fn start_handler(State(state): State<AppState>) -> Json<DialogView> {
    let current = state.dialog.start_id().to_string();
    Json(DialogView {
        messages: state.dialog.start(),
        options: owned_options(&state.dialog, &current),
        current,
    })
}

pub async fn options_handler(State(state): State<AppState>, Query(params): Query<OptionsParams>) -> Json<DialogView> {
    let current = params.current.unwrap_or_else(|| state.dialog.start_id().to_string());
    Json(DialogView { options: owned_options(&state.dialog, &current), messages: Vec::new(), current })
}

pub async fn select_handler(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<TurnView>, (StatusCode, Json<serde_json::Value>)> {
    match state.dialog.select(&req.next, state.matcher.as_ref()) {
        Some(turn) => {
            let options = owned_options(&state.dialog, &turn.current);
            Ok(Json(TurnView { turn, options }))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown question {}", req.next) })),
        )),
    }
}

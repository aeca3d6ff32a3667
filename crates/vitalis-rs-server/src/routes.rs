//! Route table and handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use vitalis_rs_core::{ChatRequest, HealthProfile};
use vitalis_rs_memory::MemoryItem;
use vitalis_rs_protocol::{EventMsg, UserId};

/// Build the route table over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/agent", get(agent_health))
        .route("/initialize-user", post(initialize_user))
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .route("/users/{user_id}/memories", get(list_memories))
        .route("/users/{user_id}", delete(forget_user))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Vitalis, a memory-augmented health assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "initialize_user": "/initialize-user",
            "chat": "/chat",
            "chat_stream": "/chat/stream",
            "memories": "/users/{user_id}/memories",
        },
        "status": "healthy",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn agent_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model": state.assistant.model_id(),
        "tools": state.assistant.tool_names(),
    }))
}

#[derive(Debug, Deserialize)]
struct InitializeUserRequest {
    user_id: UserId,
}

#[derive(Debug, Serialize)]
struct InitializeUserResponse {
    status: &'static str,
    user_id: UserId,
    profile: HealthProfile,
}

async fn initialize_user(
    State(state): State<AppState>,
    Json(request): Json<InitializeUserRequest>,
) -> Result<Json<InitializeUserResponse>, ApiError> {
    let profile = state.assistant.initialize_user(&request.user_id).await?;
    info!("initialized user (user_id={})", request.user_id);
    Ok(Json(InitializeUserResponse {
        status: "initialized",
        user_id: request.user_id,
        profile,
    }))
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    thread_id: String,
    user_id: UserId,
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    debug!(
        "chat request (user_id={}, thread_id={:?})",
        request.user_id, request.thread_id
    );
    let reply = state.assistant.chat(request).await?;
    Ok(Json(ChatResponse {
        response: reply.response,
        thread_id: reply.thread_id,
        user_id: reply.user_id,
    }))
}

async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let stream = state.assistant.chat_stream(request)?;
    info!(
        "streaming chat (thread_id={}, turn_id={})",
        stream.thread_id, stream.turn_id
    );
    let events =
        BroadcastStream::new(stream.events).map(|item| Ok::<_, Infallible>(sse_event(item)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn sse_event(item: Result<EventMsg, BroadcastStreamRecvError>) -> Event {
    match item {
        Ok(event) => Event::default()
            .event(event.payload.kind())
            .data(serde_json::to_string(&event).unwrap_or_default()),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("SSE client lagged behind (skipped={})", skipped);
            Event::default()
                .event("lag")
                .data(json!({ "type": "lag", "skipped": skipped }).to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct MemoryListQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct MemoryEntry {
    key: String,
    content: String,
    context: String,
}

impl From<MemoryItem> for MemoryEntry {
    fn from(item: MemoryItem) -> Self {
        Self {
            key: item.key,
            content: item.value.content,
            context: item.value.context,
        }
    }
}

#[derive(Debug, Serialize)]
struct MemoryListResponse {
    user_id: UserId,
    memories: Vec<MemoryEntry>,
    count: usize,
}

async fn list_memories(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<MemoryListQuery>,
) -> Result<Json<MemoryListResponse>, ApiError> {
    let memories: Vec<MemoryEntry> = state
        .assistant
        .list_memories(&user_id, query.limit)
        .await?
        .into_iter()
        .map(MemoryEntry::from)
        .collect();
    Ok(Json(MemoryListResponse {
        user_id,
        count: memories.len(),
        memories,
    }))
}

async fn forget_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.assistant.forget_user(&user_id).await?;
    Ok(Json(json!({
        "status": "deleted",
        "user_id": user_id,
        "deleted": deleted,
    })))
}

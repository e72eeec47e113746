use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use wayfarer::models::message::Message;
use wayfarer::models::role::Role;

use super::{api_error, reply_error, ApiError};
use crate::state::{title, AppState};

#[derive(Debug, Deserialize)]
struct PostMessageRequest {
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub conversation_id: String,
    pub title: String,
    pub reply: Option<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

/// Append a user message to the stored history and run a turn over it. The
/// history is only replaced once the turn succeeds.
async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PostMessageRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    let entry = state.store.entry(&id).await;
    let mut stored = entry.lock().await;

    let history = stored.merge([Message::user().with_text(request.message)]);
    let conversation = match state.agent.reply(history.messages()).await {
        Ok(conversation) => conversation,
        Err(err) => {
            drop(stored);
            state.store.discard_if_empty(&id, entry).await;
            return Err(reply_error(err));
        }
    };

    let reply = conversation
        .last()
        .filter(|message| message.role == Role::Assistant)
        .and_then(|message| message.text());
    *stored = conversation.clone();

    tracing::info!(
        conversation_id = %id,
        messages = conversation.len(),
        "Conversation turn complete"
    );

    Ok(Json(TurnResponse {
        conversation_id: id,
        title: title(&conversation),
        reply,
        messages: conversation.into_messages(),
    }))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let conversation = state.store.get(&id).await.ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("conversation {} not found", id),
        )
    })?;

    Ok(Json(ConversationResponse {
        conversation_id: id,
        title: title(&conversation),
        messages: conversation.into_messages(),
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/conversations/:id", get(get_conversation))
        .route("/conversations/:id/messages", post(post_message))
        .with_state(state)
}

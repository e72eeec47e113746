use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use wayfarer::models::message::Message;

use super::{reply_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ReplyRequest {
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub messages: Vec<Message>,
}

/// Run the orchestrator over a caller supplied history without storing anything
async fn handler(
    State(state): State<AppState>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    tracing::debug!("Reply over {} messages", request.messages.len());

    let conversation = state
        .agent
        .reply(&request.messages)
        .await
        .map_err(reply_error)?;

    Ok(Json(ReplyResponse {
        messages: conversation.into_messages(),
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/reply", post(handler))
        .with_state(state)
}

pub mod conversations;
pub mod reply;

use axum::{http::StatusCode, Json, Router};
use serde::{Deserialize, Serialize};
use wayfarer::errors::AgentError;

use crate::state::AppState;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(reply::routes(state.clone()))
        .merge(conversations::routes(state))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Malformed histories are the caller's fault, anything else came from upstream
pub fn reply_error(err: anyhow::Error) -> ApiError {
    match err.downcast_ref::<AgentError>() {
        Some(AgentError::InvalidConversation(_)) => api_error(StatusCode::BAD_REQUEST, err),
        _ => {
            tracing::error!("Reply failed: {:#}", err);
            api_error(StatusCode::BAD_GATEWAY, err)
        }
    }
}

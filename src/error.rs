use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::rag::ChatResponse;

/// Shown when the generation service refuses for rate-limit or quota reasons
pub const QUOTA_EXCEEDED_MESSAGE: &str =
    "I've hit my usage quota for the moment. Please try again in a little while.";

/// Shown when the generation service fails for any other reason
pub const GENERATION_FAILED_MESSAGE: &str =
    "Sorry, I couldn't generate a response right now. Please try again.";

/// Shown when anything else in the chat pipeline fails
pub const SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("generation quota exceeded: {0:#}")]
    QuotaExceeded(anyhow::Error),
    #[error("generation failed: {0:#}")]
    GenerationFailed(anyhow::Error),
    #[error("chat request failed: {0:#}")]
    Internal(anyhow::Error),
}

impl ChatError {
    /// Status code and user-facing message for this failure
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            // A quota refusal is delivered as an ordinary reply
            ChatError::QuotaExceeded(_) => (StatusCode::OK, QUOTA_EXCEEDED_MESSAGE),
            ChatError::GenerationFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERATION_FAILED_MESSAGE,
            ),
            ChatError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = self.status_and_message();
        let body = Json(ChatResponse {
            output: message.to_string(),
        });
        (status, body).into_response()
    }
}

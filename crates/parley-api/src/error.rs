use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use parley_chat::{ChatError, ChatResult, ChatService};
use parley_types::api::ErrorBody;

use crate::auth::AppState;

/// Handler error: a [`ChatError`] rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError(pub ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self.0 {
            ChatError::InvalidRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ChatError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ChatError::Forbidden(detail) => (StatusCode::FORBIDDEN, detail),
            ChatError::Unauthorized(detail) => (StatusCode::UNAUTHORIZED, detail),
            ChatError::Conflict(detail) => (StatusCode::CONFLICT, detail),
            ChatError::Store(e) => {
                error!("Store error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl ApiError {
    pub fn unauthorized(detail: &str) -> Self {
        Self(ChatError::Unauthorized(detail.to_string()))
    }
}

// Extractor rejections are client errors.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ChatError::InvalidRequest(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(ChatError::InvalidRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(ChatError::InvalidRequest(rejection.body_text()))
    }
}

/// Run a chat operation on the blocking pool.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&ChatService) -> ChatResult<T> + Send + 'static,
    T: Send + 'static,
{
    let chat = state.chat.clone();
    tokio::task::spawn_blocking(move || f(&chat))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError(ChatError::Store(anyhow::anyhow!("blocking task failed")))
        })?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_errors_map_to_status_codes() {
        let cases = [
            (ChatError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ChatError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ChatError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ChatError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ChatError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ChatError::Store(anyhow::anyhow!("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status(), expected);
        }
    }
}

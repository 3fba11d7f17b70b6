use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use parley_chat::Window;
use parley_db::queries::DEFAULT_FEED_LIMIT;
use parley_types::api::{Claims, SendMessageRequest};
use parley_types::models::Identity;

use crate::auth::AppState;
use crate::error::{ApiError, run_blocking};
use crate::extract::{JsonBody, PathParam, QueryParams};

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor-based pagination: pass the `created_at` of the oldest message
    /// from the previous page to fetch older messages.
    pub before: Option<DateTime<Utc>>,
}

fn default_limit() -> u32 {
    DEFAULT_FEED_LIMIT
}

impl MessageQuery {
    pub fn window(&self) -> Window {
        let window = Window::latest(self.limit);
        match self.before {
            Some(cursor) => window.before(cursor),
            None => window,
        }
    }
}

/// GET /dm/threads/{thread_id}/messages. Also marks the other
/// participant's messages as read.
pub async fn get_messages(
    State(state): State<AppState>,
    PathParam(thread_id): PathParam<Uuid>,
    QueryParams(query): QueryParams<MessageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let window = query.window();
    let messages = run_blocking(&state, move |chat| {
        chat.list_direct_messages(&identity, thread_id, window)
    })
    .await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    PathParam(thread_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let message = run_blocking(&state, move |chat| {
        chat.send_direct_message(&identity, thread_id, &req.text)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    PathParam(message_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    run_blocking(&state, move |chat| chat.delete_direct_message(&identity, message_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_match_core_window() {
        let query: MessageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.window(), Window::default());

        let query: MessageQuery =
            serde_json::from_str(r#"{"limit": 5, "before": "2026-01-01T00:00:00Z"}"#).unwrap();
        let window = query.window();
        assert_eq!(window.limit, 5);
        assert!(window.before.is_some());
    }
}

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use parley_types::api::{Claims, OpenThreadRequest};
use parley_types::models::Identity;

use crate::auth::AppState;
use crate::error::{ApiError, run_blocking};
use crate::extract::JsonBody;

/// GET /dm/threads: the caller's 1:1 threads, most recent first.
pub async fn list_threads(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let threads = run_blocking(&state, move |chat| chat.list_threads(&identity)).await?;
    Ok(Json(threads))
}

/// POST /dm/threads: find or create the thread with `username`.
/// 201 when the thread was created, 200 when it already existed.
pub async fn open_thread(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<OpenThreadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let resolved = run_blocking(&state, move |chat| chat.open_thread_with(&identity, &req.username)).await?;

    let status = if resolved.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(resolved.thread)))
}

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use parley_types::api::{Claims, SendMessageRequest};
use parley_types::models::{Identity, Scope};

use crate::auth::AppState;
use crate::error::{ApiError, run_blocking};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::messages::MessageQuery;

async fn list(
    state: AppState,
    claims: Claims,
    scope: Scope,
    query: MessageQuery,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let window = query.window();
    let messages = run_blocking(&state, move |chat| {
        chat.list_chat_messages(&identity, scope, window)
    })
    .await?;
    Ok(Json(messages))
}

async fn post(
    state: AppState,
    claims: Claims,
    scope: Scope,
    req: SendMessageRequest,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let message = run_blocking(&state, move |chat| {
        chat.post_chat_message(&identity, scope, &req.text)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn remove(
    state: AppState,
    claims: Claims,
    scope: Scope,
    message_id: Uuid,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    run_blocking(&state, move |chat| {
        chat.delete_chat_message(&identity, scope, message_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Global room --

pub async fn get_global(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<MessageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    list(state, claims, Scope::Global, query).await
}

pub async fn post_global(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    post(state, claims, Scope::Global, req).await
}

pub async fn delete_global(
    State(state): State<AppState>,
    PathParam(message_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    remove(state, claims, Scope::Global, message_id).await
}

// -- Community channels --

pub async fn get_community(
    State(state): State<AppState>,
    PathParam(community_id): PathParam<Uuid>,
    QueryParams(query): QueryParams<MessageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    list(state, claims, Scope::Channel(community_id), query).await
}

pub async fn post_community(
    State(state): State<AppState>,
    PathParam(community_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    post(state, claims, Scope::Channel(community_id), req).await
}

pub async fn delete_community(
    State(state): State<AppState>,
    PathParam((community_id, message_id)): PathParam<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    remove(state, claims, Scope::Channel(community_id), message_id).await
}

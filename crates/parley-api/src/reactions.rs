use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use parley_chat::MessageRef;
use parley_types::api::{Claims, ReactionRequest};
use parley_types::models::{Identity, Scope};

use crate::auth::AppState;
use crate::error::{ApiError, run_blocking};
use crate::extract::{JsonBody, PathParam};

async fn set(
    state: AppState,
    claims: Claims,
    message: MessageRef,
    req: ReactionRequest,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let set = run_blocking(&state, move |chat| {
        chat.set_reaction(&identity, message, &req.emoji)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(set)))
}

async fn clear(
    state: AppState,
    claims: Claims,
    message: MessageRef,
    req: ReactionRequest,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let cleared = run_blocking(&state, move |chat| {
        chat.clear_reaction(&identity, message, &req.emoji)
    })
    .await?;
    Ok(Json(cleared))
}

// -- Direct messages --

pub async fn set_direct(
    State(state): State<AppState>,
    PathParam(message_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    set(state, claims, MessageRef::Direct(message_id), req).await
}

pub async fn clear_direct(
    State(state): State<AppState>,
    PathParam(message_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    clear(state, claims, MessageRef::Direct(message_id), req).await
}

// -- Global room --

pub async fn set_global(
    State(state): State<AppState>,
    PathParam(message_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = MessageRef::Chat { scope: Scope::Global, id: message_id };
    set(state, claims, message, req).await
}

pub async fn clear_global(
    State(state): State<AppState>,
    PathParam(message_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = MessageRef::Chat { scope: Scope::Global, id: message_id };
    clear(state, claims, message, req).await
}

// -- Community channels --

pub async fn set_community(
    State(state): State<AppState>,
    PathParam((community_id, message_id)): PathParam<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = MessageRef::Chat { scope: Scope::Channel(community_id), id: message_id };
    set(state, claims, message, req).await
}

pub async fn clear_community(
    State(state): State<AppState>,
    PathParam((community_id, message_id)): PathParam<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = MessageRef::Chat { scope: Scope::Channel(community_id), id: message_id };
    clear(state, claims, message, req).await
}

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use parley_types::api::{AddMemberRequest, Claims, CreateCommunityRequest};
use parley_types::models::Identity;

use crate::auth::AppState;
use crate::error::{ApiError, run_blocking};
use crate::extract::{JsonBody, PathParam};

pub async fn list_communities(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let communities = run_blocking(&state, move |chat| chat.list_communities(&identity)).await?;
    Ok(Json(communities))
}

pub async fn create_community(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreateCommunityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let community = run_blocking(&state, move |chat| chat.create_community(&identity, &req.name)).await?;
    Ok((StatusCode::CREATED, Json(community)))
}

pub async fn list_members(
    State(state): State<AppState>,
    PathParam(community_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let members = run_blocking(&state, move |chat| chat.list_members(&identity, community_id)).await?;
    Ok(Json(members))
}

/// Admins only.
pub async fn add_member(
    State(state): State<AppState>,
    PathParam(community_id): PathParam<Uuid>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let member = run_blocking(&state, move |chat| {
        chat.add_member(&identity, community_id, &req.username)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

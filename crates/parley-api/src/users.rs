use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde::Deserialize;

use parley_types::api::Claims;
use parley_types::models::Identity;

use crate::auth::AppState;
use crate::error::{ApiError, run_blocking};
use crate::extract::QueryParams;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /users/search?q=: partial, case-insensitive username match.
pub async fn search(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = Identity::from(claims);
    let users = run_blocking(&state, move |chat| chat.search_users(&identity, &query.q)).await?;
    Ok(Json(users))
}

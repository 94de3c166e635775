//! Member directory endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::Member, AppState};

use super::AuthenticatedUser;

/// List all members
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Members ordered by code", body = Vec<Member>),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "No member registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Member>>> {
    claims.require_admin()?;

    let members = state.services.members.list_members().await?;
    Ok(Json(members))
}

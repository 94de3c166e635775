//! Borrow and return endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::LoanRequest, AppState};

use super::{AuthenticatedUser, JsonBody, MessageResponse};

/// Borrow one or more books
#[utoipa::path(
    post,
    path = "/borrow",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = LoanRequest,
    responses(
        (status = 200, description = "Books borrowed", body = MessageResponse),
        (status = 400, description = "Book out of stock or already held", body = crate::error::ErrorResponse),
        (status = 403, description = "Member penalized or loan limit reached", body = crate::error::ErrorResponse),
        (status = 404, description = "Member or book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonBody(request): JsonBody<LoanRequest>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_self_or_admin(&request.member_code)?;

    let borrowed = state.services.loans.borrow(&request).await?;
    Ok(Json(MessageResponse::new(format!(
        "Books borrowed successfully: {}",
        borrowed.join(", ")
    ))))
}

/// Return one or more borrowed books
#[utoipa::path(
    post,
    path = "/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = LoanRequest,
    responses(
        (status = 200, description = "Books returned", body = MessageResponse),
        (status = 400, description = "Book not borrowed by this member", body = crate::error::ErrorResponse),
        (status = 404, description = "Member or book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonBody(request): JsonBody<LoanRequest>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_self_or_admin(&request.member_code)?;

    let returned = state.services.loans.return_books(&request).await?;
    Ok(Json(MessageResponse::new(format!(
        "Books returned successfully: {}",
        returned.join(", ")
    ))))
}

//! Registration and authentication endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        member::{
            ForgotPasswordRequest, LoginRequest, RefreshTokenRequest, RegisterMember,
            ResetPasswordRequest, TokenPair,
        },
        Member,
    },
    AppState,
};

use super::{JsonBody, MessageResponse};

/// Register a new member. The account stays inactive until the emailed
/// activation link is opened.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterMember,
    responses(
        (status = 201, description = "Member registered", body = Member),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already exist", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to send email", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterMember>,
) -> AppResult<(StatusCode, Json<Member>)> {
    let member = state.services.members.register(request).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Activate an account
#[utoipa::path(
    get,
    path = "/auth/activate/{token}",
    tag = "auth",
    params(("token" = String, Path, description = "Activation token")),
    responses(
        (status = 200, description = "Account activated", body = MessageResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.members.activate(&token).await?;
    Ok(Json(MessageResponse::new("Account activated successfully")))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenPair),
        (status = 401, description = "Email or Password is wrong", body = crate::error::ErrorResponse),
        (status = 403, description = "Account not activated", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let tokens = state.services.members.login(request).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid refresh token", body = crate::error::ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshTokenRequest>,
) -> AppResult<Json<TokenPair>> {
    let tokens = state.services.members.refresh(request).await?;
    Ok(Json(tokens))
}

/// Send a password reset link
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email queued", body = MessageResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.members.forgot_password(request).await?;
    Ok(Json(MessageResponse::new(
        "Password reset link has been sent to your email",
    )))
}

/// Check that a reset token is still usable
#[utoipa::path(
    get,
    path = "/auth/reset-password/{token}",
    tag = "auth",
    params(("token" = String, Path, description = "Reset token")),
    responses(
        (status = 200, description = "Token is valid", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.members.check_reset_token(&token).await?;
    Ok(Json(MessageResponse::new("Token is valid")))
}

/// Set a new password
#[utoipa::path(
    patch,
    path = "/auth/reset-password/{token}",
    tag = "auth",
    params(("token" = String, Path, description = "Reset token")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid payload or expired token", body = crate::error::ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonBody(request): JsonBody<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.members.reset_password(&token, request).await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}

//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{CreateBook, UpdateBook},
        Book,
    },
    AppState,
};

use super::{AuthenticatedUser, JsonBody, MessageResponse};

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "Books ordered by code", body = Vec<Book>),
        (status = 404, description = "Catalog is empty", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get a book by code
#[utoipa::path(
    get,
    path = "/books/{code}",
    tag = "books",
    params(("code" = String, Path, description = "Book code")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(&code).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already exist", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonBody(request): JsonBody<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_admin()?;

    let book = state.services.catalog.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update title, author or stock of a book
#[utoipa::path(
    patch,
    path = "/books/{code}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Book code")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
    JsonBody(request): JsonBody<UpdateBook>,
) -> AppResult<Json<Book>> {
    claims.require_admin()?;

    let book = state.services.catalog.update_book(&code, request).await?;
    Ok(Json(book))
}

/// Remove a book from the catalog
#[utoipa::path(
    delete,
    path = "/books/{code}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Book code")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.catalog.delete_book(&code).await?;
    Ok(Json(MessageResponse::new("Book deleted successfully")))
}

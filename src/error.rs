//! Error types for the library server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchMember = 4,
    NoSuchBook = 5,
    OutOfStock = 6,
    NotBorrowed = 7,
    AlreadyBorrowed = 8,
    MaxBorrowsReached = 9,
    Penalized = 10,
    Duplicate = 11,
    BadValue = 12,
    NoSuchData = 13,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Member not found")]
    MemberNotFound(String),

    #[error("Book with code {0} not found")]
    BookNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Member is penalized until {until}")]
    Penalized { until: DateTime<Utc> },

    #[error("Member cannot borrow more than {max} books in total")]
    LoanLimitExceeded { max: usize },

    #[error("Book with code {0} is out of stock")]
    OutOfStock(String),

    #[error("Book with code {0} was not borrowed by this member")]
    NotBorrowed(String),

    #[error("Book with code {0} is already borrowed by this member")]
    AlreadyBorrowed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Email task could not be handed to the queue
    #[error("Failed to send email")]
    Notification(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Book code the error refers to, if any
    pub fn book_code(&self) -> Option<&str> {
        match self {
            AppError::BookNotFound(code)
            | AppError::OutOfStock(code)
            | AppError::NotBorrowed(code)
            | AppError::AlreadyBorrowed(code) => Some(code),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_)
            | AppError::Penalized { .. }
            | AppError::LoanLimitExceeded { .. } => StatusCode::FORBIDDEN,
            AppError::MemberNotFound(_) | AppError::BookNotFound(_) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::OutOfStock(_)
            | AppError::NotBorrowed(_)
            | AppError::AlreadyBorrowed(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Notification(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_) | AppError::Authorization(_) => ErrorCode::NotAuthorized,
            AppError::MemberNotFound(_) => ErrorCode::NoSuchMember,
            AppError::BookNotFound(_) => ErrorCode::NoSuchBook,
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::Penalized { .. } => ErrorCode::Penalized,
            AppError::LoanLimitExceeded { .. } => ErrorCode::MaxBorrowsReached,
            AppError::OutOfStock(_) => ErrorCode::OutOfStock,
            AppError::NotBorrowed(_) => ErrorCode::NotBorrowed,
            AppError::AlreadyBorrowed(_) => ErrorCode::AlreadyBorrowed,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Notification(_) | AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    /// Client-facing message. Messages of server-side failures are not exposed.
    fn public_message(&self) -> String {
        match self {
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Database(_) => "Database error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

/// Bodies that fail to parse are reported like any other invalid payload
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Offending book code for book-scoped errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {:?}", e),
            AppError::Notification(msg) => tracing::error!("Notification error: {}", msg),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            _ => {}
        }

        let code = self.error_code();
        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message: self.public_message(),
            book_code: self.book_code().map(str::to_string),
        });

        (self.status_code(), body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

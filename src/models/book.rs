//! Book (catalog entry) model and request payloads

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book record. `stock` counts copies currently on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    /// Sequential code (`B001`, `B002`, ...)
    pub code: String,
    pub title: String,
    pub author: String,
    pub stock: i32,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Book title is required."))]
    pub title: String,
    #[validate(length(min = 1, message = "Book author is required."))]
    pub author: String,
    #[validate(range(min = 0, message = "Book stock must be greater than or equal to 0."))]
    pub stock: i32,
}

/// Partial update of a book
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Book title cannot be empty."))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Book author cannot be empty."))]
    pub author: Option<String>,
    #[validate(range(min = 0, message = "Book stock must be greater than or equal to 0."))]
    pub stock: Option<i32>,
}

impl Book {
    pub fn apply(&mut self, update: UpdateBook) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
    }
}

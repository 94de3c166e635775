//! Repository layer for database operations
//!
//! Services depend on the storage traits below rather than on the
//! PostgreSQL repositories, so the lending rules can be exercised against
//! the in-memory store in tests.

pub mod books;
pub mod loans;
pub mod members;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{book::UpdateBook, Book, Member},
};

/// Book catalog storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books ordered by code
    async fn list(&self) -> AppResult<Vec<Book>>;
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Book>>;
    async fn find_by_title(&self, title: &str) -> AppResult<Option<Book>>;
    /// Highest code in lexicographic order
    async fn last_code(&self) -> AppResult<Option<String>>;
    async fn insert(&self, book: &Book) -> AppResult<()>;
    /// Write only the fields set in `update`, in place. `None` when the code
    /// is unknown.
    async fn update(&self, code: &str, update: &UpdateBook) -> AppResult<Option<Book>>;
    async fn delete(&self, code: &str) -> AppResult<bool>;
}

/// Member directory storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// All members ordered by code
    async fn list(&self) -> AppResult<Vec<Member>>;
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Member>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Member>>;
    async fn find_by_activation_token(&self, token_hash: &str) -> AppResult<Option<Member>>;
    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<Member>>;
    /// Highest code in lexicographic order
    async fn last_code(&self) -> AppResult<Option<String>>;
    async fn insert(&self, member: &Member) -> AppResult<()>;
    /// Persist credential and account fields. Loan fields are written only
    /// through [`LoanLedger`].
    async fn update_account(&self, member: &Member) -> AppResult<()>;
}

/// Atomic persistence of borrow/return outcomes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanLedger: Send + Sync {
    /// Decrement the stock of every book in `book_codes` (only while
    /// `stock > 0`) and store the member's loan fields, all in one
    /// transaction. Fails with `OutOfStock`/`BookNotFound` if a book was
    /// drained or removed since it was read, and with `Conflict` if the
    /// member changed since `member.version` was read.
    async fn record_borrow(&self, member: &Member, book_codes: &[String]) -> AppResult<()>;

    /// Increment the stock of every book in `book_codes` and store the
    /// member's loan fields, in one transaction.
    async fn record_return(&self, member: &Member, book_codes: &[String]) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Map a unique-key violation to `Conflict`, anything else to `Database`
pub(crate) fn map_unique_violation(error: sqlx::Error, message: &str) -> AppError {
    let is_unique = error
        .as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false);
    if is_unique {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Database(error)
    }
}

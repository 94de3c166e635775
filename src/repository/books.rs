//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{map_unique_violation, BookStore};
use crate::{
    error::AppResult,
    models::{book::UpdateBook, Book},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT code, title, author, stock FROM books ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT code, title, author, stock FROM books WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_by_title(&self, title: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT code, title, author, stock FROM books WHERE title = $1 LIMIT 1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn last_code(&self) -> AppResult<Option<String>> {
        let code: Option<String> =
            sqlx::query_scalar("SELECT code FROM books ORDER BY code DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(code)
    }

    async fn insert(&self, book: &Book) -> AppResult<()> {
        sqlx::query("INSERT INTO books (code, title, author, stock) VALUES ($1, $2, $3, $4)")
            .bind(&book.code)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.stock)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, &format!("Book code {} already exists", book.code)))?;
        Ok(())
    }

    async fn update(&self, code: &str, update: &UpdateBook) -> AppResult<Option<Book>> {
        // Unset fields keep their stored value, so a title edit never
        // overwrites a concurrent stock change
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                stock = COALESCE($4, stock),
                updated_at = NOW()
            WHERE code = $1
            RETURNING code, title, author, stock
            "#,
        )
        .bind(code)
        .bind(&update.title)
        .bind(&update.author)
        .bind(update.stock)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn delete(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

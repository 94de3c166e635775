//! Book catalog service

use std::sync::Arc;

use validator::Validate;

use super::codes::next_code;
use crate::{
    error::{AppError, AppResult},
    models::{book::CreateBook, book::UpdateBook, Book},
    repository::BookStore,
};

pub const BOOK_CODE_PREFIX: char = 'B';

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookStore>,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        let books = self.books.list().await?;
        if books.is_empty() {
            return Err(AppError::NotFound("Books not found".to_string()));
        }
        Ok(books)
    }

    pub async fn get_book(&self, code: &str) -> AppResult<Book> {
        self.books
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    pub async fn create_book(&self, request: CreateBook) -> AppResult<Book> {
        request.validate()?;

        if self.books.find_by_title(&request.title).await?.is_some() {
            return Err(AppError::Conflict("Book already exist".to_string()));
        }

        let last = self.books.last_code().await?;
        let book = Book {
            code: next_code(BOOK_CODE_PREFIX, last.as_deref())?,
            title: request.title,
            author: request.author,
            stock: request.stock,
        };
        self.books.insert(&book).await?;

        tracing::info!(code = %book.code, title = %book.title, "Book created");
        Ok(book)
    }

    pub async fn update_book(&self, code: &str, request: UpdateBook) -> AppResult<Book> {
        request.validate()?;

        let book = self
            .books
            .update(code, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        tracing::info!(code = %book.code, "Book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, code: &str) -> AppResult<()> {
        if !self.books.delete(code).await? {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        tracing::info!(code = %code, "Book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{memory::MemoryStore, MockBookStore};

    fn create(title: &str, stock: i32) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: "Masashi Kishimoto".to_string(),
            stock,
        }
    }

    #[tokio::test]
    async fn test_codes_follow_highest_existing() {
        let store = Arc::new(MemoryStore::new().with_book("B009", "One Piece", 1));
        let catalog = CatalogService::new(store.clone());

        let book = catalog.create_book(create("Naruto", 3)).await.unwrap();
        assert_eq!(book.code, "B010");
        assert_eq!(store.book("B010").unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_first_book_gets_b001() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let book = catalog.create_book(create("Naruto", 3)).await.unwrap();
        assert_eq!(book.code, "B001");
    }

    #[tokio::test]
    async fn test_duplicate_title_conflicts() {
        let store = Arc::new(MemoryStore::new().with_book("B001", "Naruto", 1));
        let catalog = CatalogService::new(store);

        let err = catalog.create_book(create("Naruto", 3)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Book already exist"));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_not_found() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            catalog.list_books().await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = Arc::new(MemoryStore::new().with_book("B001", "Naruto", 1));
        let catalog = CatalogService::new(store.clone());

        let updated = catalog
            .update_book(
                "B001",
                UpdateBook {
                    stock: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 4);
        assert_eq!(updated.title, "Naruto");

        catalog.delete_book("B001").await.unwrap();
        assert!(store.book("B001").is_none());
        assert!(matches!(
            catalog.delete_book("B001").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_title_update_leaves_stock_to_the_store() {
        let mut books = MockBookStore::new();
        books.expect_find_by_code().never();
        books
            .expect_update()
            .withf(|code, changes| {
                code == "B001" && changes.stock.is_none() && changes.title.as_deref() == Some("Boruto")
            })
            .times(1)
            .returning(|code, _| {
                Ok(Some(Book {
                    code: code.to_string(),
                    title: "Boruto".to_string(),
                    author: "Masashi Kishimoto".to_string(),
                    stock: 2,
                }))
            });

        let catalog = CatalogService::new(Arc::new(books));
        let updated = catalog
            .update_book(
                "B001",
                UpdateBook {
                    title: Some("Boruto".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 2);
    }

    #[tokio::test]
    async fn test_update_unknown_book_is_not_found() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let err = catalog
            .update_book("B404", UpdateBook::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Book not found"));
    }

    #[tokio::test]
    async fn test_invalid_stored_code_is_internal() {
        let mut books = MockBookStore::new();
        books.expect_find_by_title().returning(|_| Ok(None));
        books
            .expect_last_code()
            .returning(|| Ok(Some("Bxyz".to_string())));
        books.expect_insert().never();

        let catalog = CatalogService::new(Arc::new(books));
        let err = catalog.create_book(create("Naruto", 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}

//! In-memory storage used by service and router tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{BookStore, LoanLedger, MemberStore};
use crate::{
    error::{AppError, AppResult},
    models::{book::UpdateBook, Book, Member},
};

#[derive(Default)]
pub struct MemoryStore {
    books: Mutex<BTreeMap<String, Book>>,
    members: Mutex<BTreeMap<String, Member>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(self, code: &str, title: &str, stock: i32) -> Self {
        self.books.lock().unwrap().insert(
            code.to_string(),
            Book {
                code: code.to_string(),
                title: title.to_string(),
                author: "Unknown".to_string(),
                stock,
            },
        );
        self
    }

    pub fn with_member(self, member: Member) -> Self {
        self.members.lock().unwrap().insert(member.code.clone(), member);
        self
    }

    pub fn book(&self, code: &str) -> Option<Book> {
        self.books.lock().unwrap().get(code).cloned()
    }

    pub fn member(&self, code: &str) -> Option<Member> {
        self.members.lock().unwrap().get(code).cloned()
    }

    fn store_loans(members: &mut BTreeMap<String, Member>, member: &Member) -> AppResult<()> {
        let stored = members
            .get_mut(&member.code)
            .ok_or_else(|| AppError::MemberNotFound(member.code.clone()))?;
        if stored.version != member.version {
            return Err(AppError::Conflict(format!(
                "Member {} was modified concurrently, please retry",
                member.code
            )));
        }
        stored.borrowed_books = member.borrowed_books.clone();
        stored.penalty_until = member.penalty_until;
        stored.version += 1;
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.books.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Book>> {
        Ok(self.book(code))
    }

    async fn find_by_title(&self, title: &str) -> AppResult<Option<Book>> {
        Ok(self
            .books
            .lock()
            .unwrap()
            .values()
            .find(|b| b.title == title)
            .cloned())
    }

    async fn last_code(&self) -> AppResult<Option<String>> {
        Ok(self.books.lock().unwrap().keys().next_back().cloned())
    }

    async fn insert(&self, book: &Book) -> AppResult<()> {
        let mut books = self.books.lock().unwrap();
        if books.contains_key(&book.code) {
            return Err(AppError::Conflict(format!("Book code {} already exists", book.code)));
        }
        books.insert(book.code.clone(), book.clone());
        Ok(())
    }

    async fn update(&self, code: &str, update: &UpdateBook) -> AppResult<Option<Book>> {
        let mut books = self.books.lock().unwrap();
        Ok(books.get_mut(code).map(|stored| {
            stored.apply(update.clone());
            stored.clone()
        }))
    }

    async fn delete(&self, code: &str) -> AppResult<bool> {
        Ok(self.books.lock().unwrap().remove(code).is_some())
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Member>> {
        Ok(self.members.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Member>> {
        Ok(self.member(code))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_activation_token(&self, token_hash: &str) -> AppResult<Option<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .find(|m| m.activation_token.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .find(|m| m.reset_token.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn last_code(&self) -> AppResult<Option<String>> {
        Ok(self.members.lock().unwrap().keys().next_back().cloned())
    }

    async fn insert(&self, member: &Member) -> AppResult<()> {
        let mut members = self.members.lock().unwrap();
        let duplicate = members.contains_key(&member.code)
            || members.values().any(|m| m.email.eq_ignore_ascii_case(&member.email));
        if duplicate {
            return Err(AppError::Conflict("Email already exist".to_string()));
        }
        members.insert(member.code.clone(), member.clone());
        Ok(())
    }

    async fn update_account(&self, member: &Member) -> AppResult<()> {
        let mut members = self.members.lock().unwrap();
        if let Some(stored) = members.get_mut(&member.code) {
            stored.name = member.name.clone();
            stored.email = member.email.clone();
            stored.password = member.password.clone();
            stored.role = member.role;
            stored.is_active = member.is_active;
            stored.activation_token = member.activation_token.clone();
            stored.reset_token = member.reset_token.clone();
            stored.reset_token_expires_at = member.reset_token_expires_at;
        }
        Ok(())
    }
}

#[async_trait]
impl LoanLedger for MemoryStore {
    async fn record_borrow(&self, member: &Member, book_codes: &[String]) -> AppResult<()> {
        let mut books = self.books.lock().unwrap();
        let mut members = self.members.lock().unwrap();

        // Check everything before touching anything: all-or-nothing
        let mut remaining: BTreeMap<&str, i32> = BTreeMap::new();
        for code in book_codes {
            let stock = match remaining.get(code.as_str()) {
                Some(stock) => *stock,
                None => books
                    .get(code)
                    .map(|b| b.stock)
                    .ok_or_else(|| AppError::BookNotFound(code.clone()))?,
            };
            if stock < 1 {
                return Err(AppError::OutOfStock(code.clone()));
            }
            remaining.insert(code.as_str(), stock - 1);
        }
        if members.get(&member.code).map(|m| m.version) != Some(member.version) {
            return Err(AppError::Conflict(format!(
                "Member {} was modified concurrently, please retry",
                member.code
            )));
        }

        for (code, stock) in remaining {
            if let Some(book) = books.get_mut(code) {
                book.stock = stock;
            }
        }
        Self::store_loans(&mut members, member)
    }

    async fn record_return(&self, member: &Member, book_codes: &[String]) -> AppResult<()> {
        let mut books = self.books.lock().unwrap();
        let mut members = self.members.lock().unwrap();

        if let Some(code) = book_codes.iter().find(|code| !books.contains_key(*code)) {
            return Err(AppError::BookNotFound(code.clone()));
        }
        if members.get(&member.code).map(|m| m.version) != Some(member.version) {
            return Err(AppError::Conflict(format!(
                "Member {} was modified concurrently, please retry",
                member.code
            )));
        }

        for code in book_codes {
            if let Some(book) = books.get_mut(code) {
                book.stock += 1;
            }
        }
        Self::store_loans(&mut members, member)
    }
}

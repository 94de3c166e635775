//! Borrow/return workflow
//!
//! Enforces the lending rules over the member directory and the book
//! catalog:
//!
//! - a penalized member cannot borrow until `penalty_until` has passed;
//! - a member holds at most `max_books` books at once, counting requested
//!   codes by list length;
//! - a book is lent only while `stock >= 1`, and a member never holds the
//!   same book twice;
//! - returning a book kept longer than the grace period bans the member from
//!   borrowing for `penalty_days`, counted from the return.
//!
//! Checks run in request order and fail on the first violation. Nothing is
//! written until every check has passed; the outcome is then persisted in a
//! single [`LoanLedger`] call.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{BorrowedBook, LoanRequest, Member},
    repository::{BookStore, LoanLedger, MemberStore},
};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whole days between two instants, rounded up
pub fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let millis = (to - from).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

#[derive(Clone)]
pub struct LoansService {
    members: Arc<dyn MemberStore>,
    books: Arc<dyn BookStore>,
    ledger: Arc<dyn LoanLedger>,
    policy: LoansConfig,
}

impl LoansService {
    pub fn new(
        members: Arc<dyn MemberStore>,
        books: Arc<dyn BookStore>,
        ledger: Arc<dyn LoanLedger>,
        policy: LoansConfig,
    ) -> Self {
        Self {
            members,
            books,
            ledger,
            policy,
        }
    }

    /// Lend the requested books. Returns the borrowed codes in request order.
    pub async fn borrow(&self, request: &LoanRequest) -> AppResult<Vec<String>> {
        request.validate()?;
        self.borrow_at(&request.member_code, &request.book_codes, Utc::now())
            .await
    }

    /// Take back the requested books. Returns the returned codes in request order.
    pub async fn return_books(&self, request: &LoanRequest) -> AppResult<Vec<String>> {
        request.validate()?;
        self.return_at(&request.member_code, &request.book_codes, Utc::now())
            .await
    }

    async fn load_member(&self, member_code: &str) -> AppResult<Member> {
        self.members
            .find_by_code(member_code)
            .await?
            .ok_or_else(|| AppError::MemberNotFound(member_code.to_string()))
    }

    pub(crate) async fn borrow_at(
        &self,
        member_code: &str,
        book_codes: &[String],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        let mut member = self.load_member(member_code).await?;

        if let Some(until) = member.active_penalty(now) {
            return Err(AppError::Penalized { until });
        }

        if member.borrowed_books.len() + book_codes.len() > self.policy.max_books {
            return Err(AppError::LoanLimitExceeded {
                max: self.policy.max_books,
            });
        }

        for code in book_codes {
            let book = self
                .books
                .find_by_code(code)
                .await?
                .ok_or_else(|| AppError::BookNotFound(code.clone()))?;

            if book.stock < 1 {
                return Err(AppError::OutOfStock(code.clone()));
            }
            if member.holds(&book.code) {
                return Err(AppError::AlreadyBorrowed(code.clone()));
            }

            member.borrowed_books.push(BorrowedBook {
                book_code: book.code,
                borrowed_at: now,
            });
        }

        self.ledger.record_borrow(&member, book_codes).await?;

        tracing::info!(
            member = %member.code,
            books = ?book_codes,
            "Books borrowed"
        );
        Ok(book_codes.to_vec())
    }

    pub(crate) async fn return_at(
        &self,
        member_code: &str,
        book_codes: &[String],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        let mut member = self.load_member(member_code).await?;

        // Validation pass: match every code before mutating anything. Matched
        // loans are taken out of `remaining`, so a repeated code cannot match
        // the same loan twice.
        let mut remaining = member.borrowed_books.clone();
        let mut returned = Vec::with_capacity(book_codes.len());
        for code in book_codes {
            let book = self
                .books
                .find_by_code(code)
                .await?
                .ok_or_else(|| AppError::BookNotFound(code.clone()))?;

            let position = remaining
                .iter()
                .position(|loan| loan.book_code == book.code)
                .ok_or_else(|| AppError::NotBorrowed(code.clone()))?;
            returned.push(remaining.remove(position));
        }

        let penalty = Duration::days(self.policy.penalty_days);
        for loan in &returned {
            if elapsed_days(loan.borrowed_at, now) > self.policy.grace_period_days {
                member.penalty_until = Some(now + penalty);
            }
        }
        member.borrowed_books = remaining;

        self.ledger.record_return(&member, book_codes).await?;

        tracing::info!(
            member = %member.code,
            books = ?book_codes,
            penalty_until = ?member.penalty_until,
            "Books returned"
        );
        Ok(book_codes.to_vec())
    }
}

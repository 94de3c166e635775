//! Loan ledger: transactional persistence of borrow/return outcomes

use async_trait::async_trait;
use sqlx::{types::Json, Pool, Postgres, Transaction};

use super::LoanLedger;
use crate::{
    error::{AppError, AppResult},
    models::Member,
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Write the member's loan fields, guarded by the version read earlier
    async fn save_loans(tx: &mut Transaction<'_, Postgres>, member: &Member) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET borrowed_books = $2, penalty_until = $3, version = version + 1, updated_at = NOW()
            WHERE code = $1 AND version = $4
            "#,
        )
        .bind(&member.code)
        .bind(Json(&member.borrowed_books))
        .bind(member.penalty_until)
        .bind(member.version)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Member {} was modified concurrently, please retry",
                member.code
            )));
        }
        Ok(())
    }

    async fn book_exists(tx: &mut Transaction<'_, Postgres>, code: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE code = $1)")
            .bind(code)
            .fetch_one(&mut **tx)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl LoanLedger for LoansRepository {
    async fn record_borrow(&self, member: &Member, book_codes: &[String]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for code in book_codes {
            let result = sqlx::query(
                "UPDATE books SET stock = stock - 1, updated_at = NOW() WHERE code = $1 AND stock > 0",
            )
            .bind(code)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping `tx` rolls back the decrements already applied
                return Err(if Self::book_exists(&mut tx, code).await? {
                    AppError::OutOfStock(code.clone())
                } else {
                    AppError::BookNotFound(code.clone())
                });
            }
        }

        Self::save_loans(&mut tx, member).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn record_return(&self, member: &Member, book_codes: &[String]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for code in book_codes {
            let result = sqlx::query(
                "UPDATE books SET stock = stock + 1, updated_at = NOW() WHERE code = $1",
            )
            .bind(code)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::BookNotFound(code.clone()));
            }
        }

        Self::save_loans(&mut tx, member).await?;
        tx.commit().await?;
        Ok(())
    }
}

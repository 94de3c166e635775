//! Members repository for database operations

use async_trait::async_trait;
use sqlx::{types::Json, Pool, Postgres};

use super::{map_unique_violation, MemberStore};
use crate::{
    error::AppResult,
    models::{member::MemberRow, Member},
};

const MEMBER_COLUMNS: &str = r#"
    code, name, email, password, role, is_active, activation_token, reset_token,
    reset_token_expires_at, borrowed_books, penalty_until, version, created_at
"#;

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> AppResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE {} = $1",
            MEMBER_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Member::try_from).transpose()
    }
}

#[async_trait]
impl MemberStore for MembersRepository {
    async fn list(&self) -> AppResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members ORDER BY code",
            MEMBER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Member::try_from).collect()
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Member>> {
        self.find_one("code", code).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE LOWER(email) = LOWER($1)",
            MEMBER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Member::try_from).transpose()
    }

    async fn find_by_activation_token(&self, token_hash: &str) -> AppResult<Option<Member>> {
        self.find_one("activation_token", token_hash).await
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<Member>> {
        self.find_one("reset_token", token_hash).await
    }

    async fn last_code(&self) -> AppResult<Option<String>> {
        let code: Option<String> =
            sqlx::query_scalar("SELECT code FROM members ORDER BY code DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(code)
    }

    async fn insert(&self, member: &Member) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO members (
                code, name, email, password, role, is_active, activation_token,
                reset_token, reset_token_expires_at, borrowed_books, penalty_until,
                version, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&member.code)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.password)
        .bind(member.role.as_str())
        .bind(member.is_active)
        .bind(&member.activation_token)
        .bind(&member.reset_token)
        .bind(member.reset_token_expires_at)
        .bind(Json(&member.borrowed_books))
        .bind(member.penalty_until)
        .bind(member.version)
        .bind(member.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Email already exist"))?;
        Ok(())
    }

    async fn update_account(&self, member: &Member) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE members SET
                name = $2, email = $3, password = $4, role = $5, is_active = $6,
                activation_token = $7, reset_token = $8, reset_token_expires_at = $9,
                updated_at = NOW()
            WHERE code = $1
            "#,
        )
        .bind(&member.code)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.password)
        .bind(member.role.as_str())
        .bind(member.is_active)
        .bind(&member.activation_token)
        .bind(&member.reset_token)
        .bind(member.reset_token_expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

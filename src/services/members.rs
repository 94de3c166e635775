//! Member registration, authentication and account recovery

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use validator::Validate;

use super::{codes::next_code, queue::EmailDispatcher};
use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        member::{
            ForgotPasswordRequest, LoginRequest, RefreshTokenRequest, RegisterMember,
            ResetPasswordRequest, TokenPair,
        },
        EmailKind, EmailTask, Member, MemberClaims, Role,
    },
    repository::MemberStore,
};

pub const MEMBER_CODE_PREFIX: char = 'M';

/// Random URL-safe token. Only its digest is stored.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct MembersService {
    members: Arc<dyn MemberStore>,
    dispatcher: Arc<dyn EmailDispatcher>,
    config: AuthConfig,
}

impl MembersService {
    pub fn new(
        members: Arc<dyn MemberStore>,
        dispatcher: Arc<dyn EmailDispatcher>,
        config: AuthConfig,
    ) -> Self {
        Self {
            members,
            dispatcher,
            config,
        }
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        let members = self.members.list().await?;
        if members.is_empty() {
            return Err(AppError::NotFound("Members not found".to_string()));
        }
        Ok(members)
    }

    /// Create an inactive member and queue the activation email
    pub async fn register(&self, request: RegisterMember) -> AppResult<Member> {
        request.validate()?;

        if self.members.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exist".to_string()));
        }

        let last = self.members.last_code().await?;
        let token = generate_token();
        let member = Member {
            code: next_code(MEMBER_CODE_PREFIX, last.as_deref())?,
            name: request.name,
            email: request.email,
            password: hash_password(&request.password)?,
            role: Role::Member,
            is_active: false,
            activation_token: Some(digest_token(&token)),
            reset_token: None,
            reset_token_expires_at: None,
            borrowed_books: Vec::new(),
            penalty_until: None,
            version: 0,
            created_at: Utc::now(),
        };
        self.members.insert(&member).await?;
        tracing::info!(code = %member.code, "Member registered");

        self.notify(EmailTask::new(
            EmailKind::Registration,
            &member.name,
            &member.email,
            &token,
        ))
        .await?;

        Ok(member)
    }

    pub async fn activate(&self, token: &str) -> AppResult<Member> {
        let mut member = self
            .members
            .find_by_activation_token(&digest_token(token))
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

        member.is_active = true;
        member.activation_token = None;
        self.members.update_account(&member).await?;

        tracing::info!(code = %member.code, "Member activated");
        Ok(member)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenPair> {
        request.validate()?;

        let wrong = || AppError::Authentication("Email or Password is wrong".to_string());
        let member = self
            .members
            .find_by_email(&request.email)
            .await?
            .ok_or_else(wrong)?;

        if !verify_password(&member.password, &request.password)? {
            return Err(wrong());
        }
        if !member.is_active {
            return Err(AppError::Authorization(
                "Account is not active, check your email".to_string(),
            ));
        }

        self.issue_tokens(&member)
    }

    pub async fn refresh(&self, request: RefreshTokenRequest) -> AppResult<TokenPair> {
        request.validate()?;

        let invalid = || AppError::Authentication("Invalid refresh token".to_string());
        let claims = MemberClaims::from_token(&request.refresh_token, &self.config.jwt_refresh_secret)
            .map_err(|_| invalid())?;
        let member = self
            .members
            .find_by_code(&claims.sub)
            .await?
            .ok_or_else(invalid)?;

        self.issue_tokens(&member)
    }

    /// Store a reset token and queue the reset email
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> AppResult<()> {
        request.validate()?;

        let mut member = self
            .members
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

        let token = generate_token();
        member.reset_token = Some(digest_token(&token));
        member.reset_token_expires_at =
            Some(Utc::now() + Duration::seconds(self.config.reset_token_ttl_secs));
        self.members.update_account(&member).await?;

        self.notify(EmailTask::new(
            EmailKind::ForgotPassword,
            &member.name,
            &member.email,
            &token,
        ))
        .await
    }

    /// Member owning a known, unexpired reset token
    pub async fn check_reset_token(&self, token: &str) -> AppResult<Member> {
        let invalid = || AppError::Validation("Invalid or expired token".to_string());
        let member = self
            .members
            .find_by_reset_token(&digest_token(token))
            .await?
            .ok_or_else(invalid)?;

        match member.reset_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => Ok(member),
            _ => Err(invalid()),
        }
    }

    pub async fn reset_password(&self, token: &str, request: ResetPasswordRequest) -> AppResult<()> {
        request.validate()?;

        let mut member = self.check_reset_token(token).await?;
        member.password = hash_password(&request.password)?;
        member.reset_token = None;
        member.reset_token_expires_at = None;
        self.members.update_account(&member).await?;

        tracing::info!(code = %member.code, "Password reset");
        Ok(())
    }

    fn issue_tokens(&self, member: &Member) -> AppResult<TokenPair> {
        let now = Utc::now().timestamp();
        let token = MemberClaims::for_member(member, now, self.config.jwt_expiration_secs)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;
        let refresh_token =
            MemberClaims::for_member(member, now, self.config.jwt_refresh_expiration_secs)
                .create_token(&self.config.jwt_refresh_secret)
                .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(TokenPair {
            token,
            refresh_token,
        })
    }

    async fn notify(&self, task: EmailTask) -> AppResult<()> {
        self.dispatcher.publish(&task).await.map_err(|e| {
            AppError::Notification(format!("{:?} email for {}: {}", task.kind, task.email, e))
        })
    }
}

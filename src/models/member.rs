//! Member model, authentication payloads and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Member roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// One outstanding loan. `book_code` is a lookup key into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    pub book_code: String,
    pub borrowed_at: DateTime<Utc>,
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    code: String,
    name: String,
    email: String,
    password: String,
    role: String,
    is_active: bool,
    activation_token: Option<String>,
    reset_token: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    borrowed_books: Json<Vec<BorrowedBook>>,
    penalty_until: Option<DateTime<Utc>>,
    version: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = AppError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|e| {
            AppError::Internal(format!("Member {} has a corrupt role: {}", row.code, e))
        })?;

        Ok(Member {
            code: row.code,
            name: row.name,
            email: row.email,
            password: row.password,
            role,
            is_active: row.is_active,
            activation_token: row.activation_token,
            reset_token: row.reset_token,
            reset_token_expires_at: row.reset_token_expires_at,
            borrowed_books: row.borrowed_books.0,
            penalty_until: row.penalty_until,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

/// Library member
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Sequential code (`M001`, `M002`, ...)
    pub code: String,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip)]
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    /// SHA-256 digest of the pending activation token
    #[serde(skip)]
    pub activation_token: Option<String>,
    /// SHA-256 digest of the pending password reset token
    #[serde(skip)]
    pub reset_token: Option<String>,
    #[serde(skip)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub borrowed_books: Vec<BorrowedBook>,
    pub penalty_until: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter, bumped on every loan write
    #[serde(skip)]
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Penalty end date if the member is still blocked at `now`
    pub fn active_penalty(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.penalty_until.filter(|until| *until > now)
    }

    pub fn holds(&self, book_code: &str) -> bool {
        self.borrowed_books.iter().any(|loan| loan.book_code == book_code)
    }
}

/// Password rule shared by registration and reset
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let rules: [(fn(&char) -> bool, &'static str); 4] = [
        (char::is_ascii_uppercase, "Password must contain at least one uppercase letter"),
        (char::is_ascii_lowercase, "Password must contain at least one lowercase letter"),
        (char::is_ascii_digit, "Password must contain at least one digit"),
        (|c| "!@#$%^&*()".contains(*c), "Password must contain at least one symbol"),
    ];

    for (rule, message) in rules {
        if !password.chars().any(|c| rule(&c)) {
            let mut error = ValidationError::new("password_strength");
            error.message = Some(message.into());
            return Err(error);
        }
    }
    Ok(())
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMember {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
    #[validate(must_match(other = "password", message = "Password and confirmation must match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
    #[validate(must_match(other = "password", message = "Password and confirmation must match"))]
    pub confirm_password: String,
}

/// Access and refresh token pair
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// JWT claims for authenticated members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberClaims {
    /// Member code
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl MemberClaims {
    pub fn for_member(member: &Member, issued_at: i64, ttl_secs: i64) -> Self {
        Self {
            sub: member.code.clone(),
            name: member.name.clone(),
            email: member.email.clone(),
            role: member.role,
            exp: issued_at + ttl_secs,
            iat: issued_at,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Allow acting on `member_code` only for that member or an admin
    pub fn require_self_or_admin(&self, member_code: &str) -> Result<(), AppError> {
        if self.is_admin() || self.sub == member_code {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Cannot manage loans of another member".to_string(),
            ))
        }
    }
}

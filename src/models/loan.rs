//! Borrow/return request payloads

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Body of `POST /borrow` and `POST /return`
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    #[validate(length(min = 1, message = "Member code is required."))]
    pub member_code: String,
    /// Processed in order; duplicates are not removed
    #[validate(length(min = 1, message = "At least one book code is required."))]
    pub book_codes: Vec<String>,
}

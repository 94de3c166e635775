//! Email tasks exchanged between the API and the email worker

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    /// Account activation link sent after registration
    Registration,
    /// Password reset link
    ForgotPassword,
}

/// Queued email. `token` is the plain token embedded in the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTask {
    pub kind: EmailKind,
    pub name: String,
    pub email: String,
    pub token: String,
    #[serde(default)]
    pub attempts: u32,
}

impl EmailTask {
    pub fn new(kind: EmailKind, name: &str, email: &str, token: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            email: email.to_string(),
            token: token.to_string(),
            attempts: 0,
        }
    }
}

//! Library lending server
//!
//! REST JSON API for a small lending library: book catalog, member
//! registration and authentication, and the borrow/return workflow with
//! stock accounting and late-return penalties. Account emails are handed to
//! a Redis-backed queue drained by the `email-worker` binary.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod shutdown;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

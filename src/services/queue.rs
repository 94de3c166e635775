//! Redis-backed email task queue
//!
//! Each [`EmailKind`] has its own list. The API pushes tasks on the left,
//! the email worker pops them from the right, so every list is FIFO.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::{
    config::RedisConfig,
    error::{AppError, AppResult},
    models::{EmailKind, EmailTask},
};

/// Hands email tasks over to the worker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn publish(&self, task: &EmailTask) -> AppResult<()>;
}

#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
    config: RedisConfig,
}

impl RedisQueue {
    /// Connect to Redis and check the connection
    pub async fn new(config: &RedisConfig) -> AppResult<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            conn,
            config: config.clone(),
        })
    }

    pub fn queue_name(&self, kind: EmailKind) -> &str {
        match kind {
            EmailKind::Registration => &self.config.registration_queue,
            EmailKind::ForgotPassword => &self.config.forgot_password_queue,
        }
    }

    /// Wait up to `poll_timeout_secs` for the next task on any queue.
    ///
    /// Returns `Ok(None)` on timeout. A payload that cannot be decoded is
    /// logged and discarded.
    pub async fn next_task(&self) -> AppResult<Option<EmailTask>> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.config.registration_queue)
            .arg(&self.config.forgot_password_queue)
            .arg(self.config.poll_timeout_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read from queue: {}", e)))?;

        let Some((queue, payload)) = popped else {
            return Ok(None);
        };

        match serde_json::from_str::<EmailTask>(&payload) {
            Ok(task) => Ok(Some(task)),
            Err(e) => {
                tracing::error!(queue = %queue, error = %e, "Dropping undecodable email task");
                Ok(None)
            }
        }
    }

    /// Put a failed task back with its attempt counter bumped.
    /// Returns `false` once the task has used all its attempts.
    pub async fn requeue(&self, mut task: EmailTask) -> AppResult<bool> {
        task.attempts += 1;
        if task.attempts >= self.config.max_attempts {
            return Ok(false);
        }
        self.publish(&task).await?;
        Ok(true)
    }
}

#[async_trait]
impl EmailDispatcher for RedisQueue {
    async fn publish(&self, task: &EmailTask) -> AppResult<()> {
        let payload = serde_json::to_string(task)
            .map_err(|e| AppError::Internal(format!("Failed to encode email task: {}", e)))?;

        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(self.queue_name(task.kind), payload)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to publish email task: {}", e)))?;

        tracing::debug!(kind = ?task.kind, email = %task.email, "Email task queued");
        Ok(())
    }
}

//! Email worker
//!
//! Drains the registration and forgot-password queues and delivers the
//! messages over SMTP. Failed deliveries are re-queued until the configured
//! number of attempts is used up.

use anyhow::Context;

use library_server::{
    config::AppConfig,
    models::EmailTask,
    services::{email::EmailService, queue::RedisQueue},
    shutdown, telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init(&config.logging, &["email_worker", "library_server"]);

    let queue = RedisQueue::new(&config.redis)
        .await
        .context("Failed to connect to Redis")?;
    let mailer = EmailService::new(config.email.clone(), &config.server.public_url);

    tracing::info!(
        registration = %config.redis.registration_queue,
        forgot_password = %config.redis.forgot_password_queue,
        "Email worker waiting for tasks"
    );

    let shutdown = shutdown::signal();
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            _ = &mut shutdown => break,
            next = queue.next_task() => next,
        };

        match next {
            Ok(Some(task)) => handle(&queue, &mailer, task).await,
            Ok(None) => {}
            Err(e) => {
                tracing::error!("{}", e);
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }

    tracing::info!("Email worker stopped");
    Ok(())
}

async fn handle(queue: &RedisQueue, mailer: &EmailService, task: EmailTask) {
    match mailer.deliver(&task).await {
        Ok(()) => tracing::info!(kind = ?task.kind, email = %task.email, "Email sent"),
        Err(e) => {
            tracing::warn!(
                kind = ?task.kind,
                email = %task.email,
                attempts = task.attempts + 1,
                "Email delivery failed: {}",
                e
            );
            let (kind, email) = (task.kind, task.email.clone());
            match queue.requeue(task).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::error!(kind = ?kind, email = %email, "Dropping email after too many attempts")
                }
                Err(e) => tracing::error!(kind = ?kind, email = %email, "Failed to requeue email: {}", e),
            }
        }
    }
}

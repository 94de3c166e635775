//! Email service for account activation and password reset messages

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::{EmailKind, EmailTask},
};

/// Subject and plain-text body of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    public_url: String,
}

impl EmailService {
    pub fn new(config: EmailConfig, public_url: &str) -> Self {
        Self {
            config,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn render(&self, task: &EmailTask) -> RenderedEmail {
        match task.kind {
            EmailKind::Registration => {
                let link = format!("{}/api/v1/auth/activate/{}", self.public_url, task.token);
                RenderedEmail {
                    subject: "Activate your library account".to_string(),
                    body: format!(
                        r#"
Hello {name},

Thank you for registering. Open the link below to activate your account:

{link}

If you didn't create an account, please ignore this email.
"#,
                        name = task.name,
                        link = link
                    ),
                }
            }
            EmailKind::ForgotPassword => {
                let link = format!(
                    "{}/api/v1/auth/reset-password/{}",
                    self.public_url, task.token
                );
                RenderedEmail {
                    subject: "Reset your library password".to_string(),
                    body: format!(
                        r#"
Hello {name},

We received a request to reset your password. Open the link below to choose a new one:

{link}

This link expires soon. If you didn't request a reset, please ignore this email.
"#,
                        name = task.name,
                        link = link
                    ),
                }
            }
        }
    }

    /// Render and deliver a queued task
    pub async fn deliver(&self, task: &EmailTask) -> AppResult<()> {
        let rendered = self.render(task);
        let email = self.build_message(&task.email, &rendered)?;
        let mailer = self.build_transport()?;

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task panicked: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn build_message(&self, to: &str, rendered: &RenderedEmail) -> AppResult<Message> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Library");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(rendered.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(rendered.body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                rendered.body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }

    fn build_transport(&self) -> AppResult<SmtpTransport> {
        let builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }
}

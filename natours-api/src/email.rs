//! Outbound email
//!
//! SMTP delivery through lettre when an `[email]` section is configured;
//! otherwise messages are written to the log, which keeps development and
//! tests free of a mail relay.

use lettre::{
    message::header::ContentType,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;
use crate::error::{Error, Result};

/// Outbound mail transport
pub enum Mailer {
    /// Deliver over SMTP
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    /// Log instead of delivering
    Log,
}

impl Mailer {
    /// Build the transport from configuration; `None` selects logging
    pub fn from_config(config: Option<&EmailConfig>) -> Result<Self> {
        let Some(config) = config else {
            return Ok(Self::Log);
        };

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| Error::Email(format!("Invalid from address: {e}")))?;

        let transport = if config.smtp_user.is_empty() {
            // No authentication, for local development relays
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| Error::Email(format!("SMTP relay error: {e}")))?
                .credentials(Credentials::new(
                    config.smtp_user.clone(),
                    config.smtp_password.clone(),
                ))
                .port(config.smtp_port)
                .build()
        };

        Ok(Self::Smtp { transport, from })
    }

    /// Send a plain-text message
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        match self {
            Self::Log => {
                tracing::info!(to, subject, "Email delivery disabled; message logged");
                tracing::debug!("{body}");
                Ok(())
            }
            Self::Smtp { transport, from } => {
                let message = Message::builder()
                    .from(from.clone())
                    .to(to
                        .parse()
                        .map_err(|e| Error::Email(format!("Invalid to address: {e}")))?)
                    .subject(subject)
                    .header(ContentType::TEXT_PLAIN)
                    .body(body.to_string())
                    .map_err(|e| Error::Email(format!("Failed to build email: {e}")))?;

                transport
                    .send(message)
                    .await
                    .map_err(|e| Error::Email(format!("Failed to send email: {e}")))?;
                Ok(())
            }
        }
    }
}

/// Render the password reset message
#[must_use]
pub fn password_reset_message(reset_url: &str) -> (String, String) {
    let subject = "Your password reset token (valid for 10 minutes)".to_string();
    let body = format!(
        "Forgot your password? Submit a PATCH request with your new password to:\n\n\
        {reset_url}\n\n\
        If you didn't forget your password, please ignore this email.\n\n\
        Thanks,\n\
        The Natours Team"
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = Mailer::Log;
        assert!(mailer
            .send("ada@example.com", "Hello", "Body")
            .await
            .is_ok());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_from_address() {
        let config = EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_email: "not an address".to_string(),
            from_name: String::new(),
        };
        assert!(Mailer::from_config(Some(&config)).is_err());
    }

    #[test]
    fn test_password_reset_message_contains_url() {
        let (subject, body) = password_reset_message("http://localhost:3000/reset/abc");
        assert!(subject.contains("10 minutes"));
        assert!(body.contains("http://localhost:3000/reset/abc"));
    }
}

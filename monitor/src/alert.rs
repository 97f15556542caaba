//! Email alert dispatch over SMTP.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use lockbox_common::{BackupError, BackupResult, EmailConfig};
use log::{debug, error, info};

/// Plain-text alert sender.
///
/// Meant to run unattended on a schedule: [`AlertMailer::send`] never lets a
/// transport failure escape, it degrades to `false` with a logged cause.
pub struct AlertMailer {
    config: EmailConfig,
}

impl AlertMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send a plain-text alert.
    ///
    /// Returns `false` without any network I/O when notifications are
    /// disabled, and `false` with a logged cause on any transport failure.
    pub async fn send(&self, subject: &str, message: &str) -> bool {
        if !self.config.enabled {
            debug!("Email notifications are disabled; dropping alert '{subject}'");
            return false;
        }

        match self.try_send(subject, message).await {
            Ok(()) => {
                info!("Alert sent: {subject}");
                true
            }
            Err(e) => {
                error!("Error sending alert '{subject}': {e}");
                false
            }
        }
    }

    async fn try_send(&self, subject: &str, body: &str) -> BackupResult<()> {
        let from: Mailbox = self
            .config
            .sender_email
            .parse()
            .map_err(|e| BackupError::Alert(format!("Invalid sender address: {e}")))?;
        let to: Mailbox = self
            .config
            .recipient_email
            .parse()
            .map_err(|e| BackupError::Alert(format!("Invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| BackupError::Alert(format!("Failed to build message: {e}")))?;

        let mut builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)
                .map_err(|e| BackupError::Alert(format!("Invalid SMTP relay: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_server)
        };
        builder = builder.port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        builder
            .build()
            .send(message)
            .await
            .map_err(|e| BackupError::Alert(format!("SMTP send failed: {e}")))?;
        Ok(())
    }
}

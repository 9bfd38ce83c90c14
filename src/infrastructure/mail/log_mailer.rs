//! Log-only mailer for development.

use async_trait::async_trait;
use tracing::{debug, info};

use super::service::{Email, MailError, Mailer};

/// A mailer that logs messages instead of delivering them.
///
/// Used when no relay is configured. The body is only logged at debug level
/// since it may contain a password-reset link.
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        debug!("Using LogMailer (mail delivery disabled)");
        Self
    }
}

impl Default for LogMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(recipient = %email.recipient, subject = %email.subject, "Mail not sent (no relay configured)");
        debug!(body = %email.html_body, "Mail body");
        Ok(())
    }
}

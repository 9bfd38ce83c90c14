//! Mailer trait and message types.

use async_trait::async_trait;
use thiserror::Error;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// Errors that can occur while delivering mail.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail template error: {0}")]
    Template(String),

    #[error("Mail relay unreachable: {0}")]
    Transport(String),

    #[error("Mail relay rejected message with status {0}")]
    Rejected(u16),
}

impl From<askama::Error> for MailError {
    fn from(e: askama::Error) -> Self {
        MailError::Template(e.to_string())
    }
}

/// Trait for delivering email.
///
/// # Implementations
///
/// - [`crate::infrastructure::mail::HttpMailer`] - HTTP relay
/// - [`crate::infrastructure::mail::LogMailer`] - Log-only delivery
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `email`.
    ///
    /// # Errors
    ///
    /// Returns [`MailError`] when the message could not be handed to the relay.
    /// Callers must treat the message as not sent.
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

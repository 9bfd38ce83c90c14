//! Email templates.

use askama::Template;

use super::service::{Email, MailError};

/// Password reset message. Renders `templates/password_reset.html`.
#[derive(Template)]
#[template(path = "password_reset.html")]
pub struct PasswordResetEmail<'a> {
    pub name: &'a str,
    pub reset_url: &'a str,
    pub valid_minutes: i64,
}

impl PasswordResetEmail<'_> {
    pub const SUBJECT: &'static str = "Your password reset token (valid for 10 min)";

    /// Renders the message for `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Template`] if rendering fails.
    pub fn to_email(&self, recipient: &str) -> Result<Email, MailError> {
        Ok(Email {
            recipient: recipient.to_string(),
            subject: Self::SUBJECT.to_string(),
            html_body: self.render()?,
        })
    }
}

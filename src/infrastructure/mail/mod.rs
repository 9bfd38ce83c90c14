//! Outbound mail delivery.
//!
//! Provides a [`Mailer`] trait with two implementations:
//! - [`HttpMailer`] - Posts messages to an HTTP mail relay
//! - [`LogMailer`] - Logs messages instead of sending them (no relay configured)
//!
//! Message bodies are rendered from askama templates in [`templates`].

mod http_mailer;
mod log_mailer;
mod service;
pub mod templates;

pub use http_mailer::HttpMailer;
pub use log_mailer::LogMailer;
pub use service::{Email, MailError, Mailer};

#[cfg(test)]
pub use service::MockMailer;

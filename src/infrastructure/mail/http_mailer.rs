//! HTTP mail relay client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::service::{Email, MailError, Mailer};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Mailer posting JSON messages to an HTTP relay.
///
/// The relay receives `{from, to, subject, html}` with the API key as a
/// bearer token. Any non-2xx response counts as a failed delivery.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    /// Creates a mailer for the relay at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Transport`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str, api_key: &str, from: &str) -> Result<Self, MailError> {
        let client = Client::builder()
            .user_agent(concat!("tourify/", env!("CARGO_PKG_VERSION")))
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        info!("Mail relay configured at {}", endpoint);

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let message = RelayMessage {
            from: &self.from,
            to: &email.recipient,
            subject: &email.subject,
            html: &email.html_body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                error!("Mail relay request failed: {}", e);
                MailError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "Mail relay rejected message");
            return Err(MailError::Rejected(status.as_u16()));
        }

        debug!(recipient = %email.recipient, "Mail delivered to relay");
        Ok(())
    }
}

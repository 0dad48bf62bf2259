//! Mailgun HTTP API mailer.
//!
//! Sends plain-text messages through Mailgun's `messages` endpoint.
//! Reference: https://documentation.mailgun.com/docs/mailgun/api-reference/openapi-final/tag/Messages/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};
use url::Url;

use super::{Mailer, NotifyError, OutgoingEmail};

/// Mailer backed by the Mailgun HTTP API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct MailgunMailer {
    client: Client,
    api_key: String,
    endpoint: Url,
}

impl MailgunMailer {
    /// Create a mailer for `domain` using the given API base URL.
    pub fn new(
        api_base: &str,
        domain: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: messages_endpoint(api_base, domain)?,
        })
    }

    /// The URL messages are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth("api", Some(&self.api_key))
            .form(&form_fields(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            error!(
                status_code = status.as_u16(),
                response_preview = %preview,
                "mailgun_send_rejected"
            );
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            status_code = status.as_u16(),
            recipients = email.to.len(),
            "mailgun_send_complete"
        );

        Ok(())
    }
}

/// Build `{api_base}/{domain}/messages`.
fn messages_endpoint(api_base: &str, domain: &str) -> Result<Url, url::ParseError> {
    let base = Url::parse(&format!("{}/", api_base.trim_end_matches('/')))?;
    base.join(&format!("{}/messages", domain.trim_matches('/')))
}

/// Form fields for the messages endpoint. Each recipient gets its own `to`.
fn form_fields(email: &OutgoingEmail) -> Vec<(&'static str, &str)> {
    let mut fields = vec![
        ("from", email.from.as_str()),
        ("subject", email.subject.as_str()),
        ("text", email.body.as_str()),
    ];
    fields.extend(email.to.iter().map(|to| ("to", to.as_str())));
    fields
}

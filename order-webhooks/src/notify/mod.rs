//! Customer notification module.
//!
//! This module provides:
//! - The `Mailer` seam for outbound email
//! - A Mailgun HTTP API mailer and a log-only mailer
//! - The shipping address correction email
//!
//! ## Flow
//!
//! ```text
//! Order → send_correction_email() → OutgoingEmail → Mailer::send()
//! ```

pub mod console;
pub mod mailgun;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::order::Order;

pub use console::LogMailer;
pub use mailgun::MailgunMailer;

/// Subject line of the correction email.
pub const CORRECTION_SUBJECT: &str = "Please correct the errors in your order shipping address";

/// Body of the correction email.
pub const CORRECTION_BODY: &str = include_str!("../../templates/correct_shipping_address.txt");

/// Errors raised while delivering an email.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP request to the mail provider failed.
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The mail provider answered with a non-success status.
    #[error("mail provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The provider endpoint could not be built from configuration.
    #[error("invalid mail endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// A plain-text email ready to hand to a mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single message. No retries.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError>;
}

/// Build the correction email for a customer.
pub fn correction_email(from: &str, to: &str) -> OutgoingEmail {
    OutgoingEmail {
        subject: CORRECTION_SUBJECT.to_string(),
        body: CORRECTION_BODY.to_string(),
        from: from.to_string(),
        to: vec![to.to_string()],
    }
}

/// Errors raised while asking a customer to fix their address.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// The order carries no customer email to write to.
    #[error("order has no customer email")]
    MissingCustomerEmail,

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Ask the customer to correct their shipping address.
///
/// Returns the address the email was sent to.
pub async fn send_correction_email(
    mailer: &dyn Mailer,
    from: &str,
    order: &Order,
) -> Result<String, CorrectionError> {
    let to = order
        .customer_email()
        .ok_or(CorrectionError::MissingCustomerEmail)?
        .to_string();
    let email = correction_email(from, &to);

    info!(to = %to, subject = %email.subject, "correction_email_sending");

    mailer.send(&email).await?;

    info!(to = %to, "correction_email_sent");

    Ok(to)
}

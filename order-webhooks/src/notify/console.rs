//! Log-only mailer for development.

use async_trait::async_trait;
use tracing::info;

use super::{Mailer, NotifyError, OutgoingEmail};

/// Mailer that writes messages to the log instead of delivering them.
///
/// Used when no mail provider is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        info!(
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            body = %email.body,
            "log_mailer_message"
        );
        Ok(())
    }
}

//! Webhook error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::notify::{CorrectionError, NotifyError};

/// Errors that end a webhook request early.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or wrong `X-Shopify-Hmac-Sha256`.
    #[error("webhook signature could not be verified")]
    Unauthorized,

    /// The signed body is not a valid order document.
    #[error("invalid order payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// A correction email is due but the order has no customer email.
    #[error("order has no customer email")]
    MissingCustomerEmail,

    /// The mail provider could not deliver the correction email.
    #[error("failed to send correction email: {0}")]
    Notify(#[from] NotifyError),
}

impl From<CorrectionError> for WebhookError {
    fn from(err: CorrectionError) -> Self {
        match err {
            CorrectionError::MissingCustomerEmail => WebhookError::MissingCustomerEmail,
            CorrectionError::Notify(e) => WebhookError::Notify(e),
        }
    }
}

impl WebhookError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) | WebhookError::MissingCustomerEmail => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, status_code = status.as_u16(), "order_webhook_failed");
        } else {
            warn!(error = %self, status_code = status.as_u16(), "order_webhook_rejected");
        }

        let body = match self {
            WebhookError::Unauthorized => "Unauthorized",
            WebhookError::InvalidPayload(_) => "Invalid order payload",
            WebhookError::MissingCustomerEmail => "Missing customer email",
            WebhookError::Notify(_) => "Internal Server Error",
        };

        (status, body).into_response()
    }
}

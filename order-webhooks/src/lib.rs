//! Order Webhooks - Shopify order creation webhook.
//!
//! Receives `orders/create` events, verifies their HMAC signature and emails
//! customers whose shipping address contains non-ASCII characters, asking them
//! to resend it in Latin characters.
//!
//! ## Architecture
//!
//! ```text
//! Shopify → POST /orders/creation → verify → parse → check address → Mailer
//! ```

pub mod config;
pub mod notify;
pub mod order;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use notify::{LogMailer, MailgunMailer, Mailer, NotifyError, OutgoingEmail};
pub use order::{Order, ShippingAddress};
pub use web::{router, AppState, WebhookError};

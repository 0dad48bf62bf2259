//! Web server module for the order creation webhook.
//!
//! This module provides a small web server that:
//! - Receives Shopify `orders/create` webhooks
//! - Verifies the HMAC signature against the raw body
//! - Emails customers whose shipping address is not plain ASCII
//! - Acknowledges every verified delivery with 200

pub mod error;
pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::WebhookError;
pub use handlers::{health, not_found, order_creation, AppState, HealthResponse};
pub use signature::{compute_signature, verify_shopify_signature, HMAC_HEADER};

/// Path of the order creation webhook.
pub const ORDER_CREATION_PATH: &str = "/orders/creation";

/// Build the application router.
///
/// Methods other than POST on the webhook path answer 404, like any unknown
/// path.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            ORDER_CREATION_PATH,
            post(order_creation).fallback(not_found),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

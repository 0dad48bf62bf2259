//! Webhook endpoint handlers.
//!
//! The order creation handler runs one synchronous path per request:
//! 1. Verify the signature over the raw body
//! 2. Parse the order
//! 3. Check the shipping address
//! 4. Email the customer if the address is not plain ASCII
//!
//! Every verified request is acknowledged with `200 Verified`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::notify::{send_correction_email, Mailer};
use crate::order::Order;
use crate::web::error::WebhookError;
use crate::web::signature::{is_secret_configured, verify_shopify_signature, HMAC_HEADER};
use crate::Config;

/// Body of the acknowledgement for verified deliveries.
pub const VERIFIED: &str = "Verified";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config: Arc::new(config),
            mailer,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

// =============================================================================
// Order Creation Webhook
// =============================================================================

/// Read a header as a string, ignoring non-visible-ASCII values.
fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Shopify `orders/create` webhook endpoint.
///
/// The body is taken as raw bytes so the signature is checked against exactly
/// what Shopify signed.
pub async fn order_creation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, WebhookError> {
    info!(
        topic = ?header(&headers, "X-Shopify-Topic"),
        shop_domain = ?header(&headers, "X-Shopify-Shop-Domain"),
        webhook_id = ?header(&headers, "X-Shopify-Webhook-Id"),
        body_length = body.len(),
        has_signature = headers.contains_key(HMAC_HEADER),
        "order_webhook_received"
    );

    let secret = &state.config.shopify_webhook_secret;
    if !is_secret_configured(secret) {
        // Nothing can be verified without a secret.
        return Err(WebhookError::Unauthorized);
    }

    let verified = verify_shopify_signature(
        secret.as_deref().unwrap_or_default(),
        &body,
        header(&headers, HMAC_HEADER),
    );
    if !verified {
        return Err(WebhookError::Unauthorized);
    }

    let order = Order::from_slice(&body)?;

    if order.has_ascii_shipping_address() {
        info!("order_address_ascii");
    } else {
        info!(
            has_customer_email = order.customer_email().is_some(),
            "order_address_non_ascii"
        );
        send_correction_email(
            state.mailer.as_ref(),
            &state.config.default_from_email,
            &order,
        )
        .await?;
    }

    info!("order_webhook_verified");

    Ok(VERIFIED)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{DEFAULT_FROM_EMAIL, DEFAULT_MAILGUN_API_BASE};
    use crate::notify::{NotifyError, OutgoingEmail, CORRECTION_SUBJECT};
    use crate::web::{compute_signature, router, ORDER_CREATION_PATH};

    const SECRET: &str = "shpss_test_secret";

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn config(secret: Option<&str>) -> Config {
        Config {
            port: 8080,
            shopify_webhook_secret: secret.map(str::to_string),
            default_from_email: DEFAULT_FROM_EMAIL.to_string(),
            mailgun_api_key: None,
            mailgun_domain: None,
            mailgun_api_base: DEFAULT_MAILGUN_API_BASE.to_string(),
            request_timeout_ms: 8000,
        }
    }

    fn app(mailer: Arc<RecordingMailer>) -> Router {
        router(AppState::new(config(Some(SECRET)), mailer))
    }

    fn order_body(address1: Option<&str>) -> String {
        let mut order = json!({
            "shipping_address": {},
            "customer": {"email": "fake@fake.com"}
        });
        if let Some(address1) = address1 {
            order["shipping_address"]["address1"] = json!(address1);
        }
        order.to_string()
    }

    fn signed_post(body: &str, secret: &str) -> Request<Body> {
        let signature = compute_signature(body.as_bytes(), secret).unwrap();
        Request::builder()
            .method(Method::POST)
            .uri(ORDER_CREATION_PATH)
            .header("content-type", "application/json")
            .header(HMAC_HEADER, signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_returns_404_for_get_requests() {
        let response = app(Arc::default())
            .oneshot(
                Request::get(ORDER_CREATION_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_returns_401_for_unsigned_post_requests() {
        let response = app(Arc::default())
            .oneshot(
                Request::post(ORDER_CREATION_PATH)
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_returns_401_for_wrongly_signed_post_requests() {
        let mailer = Arc::new(RecordingMailer::default());
        let body = order_body(Some("测试"));

        let response = app(mailer.clone())
            .oneshot(signed_post(&body, "Wrong key"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_returns_401_when_secret_not_configured() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = router(AppState::new(config(None), mailer));
        let body = order_body(None);

        let response = app.oneshot(signed_post(&body, "")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_secret_whitespace_is_part_of_the_key() {
        let app = router(AppState::new(
            config(Some(" padded_secret ")),
            Arc::new(RecordingMailer::default()),
        ));
        let body = order_body(None);

        let padded = app
            .clone()
            .oneshot(signed_post(&body, " padded_secret "))
            .await
            .unwrap();
        assert_eq!(padded.status(), StatusCode::OK);

        let trimmed = app.oneshot(signed_post(&body, "padded_secret")).await.unwrap();
        assert_eq!(trimmed.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_must_handle_verified_post_requests() {
        let mailer = Arc::new(RecordingMailer::default());
        let body = order_body(None);

        let response = app(mailer.clone())
            .oneshot(signed_post(&body, SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, VERIFIED);
        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_no_email_for_ascii_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let body = order_body(Some("123 Shipping Street"));

        let response = app(mailer.clone())
            .oneshot(signed_post(&body, SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_email_is_sent_to_customer_with_non_english_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let body = order_body(Some("测试"));

        let response = app(mailer.clone())
            .oneshot(signed_post(&body, SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, VERIFIED);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["fake@fake.com".to_string()]);
        assert_eq!(sent[0].from, DEFAULT_FROM_EMAIL);
        assert_eq!(sent[0].subject, CORRECTION_SUBJECT);
    }

    #[tokio::test]
    async fn test_email_is_sent_for_non_ascii_second_line() {
        let mailer = Arc::new(RecordingMailer::default());
        let body = json!({
            "shipping_address": {"address1": "1 Main St", "address2": "Wohnung Nr. 5, Hinterhaus über"},
            "customer": {"email": "fake@fake.com"}
        })
        .to_string();

        let response = app(mailer.clone())
            .oneshot(signed_post(&body, SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(mailer.count(), 1);
    }

    #[tokio::test]
    async fn test_identical_requests_send_duplicate_emails() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(mailer.clone());
        let body = order_body(Some("测试"));

        for _ in 0..2 {
            let response = app.clone().oneshot(signed_post(&body, SECRET)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(mailer.count(), 2);
    }

    #[tokio::test]
    async fn test_returns_400_for_malformed_signed_json() {
        let mailer = Arc::new(RecordingMailer::default());

        let response = app(mailer.clone())
            .oneshot(signed_post("{not json", SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_returns_400_for_signed_json_array() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(mailer.clone());

        for body in ["[]", r#"[{"address1":"测试"},{"email":"x@y.z"}]"#] {
            let response = app.clone().oneshot(signed_post(body, SECRET)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_wrongly_typed_customer_is_fine_for_ascii_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(mailer.clone());

        for body in [
            json!({"shipping_address": {"address1": "1 Main St"}, "customer": {"email": 5}}),
            json!({"shipping_address": {"address1": "1 Main St"}, "customer": "x"}),
        ] {
            let response = app
                .clone()
                .oneshot(signed_post(&body.to_string(), SECRET))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_returns_400_when_email_needed_but_wrongly_typed() {
        let mailer = Arc::new(RecordingMailer::default());
        let body = json!({"shipping_address": {"address1": "测试"}, "customer": {"email": 5}})
            .to_string();

        let response = app(mailer.clone())
            .oneshot(signed_post(&body, SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_returns_400_when_email_needed_but_missing() {
        let mailer = Arc::new(RecordingMailer::default());
        let body = json!({"shipping_address": {"address1": "测试"}}).to_string();

        let response = app(mailer.clone())
            .oneshot(signed_post(&body, SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_missing_email_is_fine_for_ascii_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let body = json!({"shipping_address": {"address1": "1 Main St"}}).to_string();

        let response = app(mailer.clone())
            .oneshot(signed_post(&body, SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_returns_500_when_mailer_fails() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let body = order_body(Some("测试"));

        let response = app(mailer)
            .oneshot(signed_post(&body, SECRET))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

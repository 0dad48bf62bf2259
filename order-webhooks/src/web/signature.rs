//! Shopify webhook signature verification.
//!
//! Shopify signs every webhook body with HMAC-SHA256 using the app's shared
//! secret and sends the base64 digest in the `X-Shopify-Hmac-Sha256` header.
//! Reference: https://shopify.dev/docs/apps/build/webhooks/subscribe/https#step-2-validate-the-origin-of-your-webhook-to-ensure-its-coming-from-shopify

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 digest of the raw body.
pub const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

/// Compute the value Shopify would send in [`HMAC_HEADER`] for `body`.
///
/// Returns `None` only if the key is rejected by the MAC, which HMAC never
/// does for any key length.
pub fn compute_signature(body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify a Shopify webhook signature.
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `body` - The raw request body, exactly as received
/// * `signature` - The header value, if the header was present
///
/// # Returns
///
/// `true` if the signature matches, `false` otherwise.
pub fn verify_shopify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> bool {
    let signature = signature.map(str::trim).unwrap_or_default();

    if secret.is_empty() || signature.is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature.is_empty(),
            "shopify_signature_missing_fields"
        );
        return false;
    }

    let expected_signature = match compute_signature(body, secret) {
        Some(s) => s,
        None => {
            warn!("shopify_signature_invalid_key");
            return false;
        }
    };

    let valid = constant_time_compare(&expected_signature, signature);

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            body_length = body.len(),
            "shopify_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check if a usable webhook secret is configured.
pub fn is_secret_configured(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false)
}

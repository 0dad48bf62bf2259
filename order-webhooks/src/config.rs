//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables at startup. The values
//! are read-only afterwards and shared with handlers through `AppState`.

use std::env;
use tracing::warn;

/// Default Mailgun API base URL (US region).
pub const DEFAULT_MAILGUN_API_BASE: &str = "https://api.mailgun.net/v3";

/// Sender used when `DEFAULT_FROM_EMAIL` is not set.
pub const DEFAULT_FROM_EMAIL: &str = "webmaster@localhost";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret Shopify signs webhook bodies with
    pub shopify_webhook_secret: Option<String>,

    /// Sender address for customer emails
    pub default_from_email: String,

    /// Mailgun private API key
    pub mailgun_api_key: Option<String>,

    /// Mailgun sending domain
    pub mailgun_domain: Option<String>,

    /// Mailgun API base URL, overridable for the EU region
    pub mailgun_api_base: String,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            shopify_webhook_secret: non_blank_raw("SHOPIFY_APP_WEBHOOK_SECRET"),

            default_from_email: non_empty("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string()),

            mailgun_api_key: non_empty("MAILGUN_API_KEY"),

            mailgun_domain: non_empty("MAILGUN_DOMAIN"),

            mailgun_api_base: non_empty("MAILGUN_API_BASE")
                .unwrap_or_else(|| DEFAULT_MAILGUN_API_BASE.to_string()),

            request_timeout_ms: parse_u64("REQUEST_TIMEOUT_MS", 8000),
        }
    }

    /// Mailgun credentials, if both the key and the domain are configured.
    pub fn mailgun_credentials(&self) -> Option<(&str, &str)> {
        match (&self.mailgun_api_key, &self.mailgun_domain) {
            (Some(key), Some(domain)) => Some((key.as_str(), domain.as_str())),
            _ => None,
        }
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a variable verbatim, treating all-blank values as unset.
///
/// Used for keys, where surrounding whitespace is part of the value.
fn non_blank_raw(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an unsigned integer, falling back to `default` on bad input.
fn parse_u64(name: &str, default: u64) -> u64 {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid integer, using default");
            default
        }
    }
}

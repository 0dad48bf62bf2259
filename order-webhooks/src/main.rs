//! Order Webhooks Server - Shopify order creation webhook receiver.
//!
//! This binary:
//! - Receives Shopify `orders/create` webhooks
//! - Verifies the HMAC signature
//! - Emails customers whose shipping address is not plain ASCII
//! - Returns 200 for every verified delivery

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use order_webhooks::{router, AppState, Config, LogMailer, MailgunMailer, Mailer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_secret_configured = config.shopify_webhook_secret.is_some(),
        default_from_email = %config.default_from_email,
        mailgun_configured = config.mailgun_credentials().is_some(),
        "config_loaded"
    );

    if config.shopify_webhook_secret.is_none() {
        warn!("shopify_webhook_secret_missing");
    }

    let mailer = build_mailer(&config)?;

    // Build the router
    let app = router(AppState::new(config.clone(), mailer));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Pick Mailgun when it is configured, otherwise log messages only.
fn build_mailer(config: &Config) -> Result<Arc<dyn Mailer>> {
    match config.mailgun_credentials() {
        Some((api_key, domain)) => {
            let mailer = MailgunMailer::new(
                &config.mailgun_api_base,
                domain,
                api_key,
                Duration::from_millis(config.request_timeout_ms),
            )
            .context("Failed to create Mailgun mailer")?;
            info!(endpoint = %mailer.endpoint(), "mailgun_mailer_created");
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("mailgun_not_configured_using_log_mailer");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}

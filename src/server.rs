//! HTTP server initialization and runtime setup.
//!
//! Handles store connection, mailer selection and the Axum server lifecycle.

use crate::api::middleware::rate_limit;
use crate::config::Config;
use crate::infrastructure::mail::{HttpMailer, LogMailer, Mailer};
use crate::infrastructure::persistence;
use crate::routes::app;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Document store (PostgreSQL with migrations, or in-memory)
/// - Mailer (HTTP relay, or log-only when no relay is configured)
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = persistence::connect(&config).await?;

    let mailer: Arc<dyn Mailer> = match &config.mail_api_url {
        Some(endpoint) => {
            let api_key = config.mail_api_key.as_deref().unwrap_or_default();
            let mailer = HttpMailer::new(endpoint, api_key, &config.mail_from)
                .context("Failed to build mail client")?;
            tracing::info!("Mail relay enabled");
            Arc::new(mailer)
        }
        None => {
            tracing::info!("Mail relay disabled (LogMailer)");
            Arc::new(LogMailer::new())
        }
    };

    let state = AppState::new(store, mailer, &config.auth_settings());

    let limit = rate_limit::layer(config.rate_limit_burst, config.rate_limit_replenish_secs)?;
    let app = app(state, Some(limit));

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

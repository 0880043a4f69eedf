//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the CareWatch REST API (with OpenAPI/Swagger UI) on its own.
//!
//! ## Intended use
//! Useful during development. The workspace's main `carewatch-run` binary serves the same router.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carewatch_core::{
    config::{overdue_grace_minutes_from_env_value, risk_convention_from_env_value},
    constants::DEFAULT_REST_ADDR,
    CoreConfig,
};

/// Main entry point for the CareWatch REST API server
///
/// # Environment Variables
/// - `CAREWATCH_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CAREWATCH_OVERDUE_GRACE_MINUTES`: Overdue grace period (default: 30)
/// - `CAREWATCH_RISK_CONVENTION`: `dual-window` (default) or `twelve-month-only`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration values are invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CAREWATCH_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let grace =
        overdue_grace_minutes_from_env_value(std::env::var("CAREWATCH_OVERDUE_GRACE_MINUTES").ok())?;
    let convention =
        risk_convention_from_env_value(std::env::var("CAREWATCH_RISK_CONVENTION").ok())?;
    let cfg = Arc::new(CoreConfig::new(grace, convention)?);

    tracing::info!(
        "-- Starting CareWatch REST API on {} (grace {} min, {} risk convention)",
        addr,
        cfg.overdue_grace_minutes(),
        cfg.risk_convention()
    );

    let app = api_rest::router(cfg);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

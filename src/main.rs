use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carewatch_core::{
    CoreConfig,
    config::{overdue_grace_minutes_from_env_value, risk_convention_from_env_value},
    constants::DEFAULT_REST_ADDR,
};

/// Main entry point for the CareWatch application
///
/// Resolves configuration once, then serves the REST API (with Swagger UI at `/swagger-ui`)
/// until interrupted.
///
/// # Environment Variables
/// - `CAREWATCH_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CAREWATCH_OVERDUE_GRACE_MINUTES`: Minutes past a dose before it is overdue (default: 30)
/// - `CAREWATCH_RISK_CONVENTION`: `dual-window` (default) or `twelve-month-only`
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carewatch=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("CAREWATCH_REST_ADDR")
        .unwrap_or_else(|_| DEFAULT_REST_ADDR.into())
        .parse()?;

    let grace =
        overdue_grace_minutes_from_env_value(std::env::var("CAREWATCH_OVERDUE_GRACE_MINUTES").ok())?;
    let convention =
        risk_convention_from_env_value(std::env::var("CAREWATCH_RISK_CONVENTION").ok())?;
    let cfg = Arc::new(CoreConfig::new(grace, convention)?);

    tracing::info!("++ Starting CareWatch REST on {}", rest_addr);
    tracing::info!(
        "++ Overdue grace {} min, {} risk convention",
        cfg.overdue_grace_minutes(),
        cfg.risk_convention()
    );

    let app = api_rest::router(cfg);
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {:?}", e);
            }
        })
        .await?;

    tracing::info!("-- CareWatch stopped");
    Ok(())
}

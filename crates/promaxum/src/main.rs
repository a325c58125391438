//! Promaxum demo server binary.

use anyhow::Context;
use prometheus::{IntGaugeVec, Opts};
use promaxum::{ServerSettings, create_router, handler_for, instrument_metric_handler, run_server};
use promaxum_core::Registry;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ServerSettings::load().context("failed to load settings")?;
    let addr = settings
        .addr()
        .with_context(|| format!("invalid listen address {}:{}", settings.host, settings.port))?;

    tracing::info!("Starting promaxum v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        max_requests_in_flight = settings.max_requests_in_flight,
        timeout_ms = settings.timeout_ms,
        enable_open_metrics = settings.enable_open_metrics,
        error_handling = %settings.error_handling,
        "Metrics handler settings"
    );

    let registry = Registry::new();
    let build_info = IntGaugeVec::new(
        Opts::new("promaxum_build_info", "Build information of the promaxum binary."),
        &["version"],
    )?;
    build_info
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1);
    registry.register(build_info)?;

    let metrics = handler_for(
        registry.clone(),
        settings.handler_opts().registry(registry.clone()),
    )?;
    let metrics = instrument_metric_handler(&registry, metrics)?;

    run_server(addr, create_router(metrics)).await?;

    Ok(())
}

//! Carbon Intensity Cache binary: polls the configured emissions service on
//! a fixed interval and persists the result as an atomically-written
//! snapshot (spec.md §4.1).
//!
//! # Environment
//!
//! - `ELECTRICITY_MAPS_API_KEY` (required)
//! - `POLL_INTERVAL_MINUTES`, `CACHE_TTL_MINUTES`, `CACHE_FILE`, `ZONES`,
//!   `ELECTRICITY_MAPS_BASE_URL`

use anyhow::{Context, Result};
use cawp::cic::{run_loop, EmissionsClient};
use cawp::config::{self, CicConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cfg = CicConfig::from_env().context("loading CIC configuration")?;
    config::init_cic(cfg);
    let cfg = config::cic();

    info!(
        zones = cfg.zones.len(),
        poll_interval_mins = cfg.poll_interval.as_secs() / 60,
        ttl_mins = cfg.ttl.as_secs() / 60,
        "starting carbon intensity cache"
    );

    let client = EmissionsClient::new(cfg.emissions_base_url.clone(), cfg.api_token.clone());

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    run_loop(
        cfg.zones.clone(),
        client,
        cfg.poll_interval,
        cfg.ttl,
        cfg.cache_file.clone(),
        shutdown,
    )
    .await;

    info!("carbon intensity cache stopped");
    Ok(())
}

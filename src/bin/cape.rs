//! Carbon-Aware Placement Engine binary.
//!
//! The real platform's watch/bind API (spec.md §1) is out of scope for
//! this core; this binary drives [`cawp::cape::DemoPlatform`], a
//! file-backed stand-in, so the filter/score/bind pipeline can be run
//! standalone against a declared host/unit graph.
//!
//! # Environment
//!
//! - `CACHE_FILE`, `CARBON_AWARE_MODE`, `SCHEDULER_NAME`
//! - `CAPE_DEMO_PLATFORM_FILE` — path to the JSON host/unit document
//!   (required; see [`cawp::cape::DemoPlatform::load`])

use anyhow::{Context, Result};
use cawp::cape::{BaselinePolicy, CarbonAwarePolicy, DemoPlatform, FileSnapshotSource, PlacementEngine};
use cawp::config::{self, CapeConfig};
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

    let cfg = CapeConfig::from_env().context("loading CAPE configuration")?;
    config::init_cape(cfg);
    let cfg = config::cape();

    let demo_file = std::env::var("CAPE_DEMO_PLATFORM_FILE")
        .context("CAPE_DEMO_PLATFORM_FILE is required to run the placement engine standalone")?;
    let platform = DemoPlatform::load(std::path::Path::new(&demo_file))
        .with_context(|| format!("loading demo platform document at {demo_file}"))?;

    info!(
        scheduler_name = %cfg.scheduler_name,
        carbon_aware = cfg.carbon_aware,
        hosts = platform.host_names().len(),
        "starting carbon-aware placement engine"
    );

    let snapshot_source = FileSnapshotSource::new(cfg.cache_file.clone());

    if cfg.carbon_aware {
        let engine = PlacementEngine::new(platform, snapshot_source, CarbonAwarePolicy, cfg.scheduler_name.clone());
        engine.run().await;
    } else {
        let engine = PlacementEngine::new(platform, snapshot_source, BaselinePolicy, cfg.scheduler_name.clone());
        engine.run().await;
    }

    info!("placement engine observation stream ended");
    Ok(())
}

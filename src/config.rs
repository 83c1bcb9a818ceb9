//! Process-wide configuration, loaded once from the environment.
//!
//! Mirrors the init/get `OnceLock` pattern used throughout this codebase's
//! lineage: call [`init`] exactly once at process startup, then [`get`]
//! anywhere a component needs a config value. A missing or malformed config
//! is a startup bug, not a recoverable runtime condition.

pub mod defaults;

use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while assembling [`Config`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    MissingRequired(&'static str),
    #[error("{key} has invalid value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Carbon Intensity Cache configuration (§6, §7).
#[derive(Debug, Clone)]
pub struct CicConfig {
    /// `ELECTRICITY_MAPS_API_KEY` — auth token for the emissions service.
    pub api_token: String,
    /// `POLL_INTERVAL_MINUTES`, default 5.
    pub poll_interval: Duration,
    /// `CACHE_TTL_MINUTES`, default 10.
    pub ttl: Duration,
    /// `CACHE_FILE` — snapshot path.
    pub cache_file: std::path::PathBuf,
    /// `ZONES` — comma-separated region tags to poll.
    pub zones: Vec<String>,
    /// Base URL of the emissions service (not in the env table, but every
    /// deployment needs one — kept separate from the API token so tests can
    /// point it at a mock server).
    pub emissions_base_url: String,
}

/// Carbon-Aware Placement Engine configuration (§6, §7).
#[derive(Debug, Clone)]
pub struct CapeConfig {
    /// `CACHE_FILE` — same snapshot path CIC writes.
    pub cache_file: std::path::PathBuf,
    /// `CARBON_AWARE_MODE` — `false` disables carbon scoring. Default on.
    pub carbon_aware: bool,
    /// This engine's configured scheduler name (§6 "Unit scheduler-name field").
    pub scheduler_name: String,
}

impl CicConfig {
    /// Load from environment variables, applying the documented defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = std::env::var("ELECTRICITY_MAPS_API_KEY")
            .map_err(|_| ConfigError::MissingRequired("ELECTRICITY_MAPS_API_KEY"))?;

        let poll_interval_minutes = parse_env_or(
            "POLL_INTERVAL_MINUTES",
            defaults::DEFAULT_POLL_INTERVAL_MINUTES,
        )?;
        let ttl_minutes = parse_env_or("CACHE_TTL_MINUTES", defaults::DEFAULT_TTL_MINUTES)?;

        let cache_file = std::env::var("CACHE_FILE")
            .unwrap_or_else(|_| defaults::DEFAULT_CACHE_FILE.to_string())
            .into();

        let zones = std::env::var("ZONES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|z| !z.is_empty())
            .map(str::to_string)
            .collect();

        let emissions_base_url = std::env::var("ELECTRICITY_MAPS_BASE_URL")
            .unwrap_or_else(|_| defaults::DEFAULT_EMISSIONS_BASE_URL.to_string());

        Ok(Self {
            api_token,
            poll_interval: Duration::from_secs(poll_interval_minutes * 60),
            ttl: Duration::from_secs(ttl_minutes * 60),
            cache_file,
            zones,
            emissions_base_url,
        })
    }
}

impl CapeConfig {
    /// Load from environment variables, applying the documented defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cache_file = std::env::var("CACHE_FILE")
            .unwrap_or_else(|_| defaults::DEFAULT_CACHE_FILE.to_string())
            .into();

        let carbon_aware = match std::env::var("CARBON_AWARE_MODE") {
            Ok(v) => !v.eq_ignore_ascii_case("false"),
            Err(_) => true,
        };

        let scheduler_name = std::env::var("SCHEDULER_NAME")
            .unwrap_or_else(|_| defaults::DEFAULT_SCHEDULER_NAME.to_string());

        Ok(Self {
            cache_file,
            carbon_aware,
            scheduler_name,
        })
    }
}

fn parse_env_or(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(v) => v.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
            key,
            value: v,
            reason: e.to_string(),
        }),
    }
}

static CIC_CONFIG: OnceLock<CicConfig> = OnceLock::new();
static CAPE_CONFIG: OnceLock<CapeConfig> = OnceLock::new();

/// Initialize the global CIC configuration. Must be called exactly once.
pub fn init_cic(config: CicConfig) {
    if CIC_CONFIG.set(config).is_err() {
        tracing::warn!("config::init_cic() called more than once — ignoring");
    }
}

/// Get the global CIC configuration.
///
/// Panics if `init_cic()` has not been called — a missing config is a
/// startup bug, not a recoverable condition.
pub fn cic() -> &'static CicConfig {
    CIC_CONFIG
        .get()
        .expect("config::cic() called before config::init_cic()")
}

/// Initialize the global CAPE configuration. Must be called exactly once.
pub fn init_cape(config: CapeConfig) {
    if CAPE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init_cape() called more than once — ignoring");
    }
}

/// Get the global CAPE configuration.
///
/// Panics if `init_cape()` has not been called.
pub fn cape() -> &'static CapeConfig {
    CAPE_CONFIG
        .get()
        .expect("config::cape() called before config::init_cape()")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cape_config_defaults_carbon_aware_on() {
        std::env::remove_var("CARBON_AWARE_MODE");
        let cfg = CapeConfig::from_env().unwrap();
        assert!(cfg.carbon_aware);
    }

    #[test]
    fn cape_config_honors_false_case_insensitive() {
        std::env::set_var("CARBON_AWARE_MODE", "FALSE");
        let cfg = CapeConfig::from_env().unwrap();
        assert!(!cfg.carbon_aware);
        std::env::remove_var("CARBON_AWARE_MODE");
    }

    #[test]
    fn cic_config_requires_api_token() {
        std::env::remove_var("ELECTRICITY_MAPS_API_KEY");
        let err = CicConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn zones_split_trims_and_drops_empty() {
        std::env::set_var("ELECTRICITY_MAPS_API_KEY", "test-token");
        std::env::set_var("ZONES", " US-NY-NYIS, FR-FR ,,DE");
        let cfg = CicConfig::from_env().unwrap();
        assert_eq!(cfg.zones, vec!["US-NY-NYIS", "FR-FR", "DE"]);
        std::env::remove_var("ZONES");
        std::env::remove_var("ELECTRICITY_MAPS_API_KEY");
    }
}

//! Emissions-service HTTP client (spec.md §4.1, §6 "Emissions-service call").

use crate::config::defaults::ZONE_REQUEST_TIMEOUT_SECS;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("transport error calling emissions service for zone {zone}: {source}")]
    TransientSource { zone: String, source: reqwest::Error },
    #[error("emissions service returned status {status} for zone {zone}")]
    HttpStatus { zone: String, status: reqwest::StatusCode },
    #[error("malformed payload for zone {zone}: {reason}")]
    SchemaSource { zone: String, reason: String },
    #[error("every zone failed this cycle")]
    AllZonesFailed,
}

/// One zone's reading, as reported by the emissions service (spec.md §6).
/// Field names mirror the wire payload; `extra` passes through anything the
/// service sends beyond `carbonIntensity` so [`crate::snapshot::RawRegion`]
/// can pick it up without this client knowing every possible field.
#[derive(Debug, Deserialize)]
pub struct ZoneReading {
    #[serde(rename = "carbonIntensity")]
    pub carbon_intensity: Option<f64>,
    pub moer: Option<f64>,
    pub datetime: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "emissionFactorType")]
    pub emission_factor_type: Option<String>,
    #[serde(rename = "isEstimated")]
    pub is_estimated: Option<bool>,
    #[serde(rename = "estimationMethod")]
    pub estimation_method: Option<String>,
    pub timestamp: Option<String>,
}

/// HTTP client for the external emissions service (spec.md §4.1
/// "poll-once").
#[derive(Clone)]
pub struct EmissionsClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl EmissionsClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(ZONE_REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to build emissions service HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    /// Fetch the current reading for one zone (spec.md §6: GET
    /// `…/carbon-intensity/latest?zone={TAG}`, header `auth-token`).
    pub async fn latest(&self, zone: &str) -> Result<ZoneReading, PollError> {
        let resp = self
            .http
            .get(format!("{}/carbon-intensity/latest", self.base_url))
            .query(&[("zone", zone)])
            .header("auth-token", &self.api_token)
            .send()
            .await
            .map_err(|source| PollError::TransientSource {
                zone: zone.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(PollError::HttpStatus {
                zone: zone.to_string(),
                status: resp.status(),
            });
        }

        let reading: ZoneReading = resp.json().await.map_err(|e| PollError::SchemaSource {
            zone: zone.to_string(),
            reason: e.to_string(),
        })?;

        if reading.carbon_intensity.unwrap_or(0.0) == 0.0 && reading.moer.unwrap_or(0.0) <= 0.0 {
            return Err(PollError::SchemaSource {
                zone: zone.to_string(),
                reason: "missing carbonIntensity and moer".to_string(),
            });
        }

        Ok(reading)
    }
}

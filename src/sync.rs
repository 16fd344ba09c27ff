//! API Sync Module
//!
//! Handles HTTP communication with the vehicle backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::TrackerError;
use crate::location::ReportedPosition;

/// Identifier of a tracked vehicle. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    /// Parse user input, trimming surrounding whitespace
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::empty_vehicle_id());
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vehicle details as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    #[serde(rename = "type", default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Shown as served; numbers are rendered as text
    #[serde(default, deserialize_with = "display_value")]
    pub year: Option<String>,
    #[serde(rename = "VIN", default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
}

/// Operations against the vehicle backend.
///
/// Every call is a single attempt; callers decide what a failure means.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Fetch a vehicle record by identifier
    async fn fetch_record(&self, id: &VehicleId) -> Result<VehicleRecord, TrackerError>;

    /// Report a position, or the cleared sentinel, for a vehicle
    async fn send_position(
        &self,
        id: &VehicleId,
        position: ReportedPosition,
    ) -> Result<(), TrackerError>;
}

/// API client for the vehicle backend
pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { base_url, client }
    }

    fn vehicle_url(&self, id: &VehicleId, suffix: Option<&str>) -> Result<Url, TrackerError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TrackerError::InvalidInput(format!("unusable API URL: {}", self.base_url)))?;
            segments
                .pop_if_empty()
                .extend(["api", "vehicles", id.as_str()]);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Reporter for ApiClient {
    async fn fetch_record(&self, id: &VehicleId) -> Result<VehicleRecord, TrackerError> {
        let url = self.vehicle_url(id, None)?;

        debug!("Fetching vehicle from: {}", url);

        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::NotFound {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope = response.json::<VehicleEnvelope>().await
            .map_err(|e| TrackerError::Network(format!("invalid vehicle response: {}", e)))?;

        info!("Fetched vehicle {}", id);
        Ok(envelope.data)
    }

    async fn send_position(
        &self,
        id: &VehicleId,
        position: ReportedPosition,
    ) -> Result<(), TrackerError> {
        let url = self.vehicle_url(id, Some("location"))?;

        let response = self.client
            .patch(url)
            .json(&LocationUpdate::from(position))
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Network(format!("Error: {}", status.as_u16())));
        }

        // The response body carries no contract; only log it
        match response.json::<serde_json::Value>().await {
            Ok(body) => debug!("Location updated for {}: {}", id, body),
            Err(_) => debug!("Location updated for {}", id),
        }
        Ok(())
    }
}

// Request/Response types

#[derive(Deserialize)]
struct VehicleEnvelope {
    data: VehicleRecord,
}

/// PATCH body. Both fields null is the cleared sentinel.
#[derive(Debug, PartialEq, Serialize)]
struct LocationUpdate {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<ReportedPosition> for LocationUpdate {
    fn from(position: ReportedPosition) -> Self {
        match position {
            ReportedPosition::At(p) => Self {
                latitude: Some(p.latitude),
                longitude: Some(p.longitude),
            },
            ReportedPosition::Cleared => Self {
                latitude: None,
                longitude: None,
            },
        }
    }
}

fn display_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

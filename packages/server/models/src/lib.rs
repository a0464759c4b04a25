#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the envirolens server.
//!
//! These types are serialized to JSON for the REST API. Field names are
//! camelCase and shared across endpoints, so a reading or alert has the same
//! shape wherever it appears.

use chrono::{DateTime, Utc};
use envirolens_alert_models::Alert;
use envirolens_database_models::{LivabilityScoreRecord, Stored, StoredReadingSet};
use envirolens_reading_models::{
    AirQualityReading, Coordinate, GreenSpaceReading, WaterSecurityReading,
};
use envirolens_scoring_models::LivabilityMetrics;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// Freshly fetched and stored readings for a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvironmentalData {
    /// Requested location.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Stored readings, grouped by category.
    #[serde(flatten)]
    pub readings: StoredReadingSet,
    /// When the fetch ran.
    pub fetched_at: DateTime<Utc>,
}

/// Query parameters accepted by the livability endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivabilityQueryParams {
    /// Free-text location label stored with the score.
    pub location: Option<String>,
}

/// A computed livability score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLivability {
    /// The stored score row.
    #[serde(flatten)]
    pub score: Stored<LivabilityScoreRecord>,
    /// Averaged raw metrics the score was computed from.
    pub metrics: LivabilityMetrics,
    /// Improvement suggestions.
    pub recommendations: Vec<String>,
}

/// Optional body of the alert generation endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAlertsRequest {
    /// Free-text location label stored with each alert.
    pub location: Option<String>,
}

/// Query parameters accepted by the per-category history endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQueryParams {
    /// Half-width of the bounding box in degrees.
    pub radius: Option<f64>,
}

/// Response of the dismiss endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDismissed {
    /// Id of the dismissed alert.
    pub id: i64,
    /// Always `true`.
    pub dismissed: bool,
}

/// Most recent reading of each category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCurrentConditions {
    /// Latest air quality reading.
    pub air_quality: Option<Stored<AirQualityReading>>,
    /// Latest water security reading.
    pub water_security: Option<Stored<WaterSecurityReading>>,
    /// Latest green space reading.
    pub green_space: Option<Stored<GreenSpaceReading>>,
}

impl From<StoredReadingSet> for ApiCurrentConditions {
    fn from(latest: StoredReadingSet) -> Self {
        Self {
            air_quality: latest.air_quality.into_iter().next(),
            water_security: latest.water_security.into_iter().next(),
            green_space: latest.green_space.into_iter().next(),
        }
    }
}

/// Everything the dashboard needs in one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDashboard {
    /// Requested location.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Latest reading per category.
    pub current: ApiCurrentConditions,
    /// Latest livability score near the location.
    pub livability: Option<Stored<LivabilityScoreRecord>>,
    /// Most severe active alerts.
    pub alerts: Vec<Stored<Alert>>,
    /// Recent readings per category, newest first.
    pub history: StoredReadingSet,
}

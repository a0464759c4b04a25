#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Environmental alert types and the static threshold configuration.
//!
//! These types are shared by the alert evaluator, the persistence layer,
//! and the API. The recommendation payload shape differs per category and
//! mirrors the JSON schema requested from the language model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use envirolens_reading_models::{Coordinate, EnvironmentalCategory};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Alert level, in ascending order of urgency.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertType {
    /// Informational only
    Info,
    /// Conditions warrant attention
    Warning,
    /// Conditions are hazardous
    Danger,
}

/// Threshold values the evaluator compares readings against.
///
/// Each field defaults to the standard value so a partial TOML table only
/// needs to name what it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// AQI at or above which a warning fires.
    #[serde(default = "default_air_quality_warning")]
    pub air_quality_warning: f64,
    /// AQI at or above which a danger alert fires.
    #[serde(default = "default_air_quality_danger")]
    pub air_quality_danger: f64,
    /// AQI increase between the two latest readings that counts as rapid
    /// deterioration (strictly greater than).
    #[serde(default = "default_air_quality_rapid_increase")]
    pub air_quality_rapid_increase: f64,
    /// Water stress at or above which a warning fires.
    #[serde(default = "default_water_stress_warning")]
    pub water_stress_warning: f64,
    /// Water stress at or above which a danger alert fires.
    #[serde(default = "default_water_stress_danger")]
    pub water_stress_danger: f64,
    /// Flood risk at or above which a warning fires.
    #[serde(default = "default_flood_risk_warning")]
    pub flood_risk_warning: f64,
    /// Flood risk at or above which a danger alert fires.
    #[serde(default = "default_flood_risk_danger")]
    pub flood_risk_danger: f64,
    /// Green coverage at or below which a warning fires.
    #[serde(default = "default_green_coverage_warning")]
    pub green_coverage_warning: f64,
    /// Green coverage at or below which a danger alert fires.
    #[serde(default = "default_green_coverage_danger")]
    pub green_coverage_danger: f64,
}

const fn default_air_quality_warning() -> f64 {
    100.0
}
const fn default_air_quality_danger() -> f64 {
    150.0
}
const fn default_air_quality_rapid_increase() -> f64 {
    50.0
}
const fn default_water_stress_warning() -> f64 {
    60.0
}
const fn default_water_stress_danger() -> f64 {
    80.0
}
const fn default_flood_risk_warning() -> f64 {
    40.0
}
const fn default_flood_risk_danger() -> f64 {
    70.0
}
const fn default_green_coverage_warning() -> f64 {
    30.0
}
const fn default_green_coverage_danger() -> f64 {
    15.0
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            air_quality_warning: default_air_quality_warning(),
            air_quality_danger: default_air_quality_danger(),
            air_quality_rapid_increase: default_air_quality_rapid_increase(),
            water_stress_warning: default_water_stress_warning(),
            water_stress_danger: default_water_stress_danger(),
            flood_risk_warning: default_flood_risk_warning(),
            flood_risk_danger: default_flood_risk_danger(),
            green_coverage_warning: default_green_coverage_warning(),
            green_coverage_danger: default_green_coverage_danger(),
        }
    }
}

/// Air quality recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityRecommendations {
    /// Actions for the next few hours.
    pub immediate: Vec<String>,
    /// Actions for the coming weeks.
    pub short_term: Vec<String>,
    /// Structural changes.
    pub long_term: Vec<String>,
}

/// Water security recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterSecurityRecommendations {
    /// Household and community conservation measures.
    pub conservation: Vec<String>,
    /// Infrastructure investments.
    pub infrastructure: Vec<String>,
    /// Emergency preparedness.
    pub emergency: Vec<String>,
}

/// Green space recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenSpaceRecommendations {
    /// Urban planning measures.
    pub planning: Vec<String>,
    /// Community-led initiatives.
    pub community: Vec<String>,
    /// Policy changes.
    pub policy: Vec<String>,
}

/// Category-specific recommendation payload attached to an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendationPayload {
    /// For air quality alerts.
    AirQuality(AirQualityRecommendations),
    /// For water security alerts.
    WaterSecurity(WaterSecurityRecommendations),
    /// For green space alerts.
    GreenSpace(GreenSpaceRecommendations),
}

impl RecommendationPayload {
    /// The category this payload was written for.
    #[must_use]
    pub const fn category(&self) -> EnvironmentalCategory {
        match self {
            Self::AirQuality(_) => EnvironmentalCategory::AirQuality,
            Self::WaterSecurity(_) => EnvironmentalCategory::WaterSecurity,
            Self::GreenSpace(_) => EnvironmentalCategory::GreenSpace,
        }
    }
}

/// An environmental alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Urgency level.
    pub alert_type: AlertType,
    /// Category that triggered the alert.
    pub category: EnvironmentalCategory,
    /// Short headline.
    pub title: String,
    /// Longer description including the triggering value.
    pub message: String,
    /// Where the alert applies.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Free-text location label.
    pub location_label: Option<String>,
    /// Severity (0-100).
    pub severity: u8,
    /// Whether the alert is still shown.
    pub is_active: bool,
    /// Whether the alert carries concrete actions.
    pub actionable: bool,
    /// Recommended actions, if any were attached.
    pub recommendations: Option<RecommendationPayload>,
    /// Metric values that triggered the alert.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    /// When the alert was raised.
    pub created_at: DateTime<Utc>,
}

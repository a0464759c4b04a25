#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Environmental reading types shared across the envirolens workspace.
//!
//! Readings come in three categories (air quality, water security, green
//! space). Each carries one primary metric with a documented range, a set
//! of optional secondary metrics, the tag of the source that produced it,
//! and an opaque JSON metadata blob. Readings are immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Upper bound of the Air Quality Index scale.
pub const AQI_MAX: f64 = 500.0;

/// Upper bound of percentage metrics (water stress, flood risk, coverage).
pub const PERCENT_MAX: f64 = 100.0;

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate in floating point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parses a coordinate from two path segments.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either segment is not a finite
    /// number.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, InvalidCoordinateError> {
        let parse_one = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| InvalidCoordinateError {
                    value: raw.to_string(),
                })
        };

        Ok(Self::new(parse_one(latitude)?, parse_one(longitude)?))
    }

    /// Great-circle distance to `other` in kilometers (haversine).
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Error returned when a coordinate segment is not a finite number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCoordinateError {
    /// The raw value that failed to parse.
    pub value: String,
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid coordinate {:?}: expected a finite number", self.value)
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// The three monitored environmental categories.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnvironmentalCategory {
    /// Air Quality Index and pollutant concentrations
    AirQuality,
    /// Water stress, groundwater, and flood risk
    WaterSecurity,
    /// Vegetation index and canopy coverage
    GreenSpace,
}

impl EnvironmentalCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::AirQuality, Self::WaterSecurity, Self::GreenSpace]
    }

    /// Human-readable label used in messages and prompts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AirQuality => "air quality",
            Self::WaterSecurity => "water security",
            Self::GreenSpace => "green space",
        }
    }
}

/// Tag identifying the (simulated) satellite product behind a reading.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceTag {
    /// Hourly, high-resolution air quality. North America only.
    NasaTempo,
    /// Global aerosol optical depth derived air quality.
    NasaModis,
    /// Global groundwater and water storage anomalies.
    NasaGrace,
    /// Global vegetation index and land cover.
    NasaLandsat,
}

impl DataSourceTag {
    /// Returns the category this source reports on.
    #[must_use]
    pub const fn category(self) -> EnvironmentalCategory {
        match self {
            Self::NasaTempo | Self::NasaModis => EnvironmentalCategory::AirQuality,
            Self::NasaGrace => EnvironmentalCategory::WaterSecurity,
            Self::NasaLandsat => EnvironmentalCategory::GreenSpace,
        }
    }
}

/// An air quality reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityReading {
    /// Where the reading applies.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Air Quality Index (0-500).
    pub aqi: f64,
    /// Fine particulate matter (µg/m³).
    pub pm25: Option<f64>,
    /// Coarse particulate matter (µg/m³).
    pub pm10: Option<f64>,
    /// Nitrogen dioxide (ppb).
    pub no2: Option<f64>,
    /// Ozone (ppb).
    pub o3: Option<f64>,
    /// Carbon monoxide (ppm).
    pub co: Option<f64>,
    /// Producing source.
    pub source: DataSourceTag,
    /// When the reading was taken.
    pub recorded_at: DateTime<Utc>,
    /// Source-specific metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A water security reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterSecurityReading {
    /// Where the reading applies.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Water stress level (0-100 %).
    pub water_stress_level: f64,
    /// Groundwater storage anomaly (cm equivalent water height).
    pub groundwater_level: Option<f64>,
    /// Precipitation over the last day (mm).
    pub precipitation: Option<f64>,
    /// Drought severity index (roughly -4..4).
    pub drought_index: Option<f64>,
    /// Flood risk (0-100 %).
    pub flood_risk: Option<f64>,
    /// Producing source.
    pub source: DataSourceTag,
    /// When the reading was taken.
    pub recorded_at: DateTime<Utc>,
    /// Source-specific metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A green space reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenSpaceReading {
    /// Where the reading applies.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Normalized Difference Vegetation Index (-1..1).
    pub ndvi: f64,
    /// Vegetation coverage (0-100 %).
    pub vegetation_coverage: Option<f64>,
    /// Tree canopy coverage (0-100 %).
    pub tree_canopy: Option<f64>,
    /// Urban heat island intensity (°C above rural baseline).
    pub urban_heat_island: Option<f64>,
    /// Producing source.
    pub source: DataSourceTag,
    /// When the reading was taken.
    pub recorded_at: DateTime<Utc>,
    /// Source-specific metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl GreenSpaceReading {
    /// Green coverage percentage: `vegetation_coverage` when reported,
    /// otherwise NDVI scaled to a percentage.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        self.vegetation_coverage.unwrap_or(self.ndvi * 100.0)
    }
}

/// Readings grouped by category, each list ordered most-recent-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSet {
    /// Air quality readings.
    pub air_quality: Vec<AirQualityReading>,
    /// Water security readings.
    pub water_security: Vec<WaterSecurityReading>,
    /// Green space readings.
    pub green_space: Vec<GreenSpaceReading>,
}

impl ReadingSet {
    /// Returns `true` if any category has no readings.
    #[must_use]
    pub fn has_empty_category(&self) -> bool {
        self.air_quality.is_empty() || self.water_security.is_empty() || self.green_space.is_empty()
    }

    /// Total number of readings across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.air_quality.len() + self.water_security.len() + self.green_space.len()
    }

    /// Returns `true` if there are no readings at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clamps `value` into `min..=max`, mapping non-finite values to `fallback`.
#[must_use]
pub fn clamp_metric(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_finite_coordinates() {
        let coord = Coordinate::parse("40.7128", " -74.0060").unwrap();
        assert!((coord.latitude - 40.7128).abs() < f64::EPSILON);
        assert!((coord.longitude + 74.006).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_numeric_coordinates() {
        let err = Coordinate::parse("abc", "10").unwrap_err();
        assert_eq!(err.value, "abc");
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        assert!(Coordinate::parse("NaN", "10").is_err());
        assert!(Coordinate::parse("10", "inf").is_err());
    }

    #[test]
    fn distance_between_new_york_and_los_angeles() {
        let nyc = Coordinate::new(40.7128, -74.0060);
        let la = Coordinate::new(34.0522, -118.2437);
        let d = nyc.distance_km(&la);
        assert!((3900.0..4000.0).contains(&d), "got {d}");
    }

    #[test]
    fn coverage_prefers_reported_value() {
        let mut reading = GreenSpaceReading {
            location: Coordinate::new(0.0, 0.0),
            ndvi: 0.1,
            vegetation_coverage: Some(42.0),
            tree_canopy: None,
            urban_heat_island: None,
            source: DataSourceTag::NasaLandsat,
            recorded_at: Utc::now(),
            metadata: serde_json::Value::Null,
        };
        assert!((reading.coverage() - 42.0).abs() < f64::EPSILON);

        reading.vegetation_coverage = None;
        assert!((reading.coverage() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn category_round_trips_through_strum() {
        for category in EnvironmentalCategory::all() {
            let parsed: EnvironmentalCategory = category.as_ref().parse().unwrap();
            assert_eq!(parsed, *category);
        }
        assert_eq!(EnvironmentalCategory::WaterSecurity.to_string(), "water_security");
    }

    #[test]
    fn source_tags_map_to_categories() {
        assert_eq!(
            DataSourceTag::NasaTempo.category(),
            EnvironmentalCategory::AirQuality
        );
        assert_eq!(DataSourceTag::NasaGrace.to_string(), "NASA_GRACE");
    }

    #[test]
    fn clamp_metric_handles_non_finite() {
        assert!((clamp_metric(f64::NAN, 0.0, 500.0, 500.0) - 500.0).abs() < f64::EPSILON);
        assert!((clamp_metric(-3.0, 0.0, 500.0, 500.0)).abs() < f64::EPSILON);
        assert!((clamp_metric(900.0, 0.0, 500.0, 500.0) - 500.0).abs() < f64::EPSILON);
    }
}

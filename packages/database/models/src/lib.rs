#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stored row types and spatial query parameters.
//!
//! Everything read back from the database is wrapped in [`Stored`], which
//! pairs the domain value with its row id. Location lookups are plain
//! latitude/longitude range checks on a [`BoundingBox`], not geodesic
//! distance queries.

use chrono::{DateTime, Utc};
use envirolens_reading_models::{
    AirQualityReading, Coordinate, GreenSpaceReading, WaterSecurityReading,
};
use envirolens_scoring_models::{LivabilityAssessment, LivabilityCategory};
use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The square of half-width `radius` degrees centered on `center`.
    #[must_use]
    pub fn around(center: Coordinate, radius: f64) -> Self {
        let radius = radius.abs();
        Self::new(
            center.longitude - radius,
            center.latitude - radius,
            center.longitude + radius,
            center.latitude + radius,
        )
    }
}

/// A value read back from the database together with its row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    /// Auto-generated row id.
    pub id: i64,
    /// The stored value.
    #[serde(flatten)]
    pub record: T,
}

impl<T> Stored<T> {
    /// Wraps `record` with its row id.
    pub const fn new(id: i64, record: T) -> Self {
        Self { id, record }
    }
}

/// Readings as stored, grouped by category, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReadingSet {
    /// Air quality rows.
    pub air_quality: Vec<Stored<AirQualityReading>>,
    /// Water security rows.
    pub water_security: Vec<Stored<WaterSecurityReading>>,
    /// Green space rows.
    pub green_space: Vec<Stored<GreenSpaceReading>>,
}

/// A persisted livability score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivabilityScoreRecord {
    /// Scored location.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Free-text location label.
    pub location_label: Option<String>,
    /// Air quality sub-score.
    pub air_quality_score: u8,
    /// Water security sub-score.
    pub water_security_score: u8,
    /// Green space sub-score.
    pub green_space_score: u8,
    /// Weighted overall score.
    pub overall_score: u8,
    /// Band of the overall score.
    pub category: LivabilityCategory,
    /// When the score was computed.
    pub created_at: DateTime<Utc>,
}

impl LivabilityScoreRecord {
    /// Builds the row for `assessment` at `location`.
    #[must_use]
    pub fn from_assessment(
        location: Coordinate,
        location_label: Option<String>,
        assessment: &LivabilityAssessment,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            location,
            location_label,
            air_quality_score: assessment.air_score,
            water_security_score: assessment.water_score,
            green_space_score: assessment.green_score,
            overall_score: assessment.overall_score,
            category: assessment.category,
            created_at,
        }
    }
}

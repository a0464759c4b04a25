#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Livability score types and the scoring weight configuration.
//!
//! The weights are part of an immutable configuration object handed to the
//! scorer at construction time. They must sum to 1.0 so that overall scores
//! stay comparable across locations and deployments.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Errors produced when validating scoring configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringConfigError {
    /// A single weight is outside `0.0..=1.0`.
    #[error("{name} weight must be between 0.0 and 1.0, got {value}")]
    WeightOutOfRange {
        /// Which weight.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The weights do not add up to 1.0.
    #[error("scoring weights must sum to 1.0, but sum to {sum:.3}")]
    WeightSum {
        /// The actual sum.
        sum: f64,
    },
}

/// Relative weight of each sub-score in the overall livability score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the air quality sub-score.
    #[serde(default = "default_air_quality_weight")]
    pub air_quality: f64,
    /// Weight of the water security sub-score.
    #[serde(default = "default_water_security_weight")]
    pub water_security: f64,
    /// Weight of the green space sub-score.
    #[serde(default = "default_green_space_weight")]
    pub green_space: f64,
}

const fn default_air_quality_weight() -> f64 {
    0.40
}

const fn default_water_security_weight() -> f64 {
    0.35
}

const fn default_green_space_weight() -> f64 {
    0.25
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            air_quality: default_air_quality_weight(),
            water_security: default_water_security_weight(),
            green_space: default_green_space_weight(),
        }
    }
}

impl ScoringWeights {
    /// Sum of all three weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.air_quality + self.water_security + self.green_space
    }

    /// Checks that each weight is in range and that they sum to 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringConfigError`] describing the first violation.
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        for (name, value) in [
            ("air_quality", self.air_quality),
            ("water_security", self.water_security),
            ("green_space", self.green_space),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScoringConfigError::WeightOutOfRange { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringConfigError::WeightSum { sum });
        }

        Ok(())
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Sub-score weights.
    #[serde(default)]
    pub weights: ScoringWeights,
}

/// Livability band derived from the overall score.
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
pub enum LivabilityCategory {
    /// 85 and above
    Excellent,
    /// 70-84
    Good,
    /// 55-69
    Moderate,
    /// 40-54
    Poor,
    /// Below 40
    #[serde(rename = "Very Poor")]
    #[strum(serialize = "Very Poor")]
    VeryPoor,
}

impl LivabilityCategory {
    /// Classifies an overall score into its band.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            85.. => Self::Excellent,
            70..=84 => Self::Good,
            55..=69 => Self::Moderate,
            40..=54 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }
}

/// Raw metric averages fed to the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivabilityMetrics {
    /// Average AQI (0-500, lower is better).
    pub air_quality: f64,
    /// Average water stress percentage (0-100, lower is better).
    pub water_security: f64,
    /// Average green coverage percentage (0-100, higher is better).
    pub green_space: f64,
}

/// Output of the livability scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivabilityAssessment {
    /// Normalized air quality sub-score.
    pub air_score: u8,
    /// Normalized water security sub-score.
    pub water_score: u8,
    /// Normalized green space sub-score.
    pub green_score: u8,
    /// Weighted overall score.
    pub overall_score: u8,
    /// Band of the overall score.
    pub category: LivabilityCategory,
    /// Human-readable improvement suggestions.
    pub recommendations: Vec<String>,
}

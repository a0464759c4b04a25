#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Weighted livability scoring.
//!
//! Each raw metric is mapped onto a fixed five-step bucket scale (not a
//! continuous interpolation), the three sub-scores are combined with the
//! configured weights, and the rounded result is classified into a
//! [`LivabilityCategory`] band. Scoring is pure: no I/O, no failure modes.
//! Non-finite inputs score as the worst bucket.

use envirolens_reading_models::{AQI_MAX, PERCENT_MAX, ReadingSet, clamp_metric};
use envirolens_scoring_models::{
    LivabilityAssessment, LivabilityCategory, LivabilityMetrics, ScoringConfig,
    ScoringConfigError,
};

/// Sub-scores below this value trigger factor-specific advice.
const RECOMMENDATION_THRESHOLD: u8 = 60;

/// Maps an AQI value onto the air quality bucket scale.
///
/// Always returns one of `{100, 85, 60, 35, 15, 5}` and never increases as
/// AQI increases.
#[must_use]
pub fn normalize_air_quality(aqi: f64) -> u8 {
    let aqi = clamp_metric(aqi, 0.0, AQI_MAX, AQI_MAX);
    if aqi <= 0.0 {
        100
    } else if aqi <= 50.0 {
        85
    } else if aqi <= 100.0 {
        60
    } else if aqi <= 200.0 {
        35
    } else if aqi <= 300.0 {
        15
    } else {
        5
    }
}

/// Maps a water stress percentage onto the water security bucket scale.
#[must_use]
pub fn normalize_water_security(stress: f64) -> u8 {
    let stress = clamp_metric(stress, 0.0, PERCENT_MAX, PERCENT_MAX);
    if stress <= 0.0 {
        100
    } else if stress <= 20.0 {
        80
    } else if stress <= 40.0 {
        60
    } else if stress <= 60.0 {
        40
    } else if stress <= 80.0 {
        20
    } else {
        10
    }
}

/// Maps a green coverage percentage onto the green space bucket scale.
#[must_use]
pub fn normalize_green_space(coverage: f64) -> u8 {
    let coverage = clamp_metric(coverage, 0.0, PERCENT_MAX, 0.0);
    if coverage >= 80.0 {
        100
    } else if coverage >= 60.0 {
        80
    } else if coverage >= 40.0 {
        60
    } else if coverage >= 20.0 {
        40
    } else if coverage >= 10.0 {
        20
    } else {
        10
    }
}

/// Averages the primary metric of each category.
///
/// Returns `None` if any category has no readings.
#[must_use]
pub fn metrics_from_readings(readings: &ReadingSet) -> Option<LivabilityMetrics> {
    Some(LivabilityMetrics {
        air_quality: mean(readings.air_quality.iter().map(|r| r.aqi))?,
        water_security: mean(readings.water_security.iter().map(|r| r.water_stress_level))?,
        green_space: mean(readings.green_space.iter().map(|r| r.coverage()))?,
    })
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Computes livability scores with a fixed, validated weight set.
#[derive(Debug, Clone, Default)]
pub struct LivabilityScorer {
    config: ScoringConfig,
}

impl LivabilityScorer {
    /// Creates a scorer from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringConfigError`] if the weights are invalid.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringConfigError> {
        config.weights.validate()?;
        Ok(Self { config })
    }

    /// Scores a set of raw metric averages.
    #[must_use]
    pub fn score(&self, metrics: &LivabilityMetrics) -> LivabilityAssessment {
        let air_score = normalize_air_quality(metrics.air_quality);
        let water_score = normalize_water_security(metrics.water_security);
        let green_score = normalize_green_space(metrics.green_space);

        let overall_score = self.overall(air_score, water_score, green_score);

        log::debug!(
            "Scored air={air_score} water={water_score} green={green_score} -> {overall_score}"
        );

        LivabilityAssessment {
            air_score,
            water_score,
            green_score,
            overall_score,
            category: LivabilityCategory::from_score(overall_score),
            recommendations: recommendations(air_score, water_score, green_score),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn overall(&self, air: u8, water: u8, green: u8) -> u8 {
        let weights = &self.config.weights;
        let weighted = weights.air_quality * f64::from(air)
            + weights.water_security * f64::from(water)
            + weights.green_space * f64::from(green);
        weighted.round().clamp(0.0, 100.0) as u8
    }
}

/// Builds the recommendation list for a set of sub-scores.
///
/// Factor advice is added for each sub-score below 60, followed by a
/// priority line naming the weakest factor (air, water, green order on
/// ties).
#[must_use]
pub fn recommendations(air: u8, water: u8, green: u8) -> Vec<String> {
    let mut out = Vec::new();

    if air < RECOMMENDATION_THRESHOLD {
        out.push("Use air purifiers indoors and limit outdoor exercise on high-AQI days".to_string());
        out.push("Check daily air quality forecasts before planning outdoor activities".to_string());
    }
    if water < RECOMMENDATION_THRESHOLD {
        out.push("Install water-efficient fixtures and fix household leaks".to_string());
        out.push("Support local water conservation and rainwater harvesting initiatives".to_string());
    }
    if green < RECOMMENDATION_THRESHOLD {
        out.push("Advocate for new parks and green corridors in your neighborhood".to_string());
        out.push("Join community tree planting and urban gardening programs".to_string());
    }
    if out.is_empty() {
        out.push("Environmental conditions are favorable; keep supporting local sustainability efforts".to_string());
    }

    let weakest = [("air quality", air), ("water security", water), ("green space", green)]
        .into_iter()
        .fold(None::<(&str, u8)>, |best, candidate| match best {
            Some(b) if b.1 <= candidate.1 => Some(b),
            _ => Some(candidate),
        });
    if let Some((name, _)) = weakest {
        out.push(format!("Priority focus: improve {name}"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use envirolens_reading_models::{
        AirQualityReading, Coordinate, DataSourceTag, GreenSpaceReading, WaterSecurityReading,
    };
    use envirolens_scoring_models::ScoringWeights;

    fn metrics(air_quality: f64, water_security: f64, green_space: f64) -> LivabilityMetrics {
        LivabilityMetrics {
            air_quality,
            water_security,
            green_space,
        }
    }

    #[test]
    fn air_quality_normalization_is_monotonic() {
        let allowed = [100, 85, 60, 35, 15, 5];
        let mut previous = u8::MAX;
        for step in 0..=6000 {
            let aqi = f64::from(step) / 10.0 - 50.0;
            let score = normalize_air_quality(aqi);
            assert!(allowed.contains(&score), "unexpected score {score} for {aqi}");
            assert!(score <= previous, "score increased at aqi {aqi}");
            previous = score;
        }
    }

    #[test]
    fn air_quality_bucket_edges() {
        assert_eq!(normalize_air_quality(0.0), 100);
        assert_eq!(normalize_air_quality(50.0), 85);
        assert_eq!(normalize_air_quality(50.5), 60);
        assert_eq!(normalize_air_quality(100.0), 60);
        assert_eq!(normalize_air_quality(200.0), 35);
        assert_eq!(normalize_air_quality(300.0), 15);
        assert_eq!(normalize_air_quality(301.0), 5);
    }

    #[test]
    fn water_and_green_bucket_edges() {
        assert_eq!(normalize_water_security(0.0), 100);
        assert_eq!(normalize_water_security(20.0), 80);
        assert_eq!(normalize_water_security(40.0), 60);
        assert_eq!(normalize_water_security(60.0), 40);
        assert_eq!(normalize_water_security(80.0), 20);
        assert_eq!(normalize_water_security(95.0), 10);

        assert_eq!(normalize_green_space(80.0), 100);
        assert_eq!(normalize_green_space(60.0), 80);
        assert_eq!(normalize_green_space(40.0), 60);
        assert_eq!(normalize_green_space(20.0), 40);
        assert_eq!(normalize_green_space(10.0), 20);
        assert_eq!(normalize_green_space(9.9), 10);
    }

    #[test]
    fn non_finite_inputs_score_worst() {
        assert_eq!(normalize_air_quality(f64::NAN), 5);
        assert_eq!(normalize_water_security(f64::INFINITY), 10);
        assert_eq!(normalize_green_space(f64::NAN), 10);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_eq!(normalize_air_quality(-20.0), 100);
        assert_eq!(normalize_air_quality(9000.0), 5);
        assert_eq!(normalize_green_space(150.0), 100);
        assert_eq!(normalize_water_security(-5.0), 100);
    }

    #[test]
    fn perfect_conditions_score_one_hundred() {
        let scorer = LivabilityScorer::default();
        let result = scorer.score(&metrics(0.0, 0.0, 100.0));
        assert_eq!(result.overall_score, 100);
        assert_eq!(result.category, LivabilityCategory::Excellent);
    }

    #[test]
    fn moderate_reference_case() {
        let scorer = LivabilityScorer::default();
        let result = scorer.score(&metrics(100.0, 40.0, 50.0));
        assert_eq!(result.air_score, 60);
        assert_eq!(result.water_score, 60);
        assert_eq!(result.green_score, 60);
        assert_eq!(result.overall_score, 60);
        assert_eq!(result.category, LivabilityCategory::Moderate);
    }

    #[test]
    fn overall_uses_configured_weights() {
        let scorer = LivabilityScorer::new(ScoringConfig {
            weights: ScoringWeights {
                air_quality: 1.0,
                water_security: 0.0,
                green_space: 0.0,
            },
        })
        .unwrap();
        let result = scorer.score(&metrics(250.0, 0.0, 100.0));
        assert_eq!(result.overall_score, 15);
        assert_eq!(result.category, LivabilityCategory::VeryPoor);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let config = ScoringConfig {
            weights: ScoringWeights {
                air_quality: 0.6,
                water_security: 0.6,
                green_space: 0.25,
            },
        };
        assert!(LivabilityScorer::new(config).is_err());
    }

    #[test]
    fn recommendations_cover_weak_factors() {
        let recs = recommendations(35, 80, 40);
        assert_eq!(recs.len(), 5);
        assert!(recs[0].contains("air purifiers"));
        assert!(recs[2].contains("parks"));
        assert_eq!(recs[4], "Priority focus: improve air quality");
    }

    #[test]
    fn weakest_factor_tie_goes_to_first() {
        let recs = recommendations(60, 60, 60);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1], "Priority focus: improve air quality");

        let recs = recommendations(85, 40, 40);
        assert_eq!(recs.last().unwrap(), "Priority focus: improve water security");
    }

    #[test]
    fn metrics_average_each_category() {
        let at = Utc::now();
        let location = Coordinate::new(10.0, 10.0);
        let air = |aqi| AirQualityReading {
            location,
            aqi,
            pm25: None,
            pm10: None,
            no2: None,
            o3: None,
            co: None,
            source: DataSourceTag::NasaModis,
            recorded_at: at,
            metadata: serde_json::Value::Null,
        };
        let set = ReadingSet {
            air_quality: vec![air(40.0), air(60.0)],
            water_security: vec![WaterSecurityReading {
                location,
                water_stress_level: 30.0,
                groundwater_level: None,
                precipitation: None,
                drought_index: None,
                flood_risk: None,
                source: DataSourceTag::NasaGrace,
                recorded_at: at,
                metadata: serde_json::Value::Null,
            }],
            green_space: vec![GreenSpaceReading {
                location,
                ndvi: 0.45,
                vegetation_coverage: None,
                tree_canopy: None,
                urban_heat_island: None,
                source: DataSourceTag::NasaLandsat,
                recorded_at: at,
                metadata: serde_json::Value::Null,
            }],
        };

        let m = metrics_from_readings(&set).unwrap();
        assert!((m.air_quality - 50.0).abs() < 1e-9);
        assert!((m.water_security - 30.0).abs() < 1e-9);
        assert!((m.green_space - 45.0).abs() < 1e-9);
    }

    #[test]
    fn metrics_require_every_category() {
        assert!(metrics_from_readings(&ReadingSet::default()).is_none());
    }
}

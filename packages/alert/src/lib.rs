#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Threshold-based environmental alert evaluation.
//!
//! The [`AlertEvaluator`] compares the most recent readings of each category
//! against a fixed [`AlertThresholds`] table and produces [`Alert`]s with a
//! severity derived from how far past the threshold the value sits.
//! Recommendations are attached afterwards by a [`RecommendationProvider`].

pub mod recommendations;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use envirolens_alert_models::{Alert, AlertThresholds, AlertType};
use envirolens_reading_models::{
    AirQualityReading, Coordinate, EnvironmentalCategory, GreenSpaceReading, ReadingSet,
    WaterSecurityReading,
};

pub use recommendations::{
    AiRecommendations, RecommendationProvider, StaticRecommendations, attach_recommendations,
};

/// Linear severity ramp starting at `base` when a value just crosses its
/// threshold.
#[derive(Debug, Clone, Copy)]
struct SeverityCurve {
    base: f64,
    slope: f64,
}

impl SeverityCurve {
    const fn new(base: f64, slope: f64) -> Self {
        Self { base, slope }
    }

    /// `distance` is how far past the threshold the value is, in the
    /// metric's own units.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn severity(self, distance: f64) -> u8 {
        let raw = self.slope.mul_add(distance, self.base);
        if raw.is_finite() {
            raw.clamp(0.0, 100.0).round() as u8
        } else {
            100
        }
    }
}

const AIR_DANGER: SeverityCurve = SeverityCurve::new(70.0, 0.2);
const AIR_WARNING: SeverityCurve = SeverityCurve::new(40.0, 0.6);
const AIR_RAPID_INCREASE: SeverityCurve = SeverityCurve::new(50.0, 0.5);
const WATER_STRESS_DANGER: SeverityCurve = SeverityCurve::new(75.0, 1.25);
const WATER_STRESS_WARNING: SeverityCurve = SeverityCurve::new(45.0, 1.5);
const FLOOD_DANGER: SeverityCurve = SeverityCurve::new(75.0, 0.85);
const FLOOD_WARNING: SeverityCurve = SeverityCurve::new(40.0, 1.0);
const GREEN_DANGER: SeverityCurve = SeverityCurve::new(70.0, 2.0);
const GREEN_WARNING: SeverityCurve = SeverityCurve::new(35.0, 2.0);

/// Where and when alerts are being raised.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertContext {
    /// Location the alerts apply to.
    pub location: Coordinate,
    /// Optional free-text label for the location.
    pub location_label: Option<String>,
    /// Creation timestamp stamped on every alert.
    pub now: DateTime<Utc>,
}

impl AlertContext {
    /// Creates a context without a location label.
    #[must_use]
    pub const fn new(location: Coordinate, now: DateTime<Utc>) -> Self {
        Self {
            location,
            location_label: None,
            now,
        }
    }

    /// Sets the location label.
    #[must_use]
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.location_label = label;
        self
    }

    fn alert(
        &self,
        alert_type: AlertType,
        category: EnvironmentalCategory,
        title: &str,
        message: String,
        severity: u8,
        metrics: BTreeMap<String, f64>,
    ) -> Alert {
        Alert {
            alert_type,
            category,
            title: title.to_string(),
            message,
            location: self.location,
            location_label: self.location_label.clone(),
            severity,
            is_active: true,
            actionable: true,
            recommendations: None,
            metrics,
            created_at: self.now,
        }
    }
}

fn metrics<const N: usize>(entries: [(&str, f64); N]) -> BTreeMap<String, f64> {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Evaluates readings against a fixed threshold table.
#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
}

impl AlertEvaluator {
    /// Creates an evaluator using `thresholds`.
    #[must_use]
    pub const fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluates air quality readings (most recent first).
    ///
    /// The latest AQI raises at most one level alert (danger or warning).
    /// Independently, the latest AQI is compared with the previous reading
    /// of the same source taken strictly earlier; a rise of more than the
    /// rapid-increase threshold raises a deterioration warning. Readings of
    /// other instruments at the same instant are not a previous reading.
    #[must_use]
    pub fn analyze_air_quality(
        &self,
        readings: &[AirQualityReading],
        ctx: &AlertContext,
    ) -> Vec<Alert> {
        let Some(latest) = readings.first() else {
            return vec![];
        };
        let t = &self.thresholds;
        let aqi = latest.aqi;
        let mut alerts = Vec::new();

        if aqi >= t.air_quality_danger {
            alerts.push(ctx.alert(
                AlertType::Danger,
                EnvironmentalCategory::AirQuality,
                "Unhealthy Air Quality",
                format!(
                    "Air Quality Index has reached {aqi:.0}, which is unhealthy for everyone. \
                     Limit time outdoors."
                ),
                AIR_DANGER.severity(aqi - t.air_quality_danger),
                metrics([("aqi", aqi)]),
            ));
        } else if aqi >= t.air_quality_warning {
            alerts.push(ctx.alert(
                AlertType::Warning,
                EnvironmentalCategory::AirQuality,
                "Elevated Air Quality Index",
                format!(
                    "Air Quality Index is {aqi:.0}. Sensitive groups should reduce prolonged \
                     outdoor exertion."
                ),
                AIR_WARNING.severity(aqi - t.air_quality_warning),
                metrics([("aqi", aqi)]),
            ));
        }

        let previous = readings
            .iter()
            .skip(1)
            .find(|r| r.source == latest.source && r.recorded_at < latest.recorded_at);

        if let Some(previous) = previous {
            let delta = aqi - previous.aqi;
            if delta > t.air_quality_rapid_increase {
                alerts.push(ctx.alert(
                    AlertType::Warning,
                    EnvironmentalCategory::AirQuality,
                    "Rapid Air Quality Deterioration",
                    format!(
                        "Air Quality Index rose by {delta:.0} points since the previous reading \
                         ({:.0} to {aqi:.0}).",
                        previous.aqi
                    ),
                    AIR_RAPID_INCREASE.severity(delta - t.air_quality_rapid_increase),
                    metrics([("aqi", aqi), ("previousAqi", previous.aqi), ("delta", delta)]),
                ));
            }
        }

        alerts
    }

    /// Evaluates the latest water security reading.
    ///
    /// Water stress and flood risk are checked independently, so a single
    /// reading can raise up to two alerts.
    #[must_use]
    pub fn analyze_water_security(
        &self,
        readings: &[WaterSecurityReading],
        ctx: &AlertContext,
    ) -> Vec<Alert> {
        let Some(latest) = readings.first() else {
            return vec![];
        };
        let t = &self.thresholds;
        let stress = latest.water_stress_level;
        let mut alerts = Vec::new();

        if stress >= t.water_stress_danger {
            alerts.push(ctx.alert(
                AlertType::Danger,
                EnvironmentalCategory::WaterSecurity,
                "Critical Water Stress",
                format!(
                    "Water stress is at {stress:.0}%. Supplies are critically strained; \
                     restrict non-essential use."
                ),
                WATER_STRESS_DANGER.severity(stress - t.water_stress_danger),
                metrics([("waterStressLevel", stress)]),
            ));
        } else if stress >= t.water_stress_warning {
            alerts.push(ctx.alert(
                AlertType::Warning,
                EnvironmentalCategory::WaterSecurity,
                "High Water Stress",
                format!("Water stress is at {stress:.0}%. Conserve water where possible."),
                WATER_STRESS_WARNING.severity(stress - t.water_stress_warning),
                metrics([("waterStressLevel", stress)]),
            ));
        }

        if let Some(flood) = latest.flood_risk {
            if flood >= t.flood_risk_danger {
                alerts.push(ctx.alert(
                    AlertType::Danger,
                    EnvironmentalCategory::WaterSecurity,
                    "High Flood Risk",
                    format!(
                        "Flood risk is at {flood:.0}%. Prepare for possible flooding and follow \
                         local emergency guidance."
                    ),
                    FLOOD_DANGER.severity(flood - t.flood_risk_danger),
                    metrics([("floodRisk", flood)]),
                ));
            } else if flood >= t.flood_risk_warning {
                alerts.push(ctx.alert(
                    AlertType::Warning,
                    EnvironmentalCategory::WaterSecurity,
                    "Elevated Flood Risk",
                    format!("Flood risk is at {flood:.0}%. Monitor weather updates."),
                    FLOOD_WARNING.severity(flood - t.flood_risk_warning),
                    metrics([("floodRisk", flood)]),
                ));
            }
        }

        alerts
    }

    /// Evaluates the latest green space reading by its coverage
    /// percentage.
    #[must_use]
    pub fn analyze_green_space(
        &self,
        readings: &[GreenSpaceReading],
        ctx: &AlertContext,
    ) -> Vec<Alert> {
        let Some(latest) = readings.first() else {
            return vec![];
        };
        let t = &self.thresholds;
        let coverage = latest.coverage();

        if coverage <= t.green_coverage_danger {
            vec![ctx.alert(
                AlertType::Danger,
                EnvironmentalCategory::GreenSpace,
                "Critically Low Green Coverage",
                format!(
                    "Green coverage is only {coverage:.0}%. Expect stronger heat island effects \
                     and poorer air filtration."
                ),
                GREEN_DANGER.severity(t.green_coverage_danger - coverage),
                metrics([("coverage", coverage), ("ndvi", latest.ndvi)]),
            )]
        } else if coverage <= t.green_coverage_warning {
            vec![ctx.alert(
                AlertType::Warning,
                EnvironmentalCategory::GreenSpace,
                "Low Green Coverage",
                format!("Green coverage is {coverage:.0}%, below the recommended level."),
                GREEN_WARNING.severity(t.green_coverage_warning - coverage),
                metrics([("coverage", coverage), ("ndvi", latest.ndvi)]),
            )]
        } else {
            vec![]
        }
    }

    /// Evaluates every category of `readings`, in air, water, green order.
    #[must_use]
    pub fn evaluate(&self, readings: &ReadingSet, ctx: &AlertContext) -> Vec<Alert> {
        let mut alerts = self.analyze_air_quality(&readings.air_quality, ctx);
        alerts.extend(self.analyze_water_security(&readings.water_security, ctx));
        alerts.extend(self.analyze_green_space(&readings.green_space, ctx));

        log::debug!(
            "evaluate: {} readings at ({}, {}) raised {} alerts",
            readings.len(),
            ctx.location.latitude,
            ctx.location.longitude,
            alerts.len()
        );

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envirolens_reading_models::DataSourceTag;

    fn ctx() -> AlertContext {
        AlertContext::new(Coordinate::new(40.0, -74.0), Utc::now())
    }

    fn air(aqi: f64) -> AirQualityReading {
        air_from(DataSourceTag::NasaModis, aqi, 0)
    }

    /// Most-recent-first series from one source, one hour apart.
    fn air_series(aqis: &[f64]) -> Vec<AirQualityReading> {
        aqis.iter()
            .zip(0_i64..)
            .map(|(&aqi, hours_ago)| air_from(DataSourceTag::NasaModis, aqi, hours_ago))
            .collect()
    }

    fn air_from(source: DataSourceTag, aqi: f64, hours_ago: i64) -> AirQualityReading {
        let fetched_at = "2024-06-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        AirQualityReading {
            location: Coordinate::new(40.0, -74.0),
            aqi,
            pm25: None,
            pm10: None,
            no2: None,
            o3: None,
            co: None,
            source,
            recorded_at: fetched_at - chrono::Duration::hours(hours_ago),
            metadata: serde_json::Value::Null,
        }
    }

    fn water(stress: f64, flood_risk: Option<f64>) -> WaterSecurityReading {
        WaterSecurityReading {
            location: Coordinate::new(40.0, -74.0),
            water_stress_level: stress,
            groundwater_level: None,
            precipitation: None,
            drought_index: None,
            flood_risk,
            source: DataSourceTag::NasaGrace,
            recorded_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    fn green(ndvi: f64, vegetation_coverage: Option<f64>) -> GreenSpaceReading {
        GreenSpaceReading {
            location: Coordinate::new(40.0, -74.0),
            ndvi,
            vegetation_coverage,
            tree_canopy: None,
            urban_heat_island: None,
            source: DataSourceTag::NasaLandsat,
            recorded_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn severity_is_clamped_and_rounded() {
        assert_eq!(AIR_DANGER.severity(0.0), 70);
        assert_eq!(AIR_DANGER.severity(350.0), 100);
        assert_eq!(AIR_WARNING.severity(10.0), 46);
        assert_eq!(GREEN_WARNING.severity(-100.0), 0);
        assert_eq!(WATER_STRESS_DANGER.severity(f64::NAN), 100);
    }

    #[test]
    fn air_spike_raises_danger_and_rapid_deterioration() {
        let evaluator = AlertEvaluator::default();
        let alerts = evaluator.analyze_air_quality(&air_series(&[160.0, 90.0]), &ctx());

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].alert_type, AlertType::Danger);
        assert_eq!(alerts[0].severity, 72);
        assert_eq!(alerts[1].alert_type, AlertType::Warning);
        assert_eq!(alerts[1].title, "Rapid Air Quality Deterioration");
        assert_eq!(alerts[1].severity, 60);
        assert!((alerts[1].metrics["delta"] - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn air_warning_band_raises_single_warning() {
        let evaluator = AlertEvaluator::default();
        let alerts = evaluator.analyze_air_quality(&air_series(&[120.0, 100.0]), &ctx());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Warning);
        assert_eq!(alerts[0].severity, 52);
    }

    #[test]
    fn rapid_increase_requires_strictly_greater_delta() {
        let evaluator = AlertEvaluator::default();
        assert!(
            evaluator
                .analyze_air_quality(&air_series(&[90.0, 40.0]), &ctx())
                .is_empty()
        );
        assert!(evaluator.analyze_air_quality(&[], &ctx()).is_empty());
    }

    #[test]
    fn rapid_increase_compares_same_source_over_time() {
        use DataSourceTag::{NasaModis, NasaTempo};

        let evaluator = AlertEvaluator::default();
        let readings = [
            air_from(NasaModis, 220.0, 0),
            air_from(NasaTempo, 220.0, 0),
            air_from(NasaModis, 20.0, 1),
            air_from(NasaTempo, 20.0, 1),
        ];
        let alerts = evaluator.analyze_air_quality(&readings, &ctx());

        let titles: Vec<&str> = alerts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Unhealthy Air Quality", "Rapid Air Quality Deterioration"]
        );
        assert!((alerts[1].metrics["previousAqi"] - 20.0).abs() < f64::EPSILON);
        assert!((alerts[1].metrics["delta"] - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn instruments_at_the_same_instant_are_not_a_trend() {
        use DataSourceTag::{NasaModis, NasaTempo};

        let evaluator = AlertEvaluator::default();
        let readings = [air_from(NasaModis, 95.0, 0), air_from(NasaTempo, 30.0, 0)];
        assert!(evaluator.analyze_air_quality(&readings, &ctx()).is_empty());

        let same_source_same_instant = [air_from(NasaModis, 95.0, 0), air_from(NasaModis, 30.0, 0)];
        assert!(
            evaluator
                .analyze_air_quality(&same_source_same_instant, &ctx())
                .is_empty()
        );
    }

    #[test]
    fn water_stress_and_flood_are_independent() {
        let evaluator = AlertEvaluator::default();
        let alerts = evaluator.analyze_water_security(&[water(85.0, Some(75.0))], &ctx());

        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.alert_type == AlertType::Danger));
        assert_eq!(alerts[0].title, "Critical Water Stress");
        assert_eq!(alerts[1].title, "High Flood Risk");
    }

    #[test]
    fn only_latest_water_reading_is_evaluated() {
        let evaluator = AlertEvaluator::default();
        let alerts =
            evaluator.analyze_water_security(&[water(10.0, None), water(95.0, Some(90.0))], &ctx());
        assert!(alerts.is_empty());
    }

    #[test]
    fn ndvi_fallback_drives_green_danger() {
        let evaluator = AlertEvaluator::default();
        let alerts = evaluator.analyze_green_space(&[green(0.1, None)], &ctx());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Danger);
        assert_eq!(alerts[0].severity, 80);
    }

    #[test]
    fn vegetation_coverage_takes_precedence_over_ndvi() {
        let evaluator = AlertEvaluator::default();
        let alerts = evaluator.analyze_green_space(&[green(0.1, Some(25.0))], &ctx());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Warning);
        assert!(
            evaluator
                .analyze_green_space(&[green(0.1, Some(55.0))], &ctx())
                .is_empty()
        );
    }

    #[test]
    fn evaluate_combines_categories_and_stamps_context() {
        let evaluator = AlertEvaluator::default();
        let readings = ReadingSet {
            air_quality: vec![air(200.0)],
            water_security: vec![water(65.0, None)],
            green_space: vec![green(0.5, None)],
        };
        let ctx = ctx().with_label(Some("Newark".to_string()));
        let alerts = evaluator.evaluate(&readings, &ctx);

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].category, EnvironmentalCategory::AirQuality);
        assert_eq!(alerts[1].category, EnvironmentalCategory::WaterSecurity);
        for alert in &alerts {
            assert!(alert.is_active);
            assert!(alert.actionable);
            assert_eq!(alert.created_at, ctx.now);
            assert_eq!(alert.location_label.as_deref(), Some("Newark"));
        }
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let evaluator = AlertEvaluator::new(AlertThresholds {
            air_quality_warning: 50.0,
            ..AlertThresholds::default()
        });
        let alerts = evaluator.analyze_air_quality(&[air(60.0)], &ctx());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Warning);
    }
}

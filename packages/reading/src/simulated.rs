//! Simulated satellite readings.
//!
//! Stands in for real NASA product integrations. Each value starts from a
//! baseline derived from the distance to the nearest major city
//! (exponential decay of "urban influence"), adds a fixed rush-hour bump
//! for air quality, then bounded uniform noise. Every output is clamped to
//! its documented range.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Timelike as _, Utc};
use envirolens_reading_models::{
    AQI_MAX, AirQualityReading, Coordinate, DataSourceTag, GreenSpaceReading, PERCENT_MAX,
    WaterSecurityReading, clamp_metric,
};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

use crate::{ReadingError, ReadingSource};

/// Reference cities used to derive the urban-influence baseline.
const MAJOR_CITIES: &[(&str, f64, f64)] = &[
    ("New York", 40.7128, -74.0060),
    ("Los Angeles", 34.0522, -118.2437),
    ("Chicago", 41.8781, -87.6298),
    ("Mexico City", 19.4326, -99.1332),
    ("São Paulo", -23.5505, -46.6333),
    ("London", 51.5074, -0.1278),
    ("Paris", 48.8566, 2.3522),
    ("Cairo", 30.0444, 31.2357),
    ("Lagos", 6.5244, 3.3792),
    ("Delhi", 28.6139, 77.2090),
    ("Beijing", 39.9042, 116.4074),
    ("Tokyo", 35.6762, 139.6503),
    ("Jakarta", -6.2088, 106.8456),
    ("Sydney", -33.8688, 151.2093),
];

/// Distance (km) over which urban influence decays by a factor of `e`.
const URBAN_DECAY_KM: f64 = 150.0;

/// AQI added during the morning and evening rush hours (UTC).
const RUSH_HOUR_AQI_BUMP: f64 = 20.0;

/// TEMPO coverage: latitude range.
const TEMPO_LATITUDE: std::ops::RangeInclusive<f64> = 25.0..=70.0;

/// TEMPO coverage: longitude range.
const TEMPO_LONGITUDE: std::ops::RangeInclusive<f64> = -180.0..=-40.0;

/// Returns `true` if `location` falls inside the TEMPO instrument's
/// North American field of regard.
#[must_use]
pub fn in_tempo_coverage(location: Coordinate) -> bool {
    TEMPO_LATITUDE.contains(&location.latitude) && TEMPO_LONGITUDE.contains(&location.longitude)
}

/// Returns the nearest reference city and its distance in kilometers.
#[must_use]
pub fn nearest_city(location: Coordinate) -> (&'static str, f64) {
    MAJOR_CITIES
        .iter()
        .map(|(name, lat, lon)| (*name, location.distance_km(&Coordinate::new(*lat, *lon))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or(("none", f64::INFINITY))
}

/// Urban influence in `0.0..=1.0`; 1.0 at a city center.
fn urban_influence(distance_km: f64) -> f64 {
    if distance_km.is_finite() {
        (-distance_km / URBAN_DECAY_KM).exp()
    } else {
        0.0
    }
}

const fn is_rush_hour(hour: u32) -> bool {
    matches!(hour, 7..=9 | 17..=19)
}

/// Pseudo-random reading generator.
pub struct SimulatedSource {
    rng: Mutex<StdRng>,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSource {
    /// Creates a generator seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a deterministic generator.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform noise in `-span..=span`.
    fn noise(&self, span: f64) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(-span..=span)
    }

    fn metadata(location: Coordinate, extra: serde_json::Value) -> serde_json::Value {
        let (city, distance_km) = nearest_city(location);
        let mut meta = serde_json::json!({
            "simulated": true,
            "nearestCity": city,
            "distanceKm": (distance_km * 10.0).round() / 10.0,
        });
        if let (Some(meta), serde_json::Value::Object(extra)) = (meta.as_object_mut(), extra) {
            meta.extend(extra);
        }
        meta
    }

    /// Generates a single air quality reading for the given source.
    #[must_use]
    pub fn air_quality_reading(
        &self,
        source: DataSourceTag,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> AirQualityReading {
        let influence = urban_influence(nearest_city(location).1);
        let rush = if is_rush_hour(at.hour()) {
            RUSH_HOUR_AQI_BUMP
        } else {
            0.0
        };

        // TEMPO resolves neighborhoods, so it sees more of the urban signal
        // and less noise than the coarse MODIS aerosol product.
        let (urban_weight, noise_span, extra) = match source {
            DataSourceTag::NasaTempo => (
                110.0,
                10.0,
                serde_json::json!({ "resolutionKm": 2.1, "cadence": "hourly" }),
            ),
            _ => (
                90.0,
                15.0,
                serde_json::json!({ "resolutionKm": 10.0, "cadence": "daily" }),
            ),
        };

        let aqi = clamp_metric(
            25.0 + urban_weight * influence + rush + self.noise(noise_span),
            0.0,
            AQI_MAX,
            AQI_MAX,
        );
        let pm25 = (aqi * 0.35 + self.noise(3.0)).max(0.0);
        let pm10 = (pm25 * 1.6 + self.noise(5.0)).max(0.0);
        let no2 = (8.0 + 40.0 * influence + self.noise(4.0)).max(0.0);
        let o3 = (30.0 + 20.0 * influence + self.noise(6.0)).max(0.0);
        let co = (0.2 + 1.5 * influence + self.noise(0.1)).max(0.0);

        AirQualityReading {
            location,
            aqi: aqi.round(),
            pm25: Some(pm25),
            pm10: Some(pm10),
            no2: Some(no2),
            o3: Some(o3),
            co: Some(co),
            source,
            recorded_at: at,
            metadata: Self::metadata(location, extra),
        }
    }

    /// Generates a single water security reading.
    #[must_use]
    pub fn water_security_reading(
        &self,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> WaterSecurityReading {
        let influence = urban_influence(nearest_city(location).1);
        // Subtropical dry belts carry extra baseline stress.
        let aridity = if (15.0..=35.0).contains(&location.latitude.abs()) {
            15.0
        } else {
            0.0
        };

        let stress = clamp_metric(
            20.0 + 45.0 * influence + aridity + self.noise(10.0),
            0.0,
            PERCENT_MAX,
            PERCENT_MAX,
        );
        let flood_risk = clamp_metric(
            10.0 + 30.0 * influence + self.noise(10.0),
            0.0,
            PERCENT_MAX,
            PERCENT_MAX,
        );
        let drought_index = ((stress - 50.0) / 12.5).clamp(-4.0, 4.0);

        WaterSecurityReading {
            location,
            water_stress_level: stress,
            groundwater_level: Some(-5.0 * influence + self.noise(2.0)),
            precipitation: Some((10.0 + self.noise(10.0)).max(0.0)),
            drought_index: Some(drought_index),
            flood_risk: Some(flood_risk),
            source: DataSourceTag::NasaGrace,
            recorded_at: at,
            metadata: Self::metadata(location, serde_json::json!({ "cadence": "monthly" })),
        }
    }

    /// Generates a single green space reading.
    #[must_use]
    pub fn green_space_reading(
        &self,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> GreenSpaceReading {
        let influence = urban_influence(nearest_city(location).1);

        let ndvi = clamp_metric(0.65 - 0.45 * influence + self.noise(0.1), -1.0, 1.0, -1.0);
        let coverage = clamp_metric(ndvi * 100.0 + self.noise(5.0), 0.0, PERCENT_MAX, 0.0);

        GreenSpaceReading {
            location,
            ndvi,
            vegetation_coverage: Some(coverage),
            tree_canopy: Some(coverage * 0.6),
            urban_heat_island: Some(4.0 * influence),
            source: DataSourceTag::NasaLandsat,
            recorded_at: at,
            metadata: Self::metadata(location, serde_json::json!({ "resolutionM": 30 })),
        }
    }
}

#[async_trait]
impl ReadingSource for SimulatedSource {
    async fn air_quality(
        &self,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> Result<Vec<AirQualityReading>, ReadingError> {
        let mut readings = Vec::with_capacity(2);
        if in_tempo_coverage(location) {
            readings.push(self.air_quality_reading(DataSourceTag::NasaTempo, location, at));
        }
        readings.push(self.air_quality_reading(DataSourceTag::NasaModis, location, at));
        Ok(readings)
    }

    async fn water_security(
        &self,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> Result<Vec<WaterSecurityReading>, ReadingError> {
        Ok(vec![self.water_security_reading(location, at)])
    }

    async fn green_space(
        &self,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> Result<Vec<GreenSpaceReading>, ReadingError> {
        Ok(vec![self.green_space_reading(location, at)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn random_coordinates(count: usize) -> Vec<Coordinate> {
        let mut rng = StdRng::seed_from_u64(42);
        (0..count)
            .map(|_| Coordinate::new(rng.gen_range(-90.0..=90.0), rng.gen_range(-180.0..=180.0)))
            .collect()
    }

    #[test]
    fn outputs_stay_within_documented_bounds() {
        let source = SimulatedSource::with_seed(1);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

        for location in random_coordinates(10_000) {
            let air = source.air_quality_reading(DataSourceTag::NasaModis, location, at);
            assert!((0.0..=AQI_MAX).contains(&air.aqi), "aqi {}", air.aqi);

            let water = source.water_security_reading(location, at);
            assert!((0.0..=100.0).contains(&water.water_stress_level));
            assert!((0.0..=100.0).contains(&water.flood_risk.unwrap()));

            let green = source.green_space_reading(location, at);
            assert!((-1.0..=1.0).contains(&green.ndvi));
            assert!((0.0..=100.0).contains(&green.vegetation_coverage.unwrap()));
        }
    }

    #[test]
    fn tempo_coverage_is_north_america_only() {
        assert!(in_tempo_coverage(Coordinate::new(40.7, -74.0)));
        assert!(in_tempo_coverage(Coordinate::new(25.0, -40.0)));
        assert!(!in_tempo_coverage(Coordinate::new(51.5, -0.1)));
        assert!(!in_tempo_coverage(Coordinate::new(19.4, -99.1)));
        assert!(!in_tempo_coverage(Coordinate::new(71.0, -100.0)));
    }

    #[tokio::test]
    async fn tempo_only_reports_inside_coverage() {
        let source = SimulatedSource::with_seed(3);
        let at = Utc::now();

        let london = source
            .air_quality(Coordinate::new(51.5, -0.1), at)
            .await
            .unwrap();
        assert_eq!(london.len(), 1);
        assert_eq!(london[0].source, DataSourceTag::NasaModis);

        let chicago = source
            .air_quality(Coordinate::new(41.9, -87.6), at)
            .await
            .unwrap();
        assert!(chicago.iter().any(|r| r.source == DataSourceTag::NasaTempo));
    }

    #[test]
    fn city_centers_are_dirtier_than_remote_areas() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let source = SimulatedSource::with_seed(9);

        let city = source.air_quality_reading(
            DataSourceTag::NasaModis,
            Coordinate::new(28.6139, 77.2090),
            at,
        );
        let remote =
            source.air_quality_reading(DataSourceTag::NasaModis, Coordinate::new(-60.0, -140.0), at);
        assert!(city.aqi > remote.aqi);
    }

    #[test]
    fn rush_hour_window() {
        assert!(is_rush_hour(8));
        assert!(is_rush_hour(17));
        assert!(!is_rush_hour(12));
        assert!(!is_rush_hour(20));
    }

    #[test]
    fn nearest_city_picks_closest() {
        let (name, distance) = nearest_city(Coordinate::new(48.86, 2.35));
        assert_eq!(name, "Paris");
        assert!(distance < 5.0);
    }
}

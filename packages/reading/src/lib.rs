#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Environmental reading sources.
//!
//! Every provider implements the [`ReadingSource`] trait, one method per
//! category. The scorer and alert evaluator only ever see the resulting
//! [`ReadingSet`], so swapping the [`simulated::SimulatedSource`] for a
//! real satellite integration does not touch them.

pub mod simulated;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envirolens_reading_models::{
    AirQualityReading, Coordinate, EnvironmentalCategory, GreenSpaceReading, ReadingSet,
    WaterSecurityReading,
};

/// Errors that can occur while producing readings.
#[derive(Debug, thiserror::Error)]
pub enum ReadingError {
    /// The upstream provider failed or returned unusable data.
    #[error("Provider error for {category}: {message}")]
    Provider {
        /// Category that was being fetched.
        category: EnvironmentalCategory,
        /// Description of what went wrong.
        message: String,
    },
}

/// Capability interface for anything that can produce environmental
/// readings for a coordinate.
///
/// Each method may return zero readings (e.g. a coordinate outside a
/// source's coverage area).
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Produces air quality readings for `location` at time `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError`] if the provider fails.
    async fn air_quality(
        &self,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> Result<Vec<AirQualityReading>, ReadingError>;

    /// Produces water security readings for `location` at time `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError`] if the provider fails.
    async fn water_security(
        &self,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> Result<Vec<WaterSecurityReading>, ReadingError>;

    /// Produces green space readings for `location` at time `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError`] if the provider fails.
    async fn green_space(
        &self,
        location: Coordinate,
        at: DateTime<Utc>,
    ) -> Result<Vec<GreenSpaceReading>, ReadingError>;
}

/// Fetches all three categories concurrently.
///
/// A category whose fetch fails is logged and contributes an empty list;
/// the other categories are still returned.
pub async fn fetch_all(
    source: &dyn ReadingSource,
    location: Coordinate,
    at: DateTime<Utc>,
) -> ReadingSet {
    let (air, water, green) = futures::join!(
        source.air_quality(location, at),
        source.water_security(location, at),
        source.green_space(location, at),
    );

    ReadingSet {
        air_quality: or_empty(air),
        water_security: or_empty(water),
        green_space: or_empty(green),
    }
}

fn or_empty<T>(result: Result<Vec<T>, ReadingError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        log::warn!("Reading fetch failed, continuing without it: {e}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedSource;

    /// Delegates to a simulated source but fails water security fetches.
    struct FlakyWater(SimulatedSource);

    #[async_trait]
    impl ReadingSource for FlakyWater {
        async fn air_quality(
            &self,
            location: Coordinate,
            at: DateTime<Utc>,
        ) -> Result<Vec<AirQualityReading>, ReadingError> {
            self.0.air_quality(location, at).await
        }

        async fn water_security(
            &self,
            _location: Coordinate,
            _at: DateTime<Utc>,
        ) -> Result<Vec<WaterSecurityReading>, ReadingError> {
            Err(ReadingError::Provider {
                category: EnvironmentalCategory::WaterSecurity,
                message: "upstream timed out".to_string(),
            })
        }

        async fn green_space(
            &self,
            location: Coordinate,
            at: DateTime<Utc>,
        ) -> Result<Vec<GreenSpaceReading>, ReadingError> {
            self.0.green_space(location, at).await
        }
    }

    #[tokio::test]
    async fn fetch_all_collects_every_category() {
        let source = SimulatedSource::with_seed(7);
        let set = fetch_all(&source, Coordinate::new(40.7, -74.0), Utc::now()).await;

        // TEMPO covers New York, so two air quality sources report.
        assert_eq!(set.air_quality.len(), 2);
        assert_eq!(set.water_security.len(), 1);
        assert_eq!(set.green_space.len(), 1);
    }

    #[tokio::test]
    async fn failed_category_degrades_to_empty() {
        let source = FlakyWater(SimulatedSource::with_seed(7));
        let set = fetch_all(&source, Coordinate::new(48.85, 2.35), Utc::now()).await;

        assert!(set.water_security.is_empty());
        assert_eq!(set.air_quality.len(), 1);
        assert_eq!(set.green_space.len(), 1);
        assert!(set.has_empty_category());
    }
}

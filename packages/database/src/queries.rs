//! Reading and livability score queries.
//!
//! All location lookups are bounding-box range scans ordered newest first.
//! Time windows are applied after the range scan against an injected
//! `now`, so callers (and tests) control the clock.

use chrono::{DateTime, Duration, Utc};
use envirolens_database_models::{
    BoundingBox, LivabilityScoreRecord, Stored, StoredReadingSet,
};
use envirolens_reading_models::{
    AirQualityReading, Coordinate, GreenSpaceReading, ReadingSet, WaterSecurityReading,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{
    DbError, opt_f64, opt_str, returning_id, row_enum, row_f64, row_id, row_json, row_location,
    row_opt_f64, row_percent, row_timestamp, timestamp,
};

/// A reading type with its own table.
pub trait ReadingRow: Sized + Clone {
    /// Table name.
    const TABLE: &'static str;

    /// Columns written on insert, excluding `id`, `latitude`, `longitude`,
    /// `source`, `recorded_at` and `metadata`.
    const METRIC_COLUMNS: &'static [&'static str];

    /// Where the reading applies.
    fn location(&self) -> Coordinate;

    /// When the reading was taken.
    fn recorded_at(&self) -> DateTime<Utc>;

    /// Values for [`Self::METRIC_COLUMNS`], in order.
    fn metric_values(&self) -> Vec<DatabaseValue>;

    /// Producing source tag.
    fn source(&self) -> &str;

    /// Source metadata.
    fn metadata(&self) -> &serde_json::Value;

    /// Converts a database row into a reading.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conversion`] if a required column is missing or
    /// malformed.
    fn from_row(row: &switchy_database::Row) -> Result<Self, DbError>;
}

impl ReadingRow for AirQualityReading {
    const TABLE: &'static str = "air_quality_readings";
    const METRIC_COLUMNS: &'static [&'static str] = &["aqi", "pm25", "pm10", "no2", "o3", "co"];

    fn location(&self) -> Coordinate {
        self.location
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    fn metric_values(&self) -> Vec<DatabaseValue> {
        vec![
            DatabaseValue::Real64(self.aqi),
            opt_f64(self.pm25),
            opt_f64(self.pm10),
            opt_f64(self.no2),
            opt_f64(self.o3),
            opt_f64(self.co),
        ]
    }

    fn source(&self) -> &str {
        self.source.as_ref()
    }

    fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    fn from_row(row: &switchy_database::Row) -> Result<Self, DbError> {
        Ok(Self {
            location: row_location(row)?,
            aqi: row_f64(row, "aqi")?,
            pm25: row_opt_f64(row, "pm25"),
            pm10: row_opt_f64(row, "pm10"),
            no2: row_opt_f64(row, "no2"),
            o3: row_opt_f64(row, "o3"),
            co: row_opt_f64(row, "co"),
            source: row_enum(row, "source")?,
            recorded_at: row_timestamp(row, "recorded_at")?,
            metadata: row_json(row, "metadata"),
        })
    }
}

impl ReadingRow for WaterSecurityReading {
    const TABLE: &'static str = "water_security_readings";
    const METRIC_COLUMNS: &'static [&'static str] = &[
        "water_stress_level",
        "groundwater_level",
        "precipitation",
        "drought_index",
        "flood_risk",
    ];

    fn location(&self) -> Coordinate {
        self.location
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    fn metric_values(&self) -> Vec<DatabaseValue> {
        vec![
            DatabaseValue::Real64(self.water_stress_level),
            opt_f64(self.groundwater_level),
            opt_f64(self.precipitation),
            opt_f64(self.drought_index),
            opt_f64(self.flood_risk),
        ]
    }

    fn source(&self) -> &str {
        self.source.as_ref()
    }

    fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    fn from_row(row: &switchy_database::Row) -> Result<Self, DbError> {
        Ok(Self {
            location: row_location(row)?,
            water_stress_level: row_f64(row, "water_stress_level")?,
            groundwater_level: row_opt_f64(row, "groundwater_level"),
            precipitation: row_opt_f64(row, "precipitation"),
            drought_index: row_opt_f64(row, "drought_index"),
            flood_risk: row_opt_f64(row, "flood_risk"),
            source: row_enum(row, "source")?,
            recorded_at: row_timestamp(row, "recorded_at")?,
            metadata: row_json(row, "metadata"),
        })
    }
}

impl ReadingRow for GreenSpaceReading {
    const TABLE: &'static str = "green_space_readings";
    const METRIC_COLUMNS: &'static [&'static str] = &[
        "ndvi",
        "vegetation_coverage",
        "tree_canopy",
        "urban_heat_island",
    ];

    fn location(&self) -> Coordinate {
        self.location
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    fn metric_values(&self) -> Vec<DatabaseValue> {
        vec![
            DatabaseValue::Real64(self.ndvi),
            opt_f64(self.vegetation_coverage),
            opt_f64(self.tree_canopy),
            opt_f64(self.urban_heat_island),
        ]
    }

    fn source(&self) -> &str {
        self.source.as_ref()
    }

    fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    fn from_row(row: &switchy_database::Row) -> Result<Self, DbError> {
        Ok(Self {
            location: row_location(row)?,
            ndvi: row_f64(row, "ndvi")?,
            vegetation_coverage: row_opt_f64(row, "vegetation_coverage"),
            tree_canopy: row_opt_f64(row, "tree_canopy"),
            urban_heat_island: row_opt_f64(row, "urban_heat_island"),
            source: row_enum(row, "source")?,
            recorded_at: row_timestamp(row, "recorded_at")?,
            metadata: row_json(row, "metadata"),
        })
    }
}

/// Inserts a reading and returns it with its new row id.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_reading<R: ReadingRow>(
    db: &dyn Database,
    reading: &R,
) -> Result<Stored<R>, DbError> {
    let columns = R::METRIC_COLUMNS.join(", ");
    let placeholders = vec!["?"; R::METRIC_COLUMNS.len() + 5].join(", ");
    let sql = format!(
        "INSERT INTO {} (latitude, longitude, {columns}, source, recorded_at, metadata)
         VALUES ({placeholders})
         RETURNING id",
        R::TABLE
    );

    let location = reading.location();
    let metadata = if reading.metadata().is_null() {
        None
    } else {
        Some(reading.metadata().to_string())
    };

    let mut params = Vec::with_capacity(R::METRIC_COLUMNS.len() + 5);
    params.push(DatabaseValue::Real64(location.latitude));
    params.push(DatabaseValue::Real64(location.longitude));
    params.extend(reading.metric_values());
    params.push(DatabaseValue::String(reading.source().to_string()));
    params.push(timestamp(&reading.recorded_at()));
    params.push(opt_str(metadata.as_deref()));

    let rows = db
        .query_raw_params(&sql, &params)
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(Stored::new(returning_id(&rows)?, reading.clone()))
}

/// Inserts every reading of `readings`, preserving order within each
/// category.
///
/// # Errors
///
/// Returns [`DbError`] on the first failed insert.
pub async fn insert_readings(
    db: &dyn Database,
    readings: &ReadingSet,
) -> Result<StoredReadingSet, DbError> {
    let mut stored = StoredReadingSet::default();

    for reading in &readings.air_quality {
        stored.air_quality.push(insert_reading(db, reading).await?);
    }
    for reading in &readings.water_security {
        stored.water_security.push(insert_reading(db, reading).await?);
    }
    for reading in &readings.green_space {
        stored.green_space.push(insert_reading(db, reading).await?);
    }

    log::debug!("insert_readings: stored {} readings", readings.len());

    Ok(stored)
}

/// Returns readings inside `bbox`, newest first, at most `limit` rows.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn readings_in_bbox<R: ReadingRow>(
    db: &dyn Database,
    bbox: &BoundingBox,
    limit: Option<u32>,
) -> Result<Vec<Stored<R>>, DbError> {
    let mut sql = format!(
        "SELECT * FROM {}
         WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?
         ORDER BY recorded_at DESC, id DESC",
        R::TABLE
    );
    let mut params = vec![
        DatabaseValue::Real64(bbox.south),
        DatabaseValue::Real64(bbox.north),
        DatabaseValue::Real64(bbox.west),
        DatabaseValue::Real64(bbox.east),
    ];
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        params.push(DatabaseValue::Int64(i64::from(limit)));
    }

    let rows = db
        .query_raw_params(&sql, &params)
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    rows.iter().map(row_to_stored).collect()
}

/// Converts a database row into a stored reading.
fn row_to_stored<R: ReadingRow>(row: &switchy_database::Row) -> Result<Stored<R>, DbError> {
    Ok(Stored::new(row_id(row)?, R::from_row(row)?))
}

/// Returns readings near `location` recorded within `window` of `now`,
/// newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn recent_readings<R: ReadingRow>(
    db: &dyn Database,
    location: Coordinate,
    radius: f64,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<R>, DbError> {
    let cutoff = now - window;
    let rows = readings_in_bbox::<R>(db, &BoundingBox::around(location, radius), None).await?;

    Ok(rows
        .into_iter()
        .map(|stored| stored.record)
        .filter(|reading| reading.recorded_at() >= cutoff)
        .collect())
}

/// Returns every category's readings near `location` within `window` of
/// `now`. The three lookups run concurrently.
///
/// # Errors
///
/// Returns [`DbError`] if any lookup fails.
pub async fn recent_reading_set(
    db: &dyn Database,
    location: Coordinate,
    radius: f64,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<ReadingSet, DbError> {
    let (air_quality, water_security, green_space) = futures::try_join!(
        recent_readings::<AirQualityReading>(db, location, radius, window, now),
        recent_readings::<WaterSecurityReading>(db, location, radius, window, now),
        recent_readings::<GreenSpaceReading>(db, location, radius, window, now),
    )?;

    Ok(ReadingSet {
        air_quality,
        water_security,
        green_space,
    })
}

/// Returns the most recent reading of each category inside `bbox`.
///
/// # Errors
///
/// Returns [`DbError`] if any lookup fails.
pub async fn latest_readings(
    db: &dyn Database,
    bbox: &BoundingBox,
) -> Result<StoredReadingSet, DbError> {
    let (air_quality, water_security, green_space) = futures::try_join!(
        readings_in_bbox::<AirQualityReading>(db, bbox, Some(1)),
        readings_in_bbox::<WaterSecurityReading>(db, bbox, Some(1)),
        readings_in_bbox::<GreenSpaceReading>(db, bbox, Some(1)),
    )?;

    Ok(StoredReadingSet {
        air_quality,
        water_security,
        green_space,
    })
}

// ---------------------------------------------------------------------------
// Livability scores
// ---------------------------------------------------------------------------

/// Inserts a livability score.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_score(
    db: &dyn Database,
    score: &LivabilityScoreRecord,
) -> Result<Stored<LivabilityScoreRecord>, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO livability_scores (latitude, longitude, location_label,
                 air_quality_score, water_security_score, green_space_score,
                 overall_score, category, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            &[
                DatabaseValue::Real64(score.location.latitude),
                DatabaseValue::Real64(score.location.longitude),
                opt_str(score.location_label.as_deref()),
                DatabaseValue::Int64(i64::from(score.air_quality_score)),
                DatabaseValue::Int64(i64::from(score.water_security_score)),
                DatabaseValue::Int64(i64::from(score.green_space_score)),
                DatabaseValue::Int64(i64::from(score.overall_score)),
                DatabaseValue::String(score.category.as_ref().to_string()),
                timestamp(&score.created_at),
            ],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(Stored::new(returning_id(&rows)?, score.clone()))
}

/// Returns the most recent score inside `bbox`, if any.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn latest_score(
    db: &dyn Database,
    bbox: &BoundingBox,
) -> Result<Option<Stored<LivabilityScoreRecord>>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM livability_scores
             WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            &[
                DatabaseValue::Real64(bbox.south),
                DatabaseValue::Real64(bbox.north),
                DatabaseValue::Real64(bbox.west),
                DatabaseValue::Real64(bbox.east),
            ],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    rows.first().map(row_to_score).transpose()
}

/// Converts a database row into a stored [`LivabilityScoreRecord`].
fn row_to_score(row: &switchy_database::Row) -> Result<Stored<LivabilityScoreRecord>, DbError> {
    Ok(Stored::new(
        row_id(row)?,
        LivabilityScoreRecord {
            location: row_location(row)?,
            location_label: row.to_value("location_label").unwrap_or(None),
            air_quality_score: row_percent(row, "air_quality_score")?,
            water_security_score: row_percent(row, "water_security_score")?,
            green_space_score: row_percent(row, "green_space_score")?,
            overall_score: row_percent(row, "overall_score")?,
            category: row_enum(row, "category")?,
            created_at: row_timestamp(row, "created_at")?,
        },
    ))
}

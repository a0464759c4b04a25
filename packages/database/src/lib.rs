#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` persistence for readings, livability scores, and alerts.
//!
//! Uses `switchy_database` for all database operations. The schema is
//! created idempotently when the database is opened. Timestamps are stored
//! as RFC 3339 text with millisecond precision and a `Z` suffix so they
//! sort lexicographically. Readings and scores are append-only; alerts are
//! only ever updated to clear their active flag.

pub mod alerts;
pub mod queries;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use envirolens_reading_models::Coordinate;
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed (e.g., creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be converted back into its domain type.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens (or creates) the `SQLite` database at the given path and ensures
/// all tables exist.
///
/// # Errors
///
/// Returns [`DbError`] if the database file cannot be created or the schema
/// DDL fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    log::info!("Opened database at {}", path.display());

    Ok(db)
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS air_quality_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        aqi REAL NOT NULL,
        pm25 REAL,
        pm10 REAL,
        no2 REAL,
        o3 REAL,
        co REAL,
        source TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        metadata TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_air_quality_location
        ON air_quality_readings (latitude, longitude)",
    "CREATE TABLE IF NOT EXISTS water_security_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        water_stress_level REAL NOT NULL,
        groundwater_level REAL,
        precipitation REAL,
        drought_index REAL,
        flood_risk REAL,
        source TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        metadata TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_water_security_location
        ON water_security_readings (latitude, longitude)",
    "CREATE TABLE IF NOT EXISTS green_space_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        ndvi REAL NOT NULL,
        vegetation_coverage REAL,
        tree_canopy REAL,
        urban_heat_island REAL,
        source TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        metadata TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_green_space_location
        ON green_space_readings (latitude, longitude)",
    "CREATE TABLE IF NOT EXISTS livability_scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        location_label TEXT,
        air_quality_score INTEGER NOT NULL,
        water_security_score INTEGER NOT NULL,
        green_space_score INTEGER NOT NULL,
        overall_score INTEGER NOT NULL,
        category TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_livability_scores_location
        ON livability_scores (latitude, longitude)",
    "CREATE TABLE IF NOT EXISTS alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        alert_type TEXT NOT NULL,
        category TEXT NOT NULL,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        location_label TEXT,
        severity INTEGER NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        actionable INTEGER NOT NULL DEFAULT 1,
        recommendations TEXT,
        metrics TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_alerts_active
        ON alerts (is_active, severity DESC, created_at DESC)",
];

/// Creates all tables and indexes if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    for statement in SCHEMA {
        db.exec_raw(statement)
            .await
            .map_err(|e| DbError::Database(e.to_string()))?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Converts an `Option<f64>` to a [`DatabaseValue`], using `Null` for `None`.
fn opt_f64(value: Option<f64>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, DatabaseValue::Real64)
}

/// Converts an `Option<&str>` to a [`DatabaseValue`], using `Null` for `None`.
fn opt_str(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |s| {
        DatabaseValue::String(s.to_string())
    })
}

/// Formats a timestamp the way every table stores it.
fn timestamp(value: &DateTime<Utc>) -> DatabaseValue {
    DatabaseValue::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Reads a `TEXT` timestamp column.
fn row_timestamp(row: &switchy_database::Row, col: &str) -> Result<DateTime<Utc>, DbError> {
    let raw: String = row.to_value(col).map_err(|e| DbError::Conversion {
        message: format!("Failed to read {col}: {e}"),
    })?;

    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Conversion {
            message: format!("Invalid timestamp in {col} ({raw}): {e}"),
        })
}

/// Reads a required `REAL` column.
fn row_f64(row: &switchy_database::Row, col: &str) -> Result<f64, DbError> {
    row.to_value(col).map_err(|e| DbError::Conversion {
        message: format!("Failed to read {col}: {e}"),
    })
}

/// Reads the `latitude`/`longitude` column pair.
fn row_location(row: &switchy_database::Row) -> Result<Coordinate, DbError> {
    Ok(Coordinate::new(
        row_f64(row, "latitude")?,
        row_f64(row, "longitude")?,
    ))
}

/// Reads the `id` column.
fn row_id(row: &switchy_database::Row) -> Result<i64, DbError> {
    row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to read id: {e}"),
    })
}

/// Reads a nullable `REAL` column.
fn row_opt_f64(row: &switchy_database::Row, col: &str) -> Option<f64> {
    row.to_value::<Option<f64>>(col).unwrap_or(None)
}

/// Reads an `INTEGER` score or severity column, clamped to `0..=100`.
fn row_percent(row: &switchy_database::Row, col: &str) -> Result<u8, DbError> {
    let value: i64 = row.to_value(col).map_err(|e| DbError::Conversion {
        message: format!("Failed to read {col}: {e}"),
    })?;

    u8::try_from(value.clamp(0, 100)).map_err(|e| DbError::Conversion {
        message: format!("Invalid {col} {value}: {e}"),
    })
}

/// Reads a string-encoded enum column.
fn row_enum<T: std::str::FromStr>(row: &switchy_database::Row, col: &str) -> Result<T, DbError> {
    let raw: String = row.to_value(col).map_err(|e| DbError::Conversion {
        message: format!("Failed to read {col}: {e}"),
    })?;

    raw.parse().map_err(|_| DbError::Conversion {
        message: format!("Unknown {col} value: {raw}"),
    })
}

/// Reads a JSON `TEXT` column, returning `Null` for missing or invalid
/// content.
fn row_json(row: &switchy_database::Row, col: &str) -> serde_json::Value {
    row.to_value::<Option<String>>(col)
        .unwrap_or(None)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or(serde_json::Value::Null)
}

/// Extracts the `id` column of the first row returned by a `RETURNING id`
/// clause.
fn returning_id(rows: &[switchy_database::Row]) -> Result<i64, DbError> {
    rows.first()
        .and_then(|r| r.to_value("id").ok())
        .ok_or_else(|| DbError::Conversion {
            message: "Insert did not return an id".to_string(),
        })
}

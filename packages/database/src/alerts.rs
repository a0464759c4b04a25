//! Alert persistence.
//!
//! Alerts are never deleted: dismissing one clears `is_active`, and the
//! active listing only returns rows with the flag set.

use std::collections::BTreeMap;

use envirolens_alert_models::Alert;
use envirolens_database_models::Stored;
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{
    DbError, opt_str, returning_id, row_enum, row_id, row_location, row_percent, row_timestamp,
    timestamp,
};

/// Inserts an alert.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails or the alert's JSON columns
/// cannot be encoded.
pub async fn insert_alert(db: &dyn Database, alert: &Alert) -> Result<Stored<Alert>, DbError> {
    let recommendations = alert
        .recommendations
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DbError::Conversion {
            message: format!("Failed to encode recommendations: {e}"),
        })?;
    let metrics = serde_json::to_string(&alert.metrics).map_err(|e| DbError::Conversion {
        message: format!("Failed to encode metrics: {e}"),
    })?;

    let rows = db
        .query_raw_params(
            "INSERT INTO alerts (alert_type, category, title, message, latitude, longitude,
                 location_label, severity, is_active, actionable, recommendations, metrics,
                 created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            &[
                DatabaseValue::String(alert.alert_type.as_ref().to_string()),
                DatabaseValue::String(alert.category.as_ref().to_string()),
                DatabaseValue::String(alert.title.clone()),
                DatabaseValue::String(alert.message.clone()),
                DatabaseValue::Real64(alert.location.latitude),
                DatabaseValue::Real64(alert.location.longitude),
                opt_str(alert.location_label.as_deref()),
                DatabaseValue::Int64(i64::from(alert.severity)),
                DatabaseValue::Int64(i64::from(alert.is_active)),
                DatabaseValue::Int64(i64::from(alert.actionable)),
                opt_str(recommendations.as_deref()),
                DatabaseValue::String(metrics),
                timestamp(&alert.created_at),
            ],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(Stored::new(returning_id(&rows)?, alert.clone()))
}

/// Inserts several alerts in order.
///
/// # Errors
///
/// Returns [`DbError`] on the first failed insert.
pub async fn insert_alerts(db: &dyn Database, alerts: &[Alert]) -> Result<Vec<Stored<Alert>>, DbError> {
    let mut stored = Vec::with_capacity(alerts.len());
    for alert in alerts {
        stored.push(insert_alert(db, alert).await?);
    }
    Ok(stored)
}

/// Returns active alerts, most severe first and newest first within a
/// severity.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn active_alerts(
    db: &dyn Database,
    limit: Option<u32>,
) -> Result<Vec<Stored<Alert>>, DbError> {
    let mut sql = "SELECT * FROM alerts WHERE is_active = 1
                   ORDER BY severity DESC, created_at DESC, id DESC"
        .to_string();
    let mut params = Vec::new();
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        params.push(DatabaseValue::Int64(i64::from(limit)));
    }

    let rows = db
        .query_raw_params(&sql, &params)
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    rows.iter().map(row_to_alert).collect()
}

/// Retrieves a single alert by id, active or not.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn get_alert(db: &dyn Database, id: i64) -> Result<Option<Stored<Alert>>, DbError> {
    let rows = db
        .query_raw_params("SELECT * FROM alerts WHERE id = ?", &[DatabaseValue::Int64(id)])
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    rows.first().map(row_to_alert).transpose()
}

/// Marks an alert inactive. Returns `false` if no alert has that id.
///
/// Dismissing an already dismissed alert still returns `true`.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub async fn dismiss_alert(db: &dyn Database, id: i64) -> Result<bool, DbError> {
    let updated = db
        .exec_raw_params(
            "UPDATE alerts SET is_active = 0 WHERE id = ?",
            &[DatabaseValue::Int64(id)],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    if updated > 0 {
        log::info!("Dismissed alert {id}");
    }

    Ok(updated > 0)
}

/// Converts a database row into a stored [`Alert`].
fn row_to_alert(row: &switchy_database::Row) -> Result<Stored<Alert>, DbError> {
    let recommendations = row
        .to_value::<Option<String>>("recommendations")
        .unwrap_or(None)
        .and_then(|raw| match serde_json::from_str(&raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                log::warn!("Ignoring unreadable recommendations on alert: {e}");
                None
            }
        });
    let metrics = row
        .to_value::<Option<String>>("metrics")
        .unwrap_or(None)
        .and_then(|raw| serde_json::from_str::<BTreeMap<String, f64>>(&raw).ok())
        .unwrap_or_default();

    Ok(Stored::new(
        row_id(row)?,
        Alert {
            alert_type: row_enum(row, "alert_type")?,
            category: row_enum(row, "category")?,
            title: row.to_value("title").unwrap_or_default(),
            message: row.to_value("message").unwrap_or_default(),
            location: row_location(row)?,
            location_label: row.to_value("location_label").unwrap_or(None),
            severity: row_percent(row, "severity")?,
            is_active: row.to_value::<i64>("is_active").unwrap_or(0) != 0,
            actionable: row.to_value::<i64>("actionable").unwrap_or(0) != 0,
            recommendations,
            metrics,
            created_at: row_timestamp(row, "created_at")?,
        },
    ))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use envirolens_alert_models::{AlertType, RecommendationPayload, WaterSecurityRecommendations};
    use envirolens_reading_models::{Coordinate, EnvironmentalCategory};

    use super::*;
    use crate::test_support::TempDb;

    fn alert(severity: u8, created_at: DateTime<Utc>) -> Alert {
        Alert {
            alert_type: AlertType::Danger,
            category: EnvironmentalCategory::WaterSecurity,
            title: "High Flood Risk".to_string(),
            message: "Flood risk is at 75%.".to_string(),
            location: Coordinate::new(29.76, -95.37),
            location_label: Some("Houston".to_string()),
            severity,
            is_active: true,
            actionable: true,
            recommendations: Some(RecommendationPayload::WaterSecurity(
                WaterSecurityRecommendations {
                    conservation: vec!["a".to_string()],
                    infrastructure: vec![],
                    emergency: vec!["b".to_string()],
                },
            )),
            metrics: BTreeMap::from([("floodRisk".to_string(), 75.0)]),
            created_at,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let tmp = TempDb::new().await;
        let original = alert(79, "2024-06-01T12:00:00Z".parse().unwrap());

        let stored = insert_alert(tmp.db.as_ref(), &original).await.unwrap();
        let fetched = get_alert(tmp.db.as_ref(), stored.id).await.unwrap().unwrap();

        assert_eq!(fetched.record, original);
        assert!(get_alert(tmp.db.as_ref(), stored.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_alerts_order_by_severity_then_recency() {
        let tmp = TempDb::new().await;
        let base: DateTime<Utc> = "2024-06-01T12:00:00Z".parse().unwrap();
        let inserted = insert_alerts(
            tmp.db.as_ref(),
            &[
                alert(50, base),
                alert(90, base),
                alert(50, base + Duration::minutes(5)),
            ],
        )
        .await
        .unwrap();

        let active = active_alerts(tmp.db.as_ref(), None).await.unwrap();
        let ids: Vec<i64> = active.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![inserted[1].id, inserted[2].id, inserted[0].id]);

        let limited = active_alerts(tmp.db.as_ref(), Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].record.severity, 90);
    }

    #[tokio::test]
    async fn dismiss_is_a_soft_delete() {
        let tmp = TempDb::new().await;
        let stored = insert_alert(tmp.db.as_ref(), &alert(60, Utc::now()))
            .await
            .unwrap();

        assert!(dismiss_alert(tmp.db.as_ref(), stored.id).await.unwrap());
        assert!(active_alerts(tmp.db.as_ref(), None).await.unwrap().is_empty());

        let kept = get_alert(tmp.db.as_ref(), stored.id).await.unwrap().unwrap();
        assert!(!kept.record.is_active);

        assert!(!dismiss_alert(tmp.db.as_ref(), stored.id + 1).await.unwrap());
    }
}

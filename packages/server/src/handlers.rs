//! HTTP handler functions for the envirolens API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use envirolens_alert::{AlertContext, attach_recommendations};
use envirolens_database::alerts as alert_queries;
use envirolens_database::queries::{self, ReadingRow};
use envirolens_database_models::{BoundingBox, LivabilityScoreRecord, StoredReadingSet};
use envirolens_reading_models::{
    AirQualityReading, Coordinate, GreenSpaceReading, WaterSecurityReading,
};
use envirolens_server_models::{
    ApiCurrentConditions, ApiDashboard, ApiDismissed, ApiEnvironmentalData, ApiHealth,
    ApiLivability, GenerateAlertsRequest, HistoryQueryParams, LivabilityQueryParams,
};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

type CoordinatePath = web::Path<(String, String)>;

fn parse_location(path: &CoordinatePath) -> Result<Coordinate, ApiError> {
    Ok(Coordinate::parse(&path.0, &path.1)?)
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/environmental-data/{lat}/{lon}`
///
/// Fetches fresh readings for every category, stores them, and returns the
/// stored rows.
pub async fn environmental_data(
    state: web::Data<AppState>,
    path: CoordinatePath,
) -> Result<HttpResponse, ApiError> {
    let location = parse_location(&path)?;
    let now = Utc::now();

    let readings = envirolens_reading::fetch_all(state.source.as_ref(), location, now).await;
    let stored = queries::insert_readings(state.db.as_ref(), &readings).await?;

    log::info!(
        "Stored {} readings for ({}, {})",
        readings.len(),
        location.latitude,
        location.longitude
    );

    Ok(HttpResponse::Ok().json(ApiEnvironmentalData {
        location,
        readings: stored,
        fetched_at: now,
    }))
}

/// `GET /api/livability/{lat}/{lon}?location=`
///
/// Scores the readings stored near the location within the livability
/// window and persists the score.
pub async fn livability(
    state: web::Data<AppState>,
    path: CoordinatePath,
    params: web::Query<LivabilityQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let location = parse_location(&path)?;
    let now = Utc::now();

    let readings = queries::recent_reading_set(
        state.db.as_ref(),
        location,
        state.query.reading_radius,
        state.query.livability_window(),
        now,
    )
    .await?;

    let metrics =
        envirolens_scoring::metrics_from_readings(&readings).ok_or(ApiError::InsufficientData)?;
    let assessment = state.scorer.score(&metrics);

    let record = LivabilityScoreRecord::from_assessment(
        location,
        params.into_inner().location,
        &assessment,
        now,
    );
    let score = queries::insert_score(state.db.as_ref(), &record).await?;

    Ok(HttpResponse::Ok().json(ApiLivability {
        score,
        metrics,
        recommendations: assessment.recommendations,
    }))
}

/// `GET /api/alerts`
///
/// Lists active alerts, most severe first.
pub async fn alerts(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let alerts = alert_queries::active_alerts(state.db.as_ref(), None).await?;
    Ok(HttpResponse::Ok().json(alerts))
}

/// `POST /api/alerts/generate/{lat}/{lon}`
///
/// Evaluates the readings stored near the location within the alert
/// window, attaches recommendations, and stores the resulting alerts. The
/// JSON body is optional.
pub async fn generate_alerts(
    state: web::Data<AppState>,
    path: CoordinatePath,
    body: Option<web::Json<GenerateAlertsRequest>>,
) -> Result<HttpResponse, ApiError> {
    let location = parse_location(&path)?;
    let now = Utc::now();
    let label = body.and_then(|b| b.into_inner().location);

    let readings = queries::recent_reading_set(
        state.db.as_ref(),
        location,
        state.query.reading_radius,
        state.query.alert_window(),
        now,
    )
    .await?;

    let ctx = AlertContext::new(location, now).with_label(label);
    let mut alerts = state.evaluator.evaluate(&readings, &ctx);
    attach_recommendations(state.recommender.as_ref(), &mut alerts).await;

    let stored = alert_queries::insert_alerts(state.db.as_ref(), &alerts).await?;

    log::info!(
        "Generated {} alerts for ({}, {})",
        stored.len(),
        location.latitude,
        location.longitude
    );

    Ok(HttpResponse::Ok().json(stored))
}

/// `PATCH /api/alerts/{id}/dismiss`
pub async fn dismiss_alert(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    if !alert_queries::dismiss_alert(state.db.as_ref(), id).await? {
        return Err(ApiError::AlertNotFound(id));
    }

    Ok(HttpResponse::Ok().json(ApiDismissed {
        id,
        dismissed: true,
    }))
}

/// `GET /api/{air-quality|water-security|green-space}/{lat}/{lon}?radius=`
///
/// Returns stored readings of one category inside the bounding box, newest
/// first.
pub async fn history<R: ReadingRow + Serialize + 'static>(
    state: web::Data<AppState>,
    path: CoordinatePath,
    params: web::Query<HistoryQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let location = parse_location(&path)?;
    let radius = params.radius.unwrap_or(state.query.reading_radius);

    let rows =
        queries::readings_in_bbox::<R>(state.db.as_ref(), &BoundingBox::around(location, radius), None)
            .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// `GET /api/dashboard/{lat}/{lon}`
///
/// Combines current conditions, the latest score, the most severe active
/// alerts, and recent history. All lookups run concurrently.
pub async fn dashboard(
    state: web::Data<AppState>,
    path: CoordinatePath,
) -> Result<HttpResponse, ApiError> {
    let location = parse_location(&path)?;
    let db = state.db.as_ref();
    let query = &state.query;
    let reading_box = BoundingBox::around(location, query.reading_radius);
    let score_box = BoundingBox::around(location, query.score_radius);
    let history_limit = Some(query.history_limit);

    let (latest, livability, alerts, air_quality, water_security, green_space) = futures::try_join!(
        queries::latest_readings(db, &reading_box),
        queries::latest_score(db, &score_box),
        alert_queries::active_alerts(db, Some(query.dashboard_alert_limit)),
        queries::readings_in_bbox::<AirQualityReading>(db, &reading_box, history_limit),
        queries::readings_in_bbox::<WaterSecurityReading>(db, &reading_box, history_limit),
        queries::readings_in_bbox::<GreenSpaceReading>(db, &reading_box, history_limit),
    )?;

    Ok(HttpResponse::Ok().json(ApiDashboard {
        location,
        current: ApiCurrentConditions::from(latest),
        livability,
        alerts,
        history: StoredReadingSet {
            air_quality,
            water_security,
            green_space,
        },
    }))
}

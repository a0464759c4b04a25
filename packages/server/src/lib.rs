#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the envirolens dashboard.
//!
//! Serves the REST API for environmental readings, livability scores and
//! alerts, plus the compiled frontend from `app/dist`. Readings are
//! generated on demand by a [`ReadingSource`] and persisted in a `SQLite`
//! database at `DATABASE_PATH` (default `data/envirolens.db`). Alert
//! recommendations come from a language model when credentials are
//! configured, and from a static table otherwise.

pub mod config;
pub mod error;
mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use envirolens_alert::{
    AiRecommendations, AlertEvaluator, RecommendationProvider, StaticRecommendations,
};
use envirolens_reading::ReadingSource;
use envirolens_reading::simulated::SimulatedSource;
use envirolens_reading_models::{AirQualityReading, GreenSpaceReading, WaterSecurityReading};
use envirolens_scoring::LivabilityScorer;
use switchy_database::Database;

use crate::config::{EnvirolensConfig, QueryConfig};

/// Default location of the `SQLite` database.
pub const DEFAULT_DB_PATH: &str = "data/envirolens.db";

/// Shared application state.
pub struct AppState {
    /// Reading, score, and alert storage.
    pub db: Arc<dyn Database>,
    /// Source of fresh readings.
    pub source: Arc<dyn ReadingSource>,
    /// Livability scorer with validated weights.
    pub scorer: LivabilityScorer,
    /// Alert evaluator with the configured thresholds.
    pub evaluator: AlertEvaluator,
    /// Recommendation provider for generated alerts.
    pub recommender: Arc<dyn RecommendationProvider>,
    /// Query radii, windows, and limits.
    pub query: QueryConfig,
}

impl AppState {
    /// Builds the state from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`envirolens_scoring_models::ScoringConfigError`] if the
    /// scoring weights are invalid.
    pub fn new(
        config: &EnvirolensConfig,
        db: Arc<dyn Database>,
        source: Arc<dyn ReadingSource>,
        recommender: Arc<dyn RecommendationProvider>,
    ) -> Result<Self, envirolens_scoring_models::ScoringConfigError> {
        Ok(Self {
            db,
            source,
            scorer: LivabilityScorer::new(config.scoring)?,
            evaluator: AlertEvaluator::new(config.alerts),
            recommender,
            query: config.query,
        })
    }
}

/// Registers every `/api` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route(
                "/environmental-data/{lat}/{lon}",
                web::get().to(handlers::environmental_data),
            )
            .route("/livability/{lat}/{lon}", web::get().to(handlers::livability))
            .route("/alerts", web::get().to(handlers::alerts))
            .route(
                "/alerts/generate/{lat}/{lon}",
                web::post().to(handlers::generate_alerts),
            )
            .route("/alerts/{id}/dismiss", web::patch().to(handlers::dismiss_alert))
            .route(
                "/air-quality/{lat}/{lon}",
                web::get().to(handlers::history::<AirQualityReading>),
            )
            .route(
                "/water-security/{lat}/{lon}",
                web::get().to(handlers::history::<WaterSecurityReading>),
            )
            .route(
                "/green-space/{lat}/{lon}",
                web::get().to(handlers::history::<GreenSpaceReading>),
            )
            .route("/dashboard/{lat}/{lon}", web::get().to(handlers::dashboard)),
    );
}

/// Startup options supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// TOML configuration file. Falls back to `ENVIROLENS_CONFIG`.
    pub config_path: Option<PathBuf>,
    /// Forces static recommendations even when LLM credentials exist.
    pub no_ai: bool,
}

/// Picks the recommendation provider: a language model when enabled and
/// configured, the static table otherwise.
fn select_recommender(config: &EnvirolensConfig, no_ai: bool) -> Arc<dyn RecommendationProvider> {
    if no_ai || !config.ai.enabled {
        log::info!("AI recommendations disabled, using static recommendations");
        return Arc::new(StaticRecommendations);
    }

    match envirolens_ai::providers::create_provider_from_env() {
        Ok(provider) => {
            log::info!("Using {} for alert recommendations", provider.name());
            Arc::new(AiRecommendations::new(provider, config.ai.timeout()))
        }
        Err(e) => {
            log::info!("{e}; using static recommendations");
            Arc::new(StaticRecommendations)
        }
    }
}

/// Starts the envirolens API server.
///
/// Loads configuration, opens the `SQLite` database, picks the
/// recommendation provider, and starts the Actix-Web HTTP server. This is a
/// regular async function; the caller is responsible for providing the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the configuration is invalid, the
/// database cannot be opened, or the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(options: ServerOptions) -> std::io::Result<()> {
    let config_path = options
        .config_path
        .or_else(|| std::env::var_os("ENVIROLENS_CONFIG").map(PathBuf::from));
    let config = EnvirolensConfig::load(config_path.as_deref()).map_err(std::io::Error::other)?;

    let db_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    log::info!("Opening database...");
    let db = envirolens_database::open_db(Path::new(&db_path))
        .await
        .map_err(std::io::Error::other)?;

    let state = web::Data::new(
        AppState::new(
            &config,
            Arc::from(db),
            Arc::new(SimulatedSource::new()),
            select_recommender(&config, options.no_ai),
        )
        .map_err(std::io::Error::other)?,
    );

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

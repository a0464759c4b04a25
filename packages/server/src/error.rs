//! Handler error type and its HTTP mapping.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use envirolens_database::DbError;
use envirolens_reading_models::InvalidCoordinateError;
use envirolens_server_models::ApiErrorBody;

/// Errors returned by the API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A path coordinate was not a finite number.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] InvalidCoordinateError),

    /// At least one category had no readings in the lookback window.
    #[error("Insufficient data")]
    InsufficientData,

    /// No alert exists with the given id.
    #[error("Alert {0} not found")]
    AlertNotFound(i64),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCoordinate(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientData | Self::AlertNotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            Self::Database(e) => {
                log::error!("Database error: {e}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ApiErrorBody { error })
    }
}

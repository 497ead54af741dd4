use crate::config::ConfigError;
use crate::estimation::{BaremeError, CatalogError, EstimationError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Errors raised by the processes that embed the engine.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Catalog(CatalogError),
    Bareme(BaremeError),
    Estimation(EstimationError),
    Input(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Bareme(err) => write!(f, "barème error: {}", err),
            AppError::Estimation(err) => write!(f, "estimation error: {}", err),
            AppError::Input(err) => write!(f, "invalid request: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Bareme(err) => Some(err),
            AppError::Estimation(err) => Some(err),
            AppError::Input(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Estimation(EstimationError::InvalidTransition { .. }) => {
                StatusCode::CONFLICT
            }
            AppError::Estimation(err) if err.is_caller_error() => StatusCode::BAD_REQUEST,
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Catalog(_)
            | AppError::Bareme(_)
            | AppError::Estimation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal failures never leak their detail to families.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "estimate unavailable".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<BaremeError> for AppError {
    fn from(value: BaremeError) -> Self {
        Self::Bareme(value)
    }
}

impl From<EstimationError> for AppError {
    fn from(value: EstimationError) -> Self {
        Self::Estimation(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Input(value)
    }
}

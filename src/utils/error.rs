use crate::domain::model::{ErrorBody, PriceQuote};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use std::time::Duration;
use thiserror::Error;

/// Failure of the single outbound call to the price API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Upstream did not answer within {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("Upstream replied with HTTP {status}")]
    Status { status: u16 },

    #[error("Upstream returned a malformed body: {reason}")]
    Malformed { reason: String },
}

impl UpstreamError {
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Unavailable { .. } => "upstream_unavailable",
            UpstreamError::Timeout { .. } => "upstream_timeout",
            UpstreamError::Status { .. } => "upstream_status",
            UpstreamError::Malformed { .. } => "upstream_malformed",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

pub type UpstreamResult = std::result::Result<PriceQuote, UpstreamError>;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("No route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RelayError {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Upstream(e) => e.kind(),
            RelayError::RouteNotFound { .. } => "route_not_found",
            RelayError::ConfigError { .. }
            | RelayError::InvalidConfigValueError { .. } => "config_invalid",
            RelayError::IoError(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Upstream(e) => e.status_code(),
            RelayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let upstream_status = match self {
            RelayError::Upstream(UpstreamError::Status { status }) => Some(*status),
            _ => None,
        };

        ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            upstream_status,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self.body())).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));
        response
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

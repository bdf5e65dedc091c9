//! Error types for the presence server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable error codes returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    InvalidDevice,
    InvalidAdminCode,
    MockLocationDetected,
    OutsideGeofence,
    NotFound,
    EmployeeNotFound,
    NoCheckIn,
    AlreadyCheckedIn,
    AlreadyCheckedOut,
    FutureTimestamp,
    InvalidTimestamp,
    Timeout,
    Unavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InvalidDevice => "INVALID_DEVICE",
            ErrorCode::InvalidAdminCode => "INVALID_ADMIN_CODE",
            ErrorCode::MockLocationDetected => "MOCK_LOCATION_DETECTED",
            ErrorCode::OutsideGeofence => "OUTSIDE_GEOFENCE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::EmployeeNotFound => "EMPLOYEE_NOT_FOUND",
            ErrorCode::NoCheckIn => "NO_CHECK_IN",
            ErrorCode::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            ErrorCode::AlreadyCheckedOut => "ALREADY_CHECKED_OUT",
            ErrorCode::FutureTimestamp => "FUTURE_TIMESTAMP",
            ErrorCode::InvalidTimestamp => "INVALID_TIMESTAMP",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Kiosk device is not registered or inactive: {0}")]
    InvalidDevice(String),

    #[error("Invalid admin code")]
    Unauthorized,

    #[error("Mock location detected")]
    MockLocationDetected,

    #[error("Outside geofence: {distance_m:.1}m from office, allowed {allowed_radius_m:.1}m")]
    GeofenceViolation {
        distance_m: f64,
        allowed_radius_m: f64,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Employee not found: {0}")]
    UnknownEmployee(String),

    #[error("No check-in found for {0}")]
    NoCheckInFound(String),

    #[error("Already checked in on {0}")]
    AlreadyCheckedIn(String),

    #[error("Already checked out on {0}")]
    AlreadyCheckedOut(String),

    #[error("Future timestamp rejected: {0}")]
    FutureTimestamp(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Storage did not respond within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::Authentication(_) => ErrorCode::Unauthorized,
            AppError::Authorization(_) => ErrorCode::Forbidden,
            AppError::InvalidDevice(_) => ErrorCode::InvalidDevice,
            AppError::Unauthorized => ErrorCode::InvalidAdminCode,
            AppError::MockLocationDetected => ErrorCode::MockLocationDetected,
            AppError::GeofenceViolation { .. } => ErrorCode::OutsideGeofence,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::UnknownEmployee(_) => ErrorCode::EmployeeNotFound,
            AppError::NoCheckInFound(_) => ErrorCode::NoCheckIn,
            AppError::AlreadyCheckedIn(_) => ErrorCode::AlreadyCheckedIn,
            AppError::AlreadyCheckedOut(_) => ErrorCode::AlreadyCheckedOut,
            AppError::FutureTimestamp(_) => ErrorCode::FutureTimestamp,
            AppError::InvalidTimestamp(_) => ErrorCode::InvalidTimestamp,
            AppError::Timeout(_) => ErrorCode::Timeout,
            AppError::Unavailable(_) | AppError::Database(_) => ErrorCode::Unavailable,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) | AppError::InvalidDevice(_) | AppError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Authorization(_)
            | AppError::MockLocationDetected
            | AppError::GeofenceViolation { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::UnknownEmployee(_) | AppError::NoCheckInFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::AlreadyCheckedIn(_) | AppError::AlreadyCheckedOut(_) => StatusCode::CONFLICT,
            AppError::FutureTimestamp(_) | AppError::InvalidTimestamp(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Unavailable(_) | AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Transient failures that did not mutate state; the client may retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_) | AppError::Unavailable(_) | AppError::Database(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
    pub message: String,
    /// Distance from the office anchor in meters (OUTSIDE_GEOFENCE only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Allowed radius in meters (OUTSIDE_GEOFENCE only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_radius: Option<f64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Timeout(_) | AppError::Unavailable(_) => {
                tracing::warn!("Transient storage failure: {}", self);
                self.to_string()
            }
            other => other.to_string(),
        };

        let (distance, allowed_radius) = match &self {
            AppError::GeofenceViolation {
                distance_m,
                allowed_radius_m,
            } => (Some(*distance_m), Some(*allowed_radius_m)),
            _ => (None, None),
        };

        let code = self.code();
        let body = Json(ErrorResponse {
            code: code.as_str().to_string(),
            error: format!("{:?}", code),
            message,
            distance,
            allowed_radius,
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

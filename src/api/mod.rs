//! HTTP surface: REST handlers, websocket feed and API docs

pub mod attendance;
pub mod health;
pub mod kiosk;
pub mod openapi;
pub mod ws;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Authentication("Invalid authorization header format".to_string())
        })?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Employee attendance
        .route("/attendance/check-in", post(attendance::check_in))
        .route("/attendance/check-out", post(attendance::check_out))
        .route("/attendance/today", get(attendance::today))
        .route("/attendance/history", get(attendance::history))
        // Admin / HR
        .route("/admin/attendance/today", get(attendance::today_overview))
        // Kiosk
        .route("/kiosk/check-in", post(kiosk::check_in))
        .route("/kiosk/check-out", post(kiosk::check_out))
        .route("/kiosk/status/:employee_id", get(kiosk::status))
        .route("/kiosk/offline-sync", post(kiosk::offline_sync))
        .with_state(state.clone());

    let realtime = Router::new()
        .route("/ws/dashboard", get(ws::dashboard))
        .route("/ws/stats", get(ws::stats))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(realtime)
        .merge(openapi::create_openapi_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

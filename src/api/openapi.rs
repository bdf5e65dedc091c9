//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{attendance, health, kiosk, ws};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presence API",
        version = "0.3.0",
        description = "Geofenced attendance, kiosk check-in and offline sync"
    ),
    servers(
        (url = "/api", description = "REST API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Attendance
        attendance::check_in,
        attendance::check_out,
        attendance::today,
        attendance::history,
        attendance::today_overview,
        // Kiosk
        kiosk::check_in,
        kiosk::check_out,
        kiosk::status,
        kiosk::offline_sync,
        // Realtime
        ws::stats,
    ),
    components(
        schemas(
            // Attendance
            crate::models::attendance::AttendanceRecord,
            crate::models::attendance::PunctualityStatus,
            crate::models::attendance::DayStatus,
            crate::models::attendance::CheckInRequest,
            crate::models::attendance::CheckOutRequest,
            crate::models::attendance::DailyOverview,
            attendance::AttendanceResponse,
            attendance::TodayResponse,
            // Kiosk
            crate::models::kiosk::KioskAttendanceRequest,
            crate::models::kiosk::KioskStatusResponse,
            crate::models::kiosk::OfflineRecordType,
            crate::models::kiosk::OfflineRecord,
            crate::models::kiosk::OfflineSyncBatch,
            crate::models::kiosk::SyncRecordError,
            crate::models::kiosk::SyncSummary,
            // Realtime
            crate::services::hub::HubStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "attendance", description = "Employee check-in and check-out"),
        (name = "kiosk", description = "Kiosk check-in, status and offline sync"),
        (name = "realtime", description = "Live dashboard feed")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

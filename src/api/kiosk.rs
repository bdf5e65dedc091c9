//! Kiosk endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::kiosk::{KioskAttendanceRequest, KioskStatusResponse, OfflineSyncBatch, SyncSummary},
    AppState,
};

use super::attendance::AttendanceResponse;

/// Check an employee in at a kiosk
#[utoipa::path(
    post,
    path = "/kiosk/check-in",
    tag = "kiosk",
    request_body = KioskAttendanceRequest,
    responses(
        (status = 201, description = "Checked in", body = AttendanceResponse),
        (status = 401, description = "Kiosk not registered or inactive", body = crate::error::ErrorResponse),
        (status = 404, description = "Employee not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already checked in today", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    payload: Result<Json<KioskAttendanceRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AttendanceResponse>)> {
    let Json(request) = payload?;
    let record = state.services.kiosk.check_in(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(AttendanceResponse {
            message: "Check-in recorded".to_string(),
            is_late: record.is_late,
            attendance: record,
        }),
    ))
}

/// Check an employee out at a kiosk
#[utoipa::path(
    post,
    path = "/kiosk/check-out",
    tag = "kiosk",
    request_body = KioskAttendanceRequest,
    responses(
        (status = 200, description = "Checked out", body = AttendanceResponse),
        (status = 401, description = "Kiosk not registered or inactive", body = crate::error::ErrorResponse),
        (status = 404, description = "Employee or check-in not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already checked out today", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_out(
    State(state): State<AppState>,
    payload: Result<Json<KioskAttendanceRequest>, JsonRejection>,
) -> AppResult<Json<AttendanceResponse>> {
    let Json(request) = payload?;
    let record = state.services.kiosk.check_out(request).await?;

    Ok(Json(AttendanceResponse {
        message: "Check-out recorded".to_string(),
        is_late: record.is_late,
        attendance: record,
    }))
}

/// Today's status for an employee
#[utoipa::path(
    get,
    path = "/kiosk/status/{employee_id}",
    tag = "kiosk",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Today's status", body = KioskStatusResponse),
        (status = 404, description = "Employee not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn status(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<Json<KioskStatusResponse>> {
    let status = state.services.kiosk.status(&employee_id).await?;
    Ok(Json(status))
}

/// Replay events a kiosk buffered while offline
#[utoipa::path(
    post,
    path = "/kiosk/offline-sync",
    tag = "kiosk",
    request_body = OfflineSyncBatch,
    responses(
        (status = 200, description = "Batch processed; per-record failures listed", body = SyncSummary),
        (status = 401, description = "Invalid admin code or kiosk", body = crate::error::ErrorResponse)
    )
)]
pub async fn offline_sync(
    State(state): State<AppState>,
    payload: Result<Json<OfflineSyncBatch>, JsonRejection>,
) -> AppResult<Json<SyncSummary>> {
    let Json(batch) = payload?;
    let summary = state.services.offline_sync.sync(batch).await?;
    Ok(Json(summary))
}

//! Employee attendance endpoints

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    geofence::GeoPoint,
    models::attendance::{
        day_status, AttendanceRecord, CheckInRequest, CheckOutRequest, DailyOverview, DayStatus,
        HistoryQuery,
    },
    services::attendance::{CheckIn, CheckOut, Origin},
    AppState,
};

use super::AuthenticatedUser;

/// Result of a check-in or check-out
#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub message: String,
    pub is_late: bool,
    pub attendance: AttendanceRecord,
}

/// Today's attendance for the caller
#[derive(Serialize, ToSchema)]
pub struct TodayResponse {
    pub status: DayStatus,
    pub attendance: Option<AttendanceRecord>,
}

/// Check in from the employee's device
#[utoipa::path(
    post,
    path = "/attendance/check-in",
    tag = "attendance",
    security(("bearer_auth" = [])),
    request_body = CheckInRequest,
    responses(
        (status = 201, description = "Checked in", body = AttendanceResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Mock location or outside geofence", body = crate::error::ErrorResponse),
        (status = 409, description = "Already checked in today", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: Result<Json<CheckInRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AttendanceResponse>)> {
    let Json(request) = payload?;
    request.validate()?;

    let attendance = &state.services.attendance;
    let record = attendance
        .check_in_as(
            claims.user_id()?,
            CheckIn {
                time: attendance.now(),
                location: GeoPoint::new(request.latitude, request.longitude),
                device_info: request.device_info,
                is_mock_location: request.is_mock_location,
                notes: String::new(),
                origin: Origin::Employee,
            },
        )
        .await?;

    let message = if record.is_late {
        "Check-in recorded (late)"
    } else {
        "Check-in recorded"
    };
    Ok((
        StatusCode::CREATED,
        Json(AttendanceResponse {
            message: message.to_string(),
            is_late: record.is_late,
            attendance: record,
        }),
    ))
}

/// Check out from the employee's device
#[utoipa::path(
    post,
    path = "/attendance/check-out",
    tag = "attendance",
    security(("bearer_auth" = [])),
    request_body = CheckOutRequest,
    responses(
        (status = 200, description = "Checked out", body = AttendanceResponse),
        (status = 404, description = "No check-in today", body = crate::error::ErrorResponse),
        (status = 409, description = "Already checked out today", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_out(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: Result<Json<CheckOutRequest>, JsonRejection>,
) -> AppResult<Json<AttendanceResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let attendance = &state.services.attendance;
    let record = attendance
        .check_out_as(
            claims.user_id()?,
            CheckOut {
                time: attendance.now(),
                location: GeoPoint::new(request.latitude, request.longitude),
                note: None,
                origin: Origin::Employee,
            },
        )
        .await?;

    Ok(Json(AttendanceResponse {
        message: "Check-out recorded".to_string(),
        is_late: record.is_late,
        attendance: record,
    }))
}

/// Today's status
#[utoipa::path(
    get,
    path = "/attendance/today",
    tag = "attendance",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Today's attendance", body = TodayResponse)
    )
)]
pub async fn today(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<TodayResponse>> {
    let attendance = state
        .services
        .attendance
        .today_record(claims.user_id()?)
        .await?;

    Ok(Json(TodayResponse {
        status: day_status(attendance.as_ref()),
        attendance,
    }))
}

/// Attendance history, newest first
#[utoipa::path(
    get,
    path = "/attendance/history",
    tag = "attendance",
    security(("bearer_auth" = [])),
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance history", body = Vec<AttendanceRecord>)
    )
)]
pub async fn history(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<AttendanceRecord>>> {
    let records = state
        .services
        .attendance
        .history(claims.user_id()?, &query)
        .await?;
    Ok(Json(records))
}

/// Everyone's attendance today (admin and HR)
#[utoipa::path(
    get,
    path = "/admin/attendance/today",
    tag = "attendance",
    security(("bearer_auth" = [])),
    params(HistoryQuery),
    responses(
        (status = 200, description = "Today's attendance across the organization", body = DailyOverview),
        (status = 403, description = "Admin or HR role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn today_overview(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<DailyOverview>> {
    claims.require_staff()?;
    let overview = state.services.attendance.day_overview(&query).await?;
    Ok(Json(overview))
}

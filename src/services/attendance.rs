//! Attendance state machine
//!
//! One record per (user, local day): `NotCheckedIn -> CheckedIn -> CheckedOut`.
//! Uniqueness and the single check-out transition are enforced atomically
//! by the store; this service decides lateness, guards the geofence and
//! announces successful transitions on the broadcast hub.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    config::WorkSchedule,
    error::{AppError, AppResult},
    geofence::{self, GeoPoint},
    models::{
        attendance::{CheckOutUpdate, DailyOverview, HistoryQuery, NewCheckIn},
        AttendanceEvent, AttendanceRecord, BroadcastEvent, PunctualityStatus, UserLocationProfile,
    },
    repository::Repository,
};

use super::{hub::HubHandle, with_deadline, Clock};

/// Where an attendance transition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Employee's own device; location must be inside the geofence
    Employee,
    /// Paired kiosk standing at the office
    Kiosk,
    /// Replay of a kiosk's offline buffer; announced once per batch instead
    OfflineKiosk,
}

impl Origin {
    fn checks_geofence(self) -> bool {
        self == Origin::Employee
    }

    fn announces(self) -> bool {
        self != Origin::OfflineKiosk
    }
}

#[derive(Debug, Clone)]
pub struct CheckIn {
    pub time: DateTime<Utc>,
    pub location: GeoPoint,
    pub device_info: String,
    pub is_mock_location: bool,
    pub notes: String,
    pub origin: Origin,
}

#[derive(Debug, Clone)]
pub struct CheckOut {
    pub time: DateTime<Utc>,
    pub location: GeoPoint,
    pub note: Option<String>,
    pub origin: Origin,
}

/// Tunables for the state machine, resolved from configuration
#[derive(Debug, Clone, Copy)]
pub struct AttendancePolicy {
    pub schedule: WorkSchedule,
    pub default_radius_m: f64,
    /// How far past "now" an event may be stamped
    pub future_skew: chrono::Duration,
    /// Deadline for each storage call
    pub deadline: Duration,
}

#[derive(Clone)]
pub struct AttendanceService {
    repository: Repository,
    hub: HubHandle,
    clock: Arc<dyn Clock>,
    policy: AttendancePolicy,
}

impl AttendanceService {
    pub fn new(
        repository: Repository,
        hub: HubHandle,
        clock: Arc<dyn Clock>,
        policy: AttendancePolicy,
    ) -> Self {
        Self {
            repository,
            hub,
            clock,
            policy,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.policy.schedule.local_date(self.clock.now())
    }

    pub fn future_skew(&self) -> chrono::Duration {
        self.policy.future_skew
    }

    /// Active profile for an authenticated user
    pub async fn resolve_user(&self, user_id: Uuid) -> AppResult<UserLocationProfile> {
        with_deadline(self.policy.deadline, self.repository.users.find_by_id(user_id))
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Active profile for an employee id presented at a kiosk
    pub async fn resolve_employee(&self, employee_id: &str) -> AppResult<UserLocationProfile> {
        with_deadline(
            self.policy.deadline,
            self.repository.users.find_by_employee_id(employee_id),
        )
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::UnknownEmployee(employee_id.to_string()))
    }

    /// Check in an authenticated employee. A mock location is rejected
    /// before the profile is looked up.
    pub async fn check_in_as(&self, user_id: Uuid, request: CheckIn) -> AppResult<AttendanceRecord> {
        reject_mock_location(user_id, &request)?;
        let user = self.resolve_user(user_id).await?;
        self.check_in(&user, request).await
    }

    pub async fn check_out_as(
        &self,
        user_id: Uuid,
        request: CheckOut,
    ) -> AppResult<AttendanceRecord> {
        let user = self.resolve_user(user_id).await?;
        self.check_out(&user, request).await
    }

    pub async fn check_in(
        &self,
        user: &UserLocationProfile,
        request: CheckIn,
    ) -> AppResult<AttendanceRecord> {
        reject_mock_location(user.id, &request)?;

        if request.origin.checks_geofence() {
            let radius = user.radius_or(self.policy.default_radius_m);
            let anchor = user.office_anchor();
            if !geofence::is_within_radius(anchor, request.location, radius) {
                return Err(AppError::GeofenceViolation {
                    distance_m: geofence::distance_meters(anchor, request.location),
                    allowed_radius_m: radius,
                });
            }
        }

        self.reject_future(request.time)?;

        let schedule = &self.policy.schedule;
        let work_date = schedule.local_date(request.time);
        let is_late = schedule.is_late(request.time);

        let record = with_deadline(
            self.policy.deadline,
            self.repository.attendance.insert_check_in(NewCheckIn {
                user_id: user.id,
                work_date,
                time: request.time,
                location: request.location,
                is_late,
                is_mock_location: request.is_mock_location,
                device_info: request.device_info,
                notes: request.notes,
            }),
        )
        .await?;

        tracing::info!(
            user_id = %user.id,
            employee_id = %user.employee_id,
            %work_date,
            is_late,
            origin = ?request.origin,
            "Checked in"
        );

        if request.origin.announces() {
            self.hub
                .publish(BroadcastEvent::check_in(event("check_in", user, &record, request.time)));
        }
        Ok(record)
    }

    pub async fn check_out(
        &self,
        user: &UserLocationProfile,
        request: CheckOut,
    ) -> AppResult<AttendanceRecord> {
        self.reject_future(request.time)?;

        let schedule = &self.policy.schedule;
        let work_date = schedule.local_date(request.time);
        let status = if schedule.is_early_leave(request.time) {
            PunctualityStatus::EarlyLeave
        } else {
            PunctualityStatus::OnTime
        };

        let record = with_deadline(
            self.policy.deadline,
            self.repository.attendance.record_check_out(CheckOutUpdate {
                user_id: user.id,
                work_date,
                time: request.time,
                location: request.location,
                status,
                note: request.note,
            }),
        )
        .await?;

        tracing::info!(
            user_id = %user.id,
            employee_id = %user.employee_id,
            %work_date,
            status = %status,
            origin = ?request.origin,
            "Checked out"
        );

        if request.origin.announces() {
            self.hub
                .publish(BroadcastEvent::check_out(event("check_out", user, &record, request.time)));
        }
        Ok(record)
    }

    /// Today's record (local day), if any
    pub async fn today_record(&self, user_id: Uuid) -> AppResult<Option<AttendanceRecord>> {
        let today = self.today();
        with_deadline(
            self.policy.deadline,
            self.repository.attendance.find_by_user_and_day(user_id, today),
        )
        .await
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        query: &HistoryQuery,
    ) -> AppResult<Vec<AttendanceRecord>> {
        with_deadline(
            self.policy.deadline,
            self.repository
                .attendance
                .history(user_id, query.limit(), query.offset()),
        )
        .await
    }

    /// All records of the current local day, for admin dashboards
    pub async fn day_overview(&self, page: &HistoryQuery) -> AppResult<DailyOverview> {
        let today = self.today();
        let records = with_deadline(
            self.policy.deadline,
            self.repository.attendance.list_by_day(today),
        )
        .await?;
        Ok(DailyOverview::paged(today, records, page))
    }

    /// Whether the attendance store answers within the deadline
    pub async fn storage_ready(&self) -> AppResult<()> {
        with_deadline(self.policy.deadline, self.repository.attendance.ping()).await
    }

    fn reject_future(&self, time: DateTime<Utc>) -> AppResult<()> {
        let limit = self.clock.now() + self.policy.future_skew;
        if time > limit {
            return Err(AppError::FutureTimestamp(time.to_rfc3339()));
        }
        Ok(())
    }
}

fn reject_mock_location(user_id: Uuid, request: &CheckIn) -> AppResult<()> {
    if request.is_mock_location {
        tracing::warn!(%user_id, origin = ?request.origin, "Rejected check-in with mock location");
        return Err(AppError::MockLocationDetected);
    }
    Ok(())
}

fn event(
    kind: &'static str,
    user: &UserLocationProfile,
    record: &AttendanceRecord,
    time: DateTime<Utc>,
) -> AttendanceEvent {
    AttendanceEvent {
        kind,
        user_id: user.id,
        user_name: user.name.clone(),
        employee_id: user.employee_id.clone(),
        time,
        is_late: record.is_late,
    }
}

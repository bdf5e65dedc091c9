//! Kiosk-initiated attendance

use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::day_status,
        kiosk::{KioskAttendanceRequest, KioskStatusResponse},
        AttendanceRecord, KioskDevice,
    },
    repository::Repository,
};

use super::{
    attendance::{AttendanceService, CheckIn, CheckOut, Origin},
    with_deadline, Clock,
};

#[derive(Clone)]
pub struct KioskService {
    repository: Repository,
    attendance: AttendanceService,
    clock: Arc<dyn Clock>,
    deadline: Duration,
}

impl KioskService {
    pub fn new(
        repository: Repository,
        attendance: AttendanceService,
        clock: Arc<dyn Clock>,
        deadline: Duration,
    ) -> Self {
        Self {
            repository,
            attendance,
            clock,
            deadline,
        }
    }

    /// Verify the kiosk is registered and active, then record a heartbeat
    pub async fn authenticate(&self, kiosk_id: &str) -> AppResult<KioskDevice> {
        let kiosk = with_deadline(self.deadline, self.repository.kiosks.find_by_kiosk_id(kiosk_id))
            .await?
            .filter(|k| k.is_active)
            .ok_or_else(|| AppError::InvalidDevice(kiosk_id.to_string()))?;

        self.heartbeat(kiosk_id).await;
        Ok(kiosk)
    }

    /// Best effort; a failed heartbeat never fails the kiosk's request
    async fn heartbeat(&self, kiosk_id: &str) {
        let now = self.clock.now();
        if let Err(e) = with_deadline(
            self.deadline,
            self.repository.kiosks.touch_last_seen(kiosk_id, now),
        )
        .await
        {
            tracing::warn!(kiosk_id, error = %e, "Failed to update kiosk heartbeat");
        }
    }

    pub async fn check_in(&self, request: KioskAttendanceRequest) -> AppResult<AttendanceRecord> {
        let kiosk = self.authenticate(&request.kiosk_id).await?;
        let user = self.attendance.resolve_employee(&request.employee_id).await?;

        self.attendance
            .check_in(
                &user,
                CheckIn {
                    time: self.clock.now(),
                    location: kiosk.office_anchor(),
                    device_info: format!("Kiosk: {}", kiosk.kiosk_id),
                    is_mock_location: false,
                    notes: String::new(),
                    origin: Origin::Kiosk,
                },
            )
            .await
    }

    pub async fn check_out(&self, request: KioskAttendanceRequest) -> AppResult<AttendanceRecord> {
        let kiosk = self.authenticate(&request.kiosk_id).await?;
        let user = self.attendance.resolve_employee(&request.employee_id).await?;

        self.attendance
            .check_out(
                &user,
                CheckOut {
                    time: self.clock.now(),
                    location: kiosk.office_anchor(),
                    note: None,
                    origin: Origin::Kiosk,
                },
            )
            .await
    }

    /// Today's status for an employee, as shown on the kiosk screen
    pub async fn status(&self, employee_id: &str) -> AppResult<KioskStatusResponse> {
        let user = self.attendance.resolve_employee(employee_id).await?;
        let attendance = self.attendance.today_record(user.id).await?;

        Ok(KioskStatusResponse {
            employee_id: user.employee_id,
            name: user.name,
            status: day_status(attendance.as_ref()),
            attendance,
        })
    }
}

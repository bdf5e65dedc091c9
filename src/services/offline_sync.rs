//! Offline batch reconciliation
//!
//! Replays a kiosk's buffered events through the attendance state machine
//! strictly in submission order. Failures are per record; the batch as a
//! whole only fails on a bad admin code or an unknown kiosk.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    config::KioskConfig,
    error::{AppError, AppResult},
    models::{
        kiosk::{OfflineRecordType, SyncRecordError},
        BroadcastEvent, KioskDevice, OfflineRecord, OfflineSyncBatch, SyncSummary,
    },
};

use super::{
    attendance::{AttendanceService, CheckIn, CheckOut, Origin},
    hub::HubHandle,
    kiosk::KioskService,
    Clock,
};

#[derive(Clone)]
pub struct OfflineSyncService {
    kiosk: KioskService,
    attendance: AttendanceService,
    hub: HubHandle,
    clock: Arc<dyn Clock>,
    config: KioskConfig,
}

impl OfflineSyncService {
    pub fn new(
        kiosk: KioskService,
        attendance: AttendanceService,
        hub: HubHandle,
        clock: Arc<dyn Clock>,
        config: KioskConfig,
    ) -> Self {
        Self {
            kiosk,
            attendance,
            hub,
            clock,
            config,
        }
    }

    pub async fn sync(&self, batch: OfflineSyncBatch) -> AppResult<SyncSummary> {
        if batch.admin_code != self.config.admin_code {
            tracing::warn!(kiosk_id = %batch.kiosk_id, "Offline sync rejected: invalid admin code");
            return Err(AppError::Unauthorized);
        }
        let kiosk = self.kiosk.authenticate(&batch.kiosk_id).await?;

        let total = batch.records.len();
        let mut synced = 0;
        let mut errors = Vec::new();

        for (position, record) in batch.records.iter().enumerate() {
            match self.apply(&kiosk, record).await {
                Ok(()) => synced += 1,
                Err(e) => {
                    tracing::debug!(
                        kiosk_id = %kiosk.kiosk_id,
                        index = position + 1,
                        error = %e,
                        "Offline record rejected"
                    );
                    errors.push(SyncRecordError {
                        index: position + 1,
                        employee_id: record.employee_id.clone(),
                        code: e.code().as_str().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            kiosk_id = %kiosk.kiosk_id,
            total,
            synced,
            failed = errors.len(),
            "Offline sync completed"
        );

        if synced > 0 {
            self.hub
                .publish(BroadcastEvent::kiosk_sync(&kiosk.kiosk_id, synced));
        }

        Ok(SyncSummary {
            success: true,
            message: format!("Sync completed: {} of {} records applied", synced, total),
            synced,
            errors,
        })
    }

    async fn apply(&self, kiosk: &KioskDevice, record: &OfflineRecord) -> AppResult<()> {
        let time = DateTime::parse_from_rfc3339(&record.timestamp)
            .map_err(|_| AppError::InvalidTimestamp(record.timestamp.clone()))?
            .with_timezone(&Utc);

        // Bounds clock drift on devices that were offline
        let skew = chrono::Duration::seconds(self.config.future_skew_secs);
        if time > self.clock.now() + skew {
            return Err(AppError::FutureTimestamp(record.timestamp.clone()));
        }

        let user = self.attendance.resolve_employee(&record.employee_id).await?;

        match record.record_type {
            OfflineRecordType::CheckIn => {
                self.attendance
                    .check_in(
                        &user,
                        CheckIn {
                            time,
                            location: kiosk.office_anchor(),
                            device_info: format!("Kiosk (offline): {}", kiosk.kiosk_id),
                            is_mock_location: false,
                            notes: format!(
                                "Offline sync | Confidence: {:.2}%",
                                record.confidence * 100.0
                            ),
                            origin: Origin::OfflineKiosk,
                        },
                    )
                    .await?;
            }
            OfflineRecordType::CheckOut => {
                self.attendance
                    .check_out(
                        &user,
                        CheckOut {
                            time,
                            location: kiosk.office_anchor(),
                            note: Some("Check-out synced offline".to_string()),
                            origin: Origin::OfflineKiosk,
                        },
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

//! Kiosk devices and offline synchronization payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{geofence::GeoPoint, models::attendance::{AttendanceRecord, DayStatus}};

/// A registered kiosk device
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct KioskDevice {
    pub id: Uuid,
    /// Stable device identifier sent by the kiosk
    pub kiosk_id: String,
    pub name: String,
    /// Office anchor inherited from the assigned office
    pub office_lat: f64,
    pub office_long: f64,
    pub is_active: bool,
    pub is_paired: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl KioskDevice {
    pub fn office_anchor(&self) -> GeoPoint {
        GeoPoint::new(self.office_lat, self.office_long)
    }
}

/// Kiosk check-in / check-out request
#[derive(Debug, Deserialize, ToSchema)]
pub struct KioskAttendanceRequest {
    pub employee_id: String,
    pub kiosk_id: String,
}

/// Kind of buffered offline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OfflineRecordType {
    #[serde(rename = "check-in")]
    CheckIn,
    #[serde(rename = "check-out")]
    CheckOut,
}

/// One event recorded by a kiosk while disconnected
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfflineRecord {
    pub employee_id: String,
    #[serde(rename = "type")]
    pub record_type: OfflineRecordType,
    /// RFC 3339 timestamp taken on the kiosk
    pub timestamp: String,
    /// Face match confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,
}

/// Batch of offline events submitted in one call
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfflineSyncBatch {
    pub kiosk_id: String,
    pub admin_code: String,
    pub records: Vec<OfflineRecord>,
}

/// Failure of a single batch record
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SyncRecordError {
    /// 1-based position of the record in the submitted batch
    pub index: usize,
    pub employee_id: String,
    /// Machine-readable reason (e.g. ALREADY_CHECKED_IN)
    pub code: String,
    pub reason: String,
}

/// Outcome of an offline sync
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SyncSummary {
    pub success: bool,
    pub message: String,
    pub synced: usize,
    pub errors: Vec<SyncRecordError>,
}

/// Today's status for an employee as seen from a kiosk
#[derive(Debug, Serialize, ToSchema)]
pub struct KioskStatusResponse {
    pub employee_id: String,
    pub name: String,
    pub status: DayStatus,
    pub attendance: Option<AttendanceRecord>,
}

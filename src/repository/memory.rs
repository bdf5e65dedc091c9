//! In-memory persistence for tests and local demos
//!
//! A single mutex guards all maps, so create-if-absent and conditional
//! check-out are atomic exactly like the database constraints they mirror.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{AttendanceRecord, CheckOutUpdate, NewCheckIn},
        KioskDevice, PunctualityStatus, UserLocationProfile,
    },
};

use super::{AttendanceStore, KioskRegistry, UserDirectory};

#[derive(Default)]
struct State {
    attendance: HashMap<(Uuid, NaiveDate), AttendanceRecord>,
    users: HashMap<Uuid, UserLocationProfile>,
    kiosks: HashMap<String, KioskDevice>,
}

/// Users and kiosks loaded into a fresh in-memory store
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<UserLocationProfile>,
    #[serde(default)]
    pub kiosks: Vec<KioskDevice>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        for user in seed.users {
            store.add_user(user);
        }
        for kiosk in seed.kiosks {
            store.add_kiosk(kiosk);
        }
        store
    }

    /// Load seed data from a JSON file
    pub fn from_seed_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Internal(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        let seed: SeedData = serde_json::from_str(&raw).map_err(|e| {
            AppError::Internal(format!("Invalid seed file {}: {}", path.display(), e))
        })?;
        Ok(Self::from_seed(seed))
    }

    pub fn add_user(&self, user: UserLocationProfile) {
        self.lock().users.insert(user.id, user);
    }

    pub fn add_kiosk(&self, kiosk: KioskDevice) {
        self.lock().kiosks.insert(kiosk.kiosk_id.clone(), kiosk);
    }

    pub fn attendance_count(&self) -> usize {
        self.lock().attendance.len()
    }

    pub fn kiosk(&self, kiosk_id: &str) -> Option<KioskDevice> {
        self.lock().kiosks.get(kiosk_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave a half-written record
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_by_user_and_day(
        &self,
        user_id: Uuid,
        work_date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        Ok(self.lock().attendance.get(&(user_id, work_date)).cloned())
    }

    async fn insert_check_in(&self, check_in: NewCheckIn) -> AppResult<AttendanceRecord> {
        let mut state = self.lock();
        let key = (check_in.user_id, check_in.work_date);
        if state.attendance.contains_key(&key) {
            return Err(AppError::AlreadyCheckedIn(check_in.work_date.to_string()));
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            user_id: check_in.user_id,
            work_date: check_in.work_date,
            check_in_time: Some(check_in.time),
            check_out_time: None,
            check_in_lat: Some(check_in.location.latitude),
            check_in_long: Some(check_in.location.longitude),
            check_out_lat: None,
            check_out_long: None,
            is_late: check_in.is_late,
            check_in_status: if check_in.is_late {
                PunctualityStatus::Late
            } else {
                PunctualityStatus::OnTime
            },
            check_out_status: None,
            is_mock_location: check_in.is_mock_location,
            device_info: check_in.device_info,
            notes: check_in.notes,
            created_at: Utc::now(),
        };
        state.attendance.insert(key, record.clone());
        Ok(record)
    }

    async fn record_check_out(&self, update: CheckOutUpdate) -> AppResult<AttendanceRecord> {
        let mut state = self.lock();
        let day = update.work_date.to_string();
        let record = state
            .attendance
            .get_mut(&(update.user_id, update.work_date))
            .ok_or_else(|| AppError::NoCheckInFound(day.clone()))?;

        let check_in_time = record
            .check_in_time
            .ok_or_else(|| AppError::NoCheckInFound(day.clone()))?;
        if record.check_out_time.is_some() {
            return Err(AppError::AlreadyCheckedOut(day));
        }
        if update.time < check_in_time {
            return Err(AppError::Validation(
                "Check-out cannot precede check-in".to_string(),
            ));
        }

        record.check_out_time = Some(update.time);
        record.check_out_lat = Some(update.location.latitude);
        record.check_out_long = Some(update.location.longitude);
        record.check_out_status = Some(update.status);
        if let Some(note) = update.note {
            if record.notes.is_empty() {
                record.notes = note;
            } else {
                record.notes = format!("{} | {}", record.notes, note);
            }
        }
        Ok(record.clone())
    }

    async fn history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let state = self.lock();
        let mut rows: Vec<AttendanceRecord> = state
            .attendance
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.work_date.cmp(&a.work_date));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_by_day(&self, work_date: NaiveDate) -> AppResult<Vec<AttendanceRecord>> {
        let state = self.lock();
        let mut rows: Vec<AttendanceRecord> = state
            .attendance
            .values()
            .filter(|r| r.work_date == work_date)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.check_in_time, r.id));
        Ok(rows)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<UserLocationProfile>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn find_by_employee_id(
        &self,
        employee_id: &str,
    ) -> AppResult<Option<UserLocationProfile>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.employee_id == employee_id)
            .cloned())
    }
}

#[async_trait]
impl KioskRegistry for MemoryStore {
    async fn find_by_kiosk_id(&self, kiosk_id: &str) -> AppResult<Option<KioskDevice>> {
        Ok(self.lock().kiosks.get(kiosk_id).cloned())
    }

    async fn touch_last_seen(&self, kiosk_id: &str, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(kiosk) = self.lock().kiosks.get_mut(kiosk_id) {
            kiosk.last_seen = Some(at);
        }
        Ok(())
    }
}

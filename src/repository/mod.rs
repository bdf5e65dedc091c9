//! Repository layer for attendance persistence
//!
//! The datastore is an external collaborator. Services talk to it through
//! the traits below so the same state machine runs on PostgreSQL in
//! production and on the in-memory backend in tests and demos.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        attendance::{AttendanceRecord, CheckOutUpdate, NewCheckIn},
        KioskDevice, UserLocationProfile,
    },
};

/// Attendance records keyed by (user, local day)
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_by_user_and_day(
        &self,
        user_id: Uuid,
        work_date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>>;

    /// Create the day's record. Must be atomic create-if-absent: a second
    /// insert for the same (user, day) fails with `AlreadyCheckedIn`.
    async fn insert_check_in(&self, check_in: NewCheckIn) -> AppResult<AttendanceRecord>;

    /// Set check-out fields only if the record is checked in and not yet
    /// checked out; otherwise `NoCheckInFound` / `AlreadyCheckedOut`.
    async fn record_check_out(&self, update: CheckOutUpdate) -> AppResult<AttendanceRecord>;

    /// Newest first
    async fn history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<AttendanceRecord>>;

    /// Every user's record for one local day, earliest check-in first
    async fn list_by_day(&self, work_date: NaiveDate) -> AppResult<Vec<AttendanceRecord>>;

    /// Fails when the backing store cannot serve requests
    async fn ping(&self) -> AppResult<()>;
}

/// Read-only view of employee identities
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<UserLocationProfile>>;

    async fn find_by_employee_id(&self, employee_id: &str)
        -> AppResult<Option<UserLocationProfile>>;
}

/// Registered kiosk devices
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KioskRegistry: Send + Sync {
    async fn find_by_kiosk_id(&self, kiosk_id: &str) -> AppResult<Option<KioskDevice>>;

    async fn touch_last_seen(&self, kiosk_id: &str, at: DateTime<Utc>) -> AppResult<()>;
}

/// Main repository struct holding the persistence collaborators
#[derive(Clone)]
pub struct Repository {
    pub attendance: Arc<dyn AttendanceStore>,
    pub users: Arc<dyn UserDirectory>,
    pub kiosks: Arc<dyn KioskRegistry>,
}

impl Repository {
    /// PostgreSQL-backed repository
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            attendance: Arc::new(postgres::PgAttendanceStore::new(pool.clone())),
            users: Arc::new(postgres::PgUserDirectory::new(pool.clone())),
            kiosks: Arc::new(postgres::PgKioskRegistry::new(pool)),
        }
    }

    /// Repository over a shared in-memory store
    pub fn in_memory(store: memory::MemoryStore) -> Self {
        Self {
            attendance: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            kiosks: Arc::new(store),
        }
    }
}

//! PostgreSQL persistence
//!
//! Uniqueness of (user_id, work_date) is enforced by the `attendances`
//! table constraint; concurrent check-ins race on the insert, not on a
//! prior read.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{AttendanceRecord, CheckOutUpdate, NewCheckIn},
        KioskDevice, UserLocationProfile,
    },
};

use super::{AttendanceStore, KioskRegistry, UserDirectory};

#[derive(Clone)]
pub struct PgAttendanceStore {
    pool: Pool<Postgres>,
}

impl PgAttendanceStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    async fn find_by_user_and_day(
        &self,
        user_id: Uuid,
        work_date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendances WHERE user_id = $1 AND work_date = $2",
        )
        .bind(user_id)
        .bind(work_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_check_in(&self, check_in: NewCheckIn) -> AppResult<AttendanceRecord> {
        let status = if check_in.is_late {
            crate::models::PunctualityStatus::Late
        } else {
            crate::models::PunctualityStatus::OnTime
        };

        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO attendances (
                id, user_id, work_date, check_in_time, check_in_lat, check_in_long,
                is_late, check_in_status, is_mock_location, device_info, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, work_date) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(check_in.user_id)
        .bind(check_in.work_date)
        .bind(check_in.time)
        .bind(check_in.location.latitude)
        .bind(check_in.location.longitude)
        .bind(check_in.is_late)
        .bind(status)
        .bind(check_in.is_mock_location)
        .bind(&check_in.device_info)
        .bind(&check_in.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::AlreadyCheckedIn(check_in.work_date.to_string()))
    }

    async fn record_check_out(&self, update: CheckOutUpdate) -> AppResult<AttendanceRecord> {
        let updated = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            UPDATE attendances SET
                check_out_time = $3,
                check_out_lat = $4,
                check_out_long = $5,
                check_out_status = $6,
                notes = CASE
                    WHEN $7::text IS NULL THEN notes
                    WHEN notes = '' THEN $7::text
                    ELSE notes || ' | ' || $7::text
                END
            WHERE user_id = $1 AND work_date = $2
              AND check_in_time IS NOT NULL
              AND check_in_time <= $3
              AND check_out_time IS NULL
            RETURNING *
            "#,
        )
        .bind(update.user_id)
        .bind(update.work_date)
        .bind(update.time)
        .bind(update.location.latitude)
        .bind(update.location.longitude)
        .bind(update.status)
        .bind(&update.note)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = updated {
            return Ok(record);
        }

        // Nothing matched; report why
        let day = update.work_date.to_string();
        match self.find_by_user_and_day(update.user_id, update.work_date).await? {
            Some(existing) if existing.check_out_time.is_some() => Err(AppError::AlreadyCheckedOut(day)),
            Some(existing) if existing.check_in_time.is_some() => Err(AppError::Validation(
                "Check-out cannot precede check-in".to_string(),
            )),
            _ => Err(AppError::NoCheckInFound(day)),
        }
    }

    async fn history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendances WHERE user_id = $1 ORDER BY work_date DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_by_day(&self, work_date: NaiveDate) -> AppResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendances WHERE work_date = $1 ORDER BY check_in_time ASC, id ASC",
        )
        .bind(work_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: Pool<Postgres>,
}

impl PgUserDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const PROFILE_COLUMNS: &str =
    "id, employee_id, name, office_lat, office_long, allowed_radius::float8 AS allowed_radius, is_active";

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<UserLocationProfile>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", PROFILE_COLUMNS);
        let row = sqlx::query_as::<_, UserLocationProfile>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_employee_id(
        &self,
        employee_id: &str,
    ) -> AppResult<Option<UserLocationProfile>> {
        let query = format!("SELECT {} FROM users WHERE employee_id = $1", PROFILE_COLUMNS);
        let row = sqlx::query_as::<_, UserLocationProfile>(&query)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[derive(Clone)]
pub struct PgKioskRegistry {
    pool: Pool<Postgres>,
}

impl PgKioskRegistry {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KioskRegistry for PgKioskRegistry {
    async fn find_by_kiosk_id(&self, kiosk_id: &str) -> AppResult<Option<KioskDevice>> {
        let row = sqlx::query_as::<_, KioskDevice>(
            r#"
            SELECT k.id, k.kiosk_id, k.name,
                   o.latitude AS office_lat, o.longitude AS office_long,
                   k.is_active, k.is_paired, k.last_seen
            FROM kiosks k
            JOIN offices o ON o.id = k.office_id
            WHERE k.kiosk_id = $1
            "#,
        )
        .bind(kiosk_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn touch_last_seen(&self, kiosk_id: &str, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE kiosks SET last_seen = $2 WHERE kiosk_id = $1")
            .bind(kiosk_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

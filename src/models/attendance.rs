//! Attendance record model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::geofence::GeoPoint;

/// Punctuality classification of a check-in or check-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PunctualityStatus {
    OnTime,
    Late,
    EarlyLeave,
}

impl PunctualityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PunctualityStatus::OnTime => "on_time",
            PunctualityStatus::Late => "late",
            PunctualityStatus::EarlyLeave => "early_leave",
        }
    }
}

impl std::fmt::Display for PunctualityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PunctualityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_time" => Ok(PunctualityStatus::OnTime),
            "late" => Ok(PunctualityStatus::Late),
            "early_leave" => Ok(PunctualityStatus::EarlyLeave),
            _ => Err(format!("Invalid punctuality status: {}", s)),
        }
    }
}

// SQLx conversion for PunctualityStatus (stored as TEXT)
impl sqlx::Type<Postgres> for PunctualityStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for PunctualityStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for PunctualityStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Lifecycle state of a (user, day) attendance slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    NotCheckedIn,
    CheckedIn,
    CheckedOut,
}

/// One attendance record per (user, local calendar day)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Local calendar day the record belongs to (organization time zone)
    pub work_date: NaiveDate,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub check_in_lat: Option<f64>,
    pub check_in_long: Option<f64>,
    pub check_out_lat: Option<f64>,
    pub check_out_long: Option<f64>,
    /// Fixed at check-in, never recomputed
    pub is_late: bool,
    pub check_in_status: PunctualityStatus,
    pub check_out_status: Option<PunctualityStatus>,
    pub is_mock_location: bool,
    pub device_info: String,
    /// Append-only annotations
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn status(&self) -> DayStatus {
        match (self.check_in_time, self.check_out_time) {
            (_, Some(_)) => DayStatus::CheckedOut,
            (Some(_), None) => DayStatus::CheckedIn,
            (None, None) => DayStatus::NotCheckedIn,
        }
    }
}

/// Status of a day as seen by a client
pub fn day_status(record: Option<&AttendanceRecord>) -> DayStatus {
    record
        .map(AttendanceRecord::status)
        .unwrap_or(DayStatus::NotCheckedIn)
}

/// Fields written by a successful check-in
#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub user_id: Uuid,
    pub work_date: NaiveDate,
    pub time: DateTime<Utc>,
    pub location: GeoPoint,
    pub is_late: bool,
    pub is_mock_location: bool,
    pub device_info: String,
    pub notes: String,
}

/// Fields written by a successful check-out
#[derive(Debug, Clone)]
pub struct CheckOutUpdate {
    pub user_id: Uuid,
    pub work_date: NaiveDate,
    pub time: DateTime<Utc>,
    pub location: GeoPoint,
    pub status: PunctualityStatus,
    /// Appended to existing notes, separated by " | "
    pub note: Option<String>,
}

/// Employee check-in request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckInRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    pub device_info: String,
    #[serde(default)]
    pub is_mock_location: bool,
}

/// Employee check-out request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckOutRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

/// Pagination for attendance listings
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Page size (default 30, max 100)
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl HistoryQuery {
    pub const DEFAULT_LIMIT: i64 = 30;
    pub const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Everyone's attendance for one local day
#[derive(Debug, Serialize, ToSchema)]
pub struct DailyOverview {
    pub work_date: NaiveDate,
    /// Records for the day, before paging
    pub total: usize,
    pub total_late: usize,
    pub total_on_time: usize,
    /// Earliest check-in first
    pub attendances: Vec<AttendanceRecord>,
}

impl DailyOverview {
    /// Totals over the whole day, `attendances` limited to one page
    pub fn paged(work_date: NaiveDate, records: Vec<AttendanceRecord>, page: &HistoryQuery) -> Self {
        let total = records.len();
        let total_late = records.iter().filter(|r| r.is_late).count();
        let attendances = records
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Self {
            work_date,
            total,
            total_late,
            total_on_time: total - total_late,
            attendances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            work_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            check_in_time: Some(Utc::now()),
            check_out_time: None,
            check_in_lat: Some(-6.2),
            check_in_long: Some(106.8),
            check_out_lat: None,
            check_out_long: None,
            is_late: false,
            check_in_status: PunctualityStatus::OnTime,
            check_out_status: None,
            is_mock_location: false,
            device_info: String::new(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_day_status_follows_timestamps() {
        assert_eq!(day_status(None), DayStatus::NotCheckedIn);
        let mut r = record();
        assert_eq!(day_status(Some(&r)), DayStatus::CheckedIn);
        r.check_out_time = Some(Utc::now());
        assert_eq!(day_status(Some(&r)), DayStatus::CheckedOut);
    }

    #[test]
    fn test_overview_counts_whole_day_but_pages_records() {
        let mut records: Vec<AttendanceRecord> = (0..5).map(|_| record()).collect();
        records[1].is_late = true;
        records[4].is_late = true;
        let page = HistoryQuery {
            limit: Some(2),
            offset: Some(3),
        };

        let overview = DailyOverview::paged(records[0].work_date, records, &page);
        assert_eq!(overview.total, 5);
        assert_eq!(overview.total_late, 2);
        assert_eq!(overview.total_on_time, 3);
        assert_eq!(overview.attendances.len(), 2);
        assert!(overview.attendances[1].is_late);
    }

    #[test]
    fn test_history_query_clamps() {
        let q = HistoryQuery {
            limit: Some(500),
            offset: Some(-3),
        };
        assert_eq!(q.limit(), 100);
        assert_eq!(q.offset(), 0);
        let q = HistoryQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(q.limit(), 30);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for s in [
            PunctualityStatus::OnTime,
            PunctualityStatus::Late,
            PunctualityStatus::EarlyLeave,
        ] {
            assert_eq!(s.as_str().parse::<PunctualityStatus>().unwrap(), s);
        }
        assert!("tepat".parse::<PunctualityStatus>().is_err());
    }
}

//! Business logic services

pub mod attendance;
pub mod hub;
pub mod kiosk;
pub mod offline_sync;

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Source of "now" for the state machine
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and demos
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Run a storage call under `deadline`; an elapsed deadline is a timeout,
/// not a state-machine outcome
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(deadline)),
    }
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub attendance: attendance::AttendanceService,
    pub kiosk: kiosk::KioskService,
    pub offline_sync: offline_sync::OfflineSyncService,
    pub hub: hub::HubHandle,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        hub: hub::HubHandle,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let schedule = config
            .attendance
            .schedule()
            .map_err(|e| AppError::Internal(format!("Invalid attendance schedule: {}", e)))?;

        let attendance = attendance::AttendanceService::new(
            repository.clone(),
            hub.clone(),
            clock.clone(),
            attendance::AttendancePolicy {
                schedule,
                default_radius_m: config.geofence.default_radius_m,
                future_skew: chrono::Duration::seconds(config.kiosk.future_skew_secs),
                deadline: config.request_timeout(),
            },
        );
        let kiosk = kiosk::KioskService::new(
            repository,
            attendance.clone(),
            clock.clone(),
            config.request_timeout(),
        );
        let offline_sync = offline_sync::OfflineSyncService::new(
            kiosk.clone(),
            attendance.clone(),
            hub.clone(),
            clock,
            config.kiosk.clone(),
        );

        Ok(Self {
            attendance,
            kiosk,
            offline_sync,
            hub,
        })
    }
}

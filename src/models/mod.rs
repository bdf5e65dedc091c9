//! Data models for the presence server

pub mod attendance;
pub mod event;
pub mod kiosk;
pub mod user;

// Re-export commonly used types
pub use attendance::{AttendanceRecord, DayStatus, PunctualityStatus};
pub use event::{AttendanceEvent, BroadcastEvent};
pub use kiosk::{KioskDevice, OfflineRecord, OfflineSyncBatch, SyncSummary};
pub use user::{UserClaims, UserLocationProfile};

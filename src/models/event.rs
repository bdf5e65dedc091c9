//! Live events pushed to dashboard subscribers

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

pub const EVENT_CHECK_IN: &str = "attendance.check_in";
pub const EVENT_CHECK_OUT: &str = "attendance.check_out";
pub const EVENT_KIOSK_SYNC: &str = "kiosk.sync";

/// Payload of an attendance check-in / check-out event
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEvent {
    /// "check_in" or "check_out"
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub user_id: Uuid,
    pub user_name: String,
    pub employee_id: String,
    pub time: DateTime<Utc>,
    pub is_late: bool,
}

/// Ephemeral message fanned out by the broadcast hub. Never persisted.
#[derive(Debug, Clone)]
pub struct BroadcastEvent {
    pub event_type: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn check_in(event: AttendanceEvent) -> Self {
        Self::new(EVENT_CHECK_IN, to_value(&event))
    }

    pub fn check_out(event: AttendanceEvent) -> Self {
        Self::new(EVENT_CHECK_OUT, to_value(&event))
    }

    pub fn kiosk_sync(kiosk_id: &str, synced: usize) -> Self {
        Self::new(
            EVENT_KIOSK_SYNC,
            json!({ "kiosk_id": kiosk_id, "synced": synced }),
        )
    }

    pub fn is_attendance_update(&self) -> bool {
        self.event_type == EVENT_CHECK_IN || self.event_type == EVENT_CHECK_OUT
    }

    /// JSON text frame sent to subscribers.
    ///
    /// Attendance events keep the `{type: "attendance_update", payload}` shape
    /// dashboards listen for; everything else is `{event, payload, timestamp}`.
    pub fn to_frame(&self) -> String {
        let frame = if self.is_attendance_update() {
            json!({
                "type": "attendance_update",
                "payload": self.payload,
                "timestamp": self.timestamp,
            })
        } else {
            json!({
                "event": self.event_type,
                "payload": self.payload,
                "timestamp": self.timestamp,
            })
        };
        frame.to_string()
    }
}

fn to_value<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize event payload: {}", e);
        Value::Null
    })
}

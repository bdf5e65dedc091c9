//! Presence attendance server
//!
//! Geofenced employee check-in/check-out, kiosk check-in with offline batch
//! reconciliation, and a live event feed for dashboards.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod geofence;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub hub: services::hub::HubHandle,
}

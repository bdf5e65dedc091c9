//! Shared fixtures for the integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt; // oneshot
use uuid::Uuid;

use presence_server::{
    api,
    config::AppConfig,
    models::{KioskDevice, UserClaims, UserLocationProfile},
    repository::{memory::MemoryStore, Repository},
    services::{hub, hub::HubHandle, ManualClock, Services},
    AppState,
};

pub const SECRET: &str = "route-test-secret";
pub const OFFICE: (f64, f64) = (-6.2088, 106.8456);

/// 08:45 in Asia/Jakarta
pub const MORNING: &str = "2024-03-04T01:45:00Z";

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub hub: HubHandle,
    pub user_id: Uuid,
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = SECRET.to_string();
    config
}

/// Router over `repository` with a fresh hub
pub fn build_router(repository: Repository, clock: &ManualClock) -> (Router, HubHandle) {
    let config = test_config();
    let (hub, _task) = hub::spawn(&config.hub);
    let services = Services::new(repository, &config, hub.clone(), Arc::new(clock.clone())).unwrap();

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        hub: hub.clone(),
    };
    (api::router(state), hub)
}

pub async fn make_app() -> TestApp {
    let user_id = Uuid::new_v4();
    let store = MemoryStore::new();
    store.add_user(UserLocationProfile {
        id: user_id,
        employee_id: "EMP001".to_string(),
        name: "Siti Rahayu".to_string(),
        office_lat: OFFICE.0,
        office_long: OFFICE.1,
        allowed_radius: 50.0,
        is_active: true,
    });
    store.add_kiosk(KioskDevice {
        id: Uuid::new_v4(),
        kiosk_id: "KIOSK-LOBBY".to_string(),
        name: "Lobby".to_string(),
        office_lat: OFFICE.0,
        office_long: OFFICE.1,
        is_active: true,
        is_paired: true,
        last_seen: None,
    });

    let clock = ManualClock::new(at(MORNING));
    let (router, hub) = build_router(Repository::in_memory(store.clone()), &clock);

    TestApp {
        router,
        store,
        clock,
        hub,
        user_id,
    }
}

pub fn token(user_id: Uuid) -> String {
    token_with_role(user_id, "employee")
}

pub fn token_with_role(user_id: Uuid, role: &str) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: now + 3600,
        iat: now,
    }
    .create_token(SECRET)
    .unwrap()
}

pub async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router.clone().oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

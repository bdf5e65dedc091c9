//! Live API tests against a running server.
//!
//! Start the server with the memory backend and the example seed:
//! `PRESENCE_STORAGE__BACKEND=memory PRESENCE_STORAGE__SEED_FILE=config/seed.example.json`
//! then run with `cargo test -- --ignored`.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/api/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_check_in_without_token_is_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/api/attendance/check-in", BASE_URL))
        .json(&json!({ "latitude": -6.2088, "longitude": 106.8456 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_offline_sync_with_wrong_admin_code() {
    let client = Client::new();

    let response = client
        .post(format!("{}/api/kiosk/offline-sync", BASE_URL))
        .json(&json!({
            "kiosk_id": "KIOSK-LOBBY",
            "admin_code": "000000",
            "records": []
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "INVALID_ADMIN_CODE");
}

#[tokio::test]
#[ignore]
async fn test_kiosk_status_for_seeded_employee() {
    let client = Client::new();

    let response = client
        .get(format!("{}/api/kiosk/status/EMP001", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["employee_id"], "EMP001");
}

#[tokio::test]
#[ignore]
async fn test_ws_stats() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ws/stats", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total"].is_u64());
}

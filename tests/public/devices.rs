//! Tests for GET /check-device.

use axum::http::StatusCode;
use serde_json::json;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_check_device_recovers_license() {
    let (state, _store) = create_test_app_state();
    let key = create_test_license(&state.service);
    state.service.activate_device(&key, "device-abc").unwrap();

    let (status, body) = get_json(public_app(state), "/check-device?deviceId=device-abc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "activated": true, "licenseKey": key, "email": TEST_EMAIL })
    );
}

#[tokio::test]
async fn test_check_unknown_device() {
    let (state, _store) = create_test_app_state();

    let (status, body) = get_json(public_app(state), "/check-device?deviceId=nope").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "activated": false }));
}

#[tokio::test]
async fn test_check_device_without_id() {
    let (state, _store) = create_test_app_state();

    let (status, body) = get_json(public_app(state), "/check-device").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "activated": false }));
}

#[tokio::test]
async fn test_check_device_after_deactivate() {
    let (state, _store) = create_test_app_state();
    let key = create_test_license(&state.service);
    state.service.activate_device(&key, "d1").unwrap();
    state.service.deactivate_device(&key, "d1").unwrap();

    let (_, body) = get_json(public_app(state), "/check-device?deviceId=d1").await;

    assert_eq!(body["activated"], false);
}

#[tokio::test]
async fn test_check_device_store_failure() {
    let store = std::sync::Arc::new(FailingStore::new());
    let state = AppState::new(LicenseService::new(store.clone()));
    store.fail_gets();

    let (status, body) = get_json(public_app(state), "/check-device?deviceId=d1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "activated": false, "error": "Internal server error" }));
}

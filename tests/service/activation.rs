//! Tests for device activation and the per-license device ceiling.

use std::sync::Arc;
use std::thread;

use chrono::Duration;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[test]
fn test_first_activation_binds_device() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    let activation = t.service.activate_device(&key, "d1").unwrap();

    assert_eq!(activation.license_key, key);
    assert_eq!(activation.email.as_deref(), Some(TEST_EMAIL));
    assert_eq!(activation.devices_used, 1);
    assert_eq!(activation.max_devices, DEFAULT_MAX_DEVICES);

    let record = read_record(t.store.as_ref(), &key);
    let binding = record.device("d1").expect("d1 should be bound");
    assert_eq!(binding.activated_at, test_epoch());
    assert_eq!(binding.last_seen, test_epoch());
    assert_eq!(
        t.store.get(&device_index_key("d1")).unwrap().as_deref(),
        Some(key.as_str()),
        "device index should point at the license"
    );
}

#[test]
fn test_fourth_device_is_refused_at_limit() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    for (i, device) in ["d1", "d2", "d3"].iter().enumerate() {
        let activation = t.service.activate_device(&key, device).unwrap();
        assert_eq!(activation.devices_used, i + 1);
    }

    let err = t.service.activate_device(&key, "d4").unwrap_err();
    match &err {
        AppError::DeviceLimitExceeded { used, max } => {
            assert_eq!(*used, 3);
            assert_eq!(*max, 3);
        }
        other => panic!("expected device limit refusal, got {:?}", other),
    }
    assert_eq!(
        err.client_message(),
        "License already activated on 3 devices. Deactivate a device or contact support."
    );

    let record = read_record(t.store.as_ref(), &key);
    assert_eq!(record.devices_used(), 3, "refusal must not bind the device");
    assert!(record.device("d4").is_none());
    assert!(t.store.get(&device_index_key("d4")).unwrap().is_none());
}

#[test]
fn test_reactivation_at_limit_is_accepted() {
    let t = create_test_service();
    let key = create_test_license(&t.service);
    for device in ["d1", "d2", "d3"] {
        t.service.activate_device(&key, device).unwrap();
    }

    t.clock.advance(Duration::hours(2));
    let activation = t
        .service
        .activate_device(&key, "d2")
        .expect("a bound device is always accepted");

    assert_eq!(activation.devices_used, 3);

    let record = read_record(t.store.as_ref(), &key);
    assert_eq!(record.devices_used(), 3, "re-activation must not add a binding");
    let binding = record.device("d2").unwrap();
    assert_eq!(binding.activated_at, test_epoch(), "activatedAt is preserved");
    assert_eq!(binding.last_seen, test_epoch() + Duration::hours(2));
}

#[test]
fn test_reactivation_is_idempotent_on_bindings() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    for _ in 0..5 {
        t.service.activate_device(&key, "d1").unwrap();
    }

    let record = read_record(t.store.as_ref(), &key);
    assert_eq!(record.devices.len(), 1);
}

#[test]
fn test_activation_with_unknown_key_leaves_store_untouched() {
    let store = Arc::new(FailingStore::new());
    let service = LicenseService::new(store.clone());

    let err = service.activate_device("PAKT-NOPE-NOPE-NOPE", "d1").unwrap_err();

    assert!(matches!(err, AppError::InvalidKey));
    assert_eq!(err.client_message(), "Invalid license key");
    assert_eq!(store.puts.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(store.inner.is_empty());
}

#[test]
fn test_activation_requires_key_and_device() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    for (k, d) in [("", "d1"), (key.as_str(), ""), ("", "")] {
        let err = t.service.activate_device(k, d).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.client_message(), "Missing key or deviceId");
    }
}

#[test]
fn test_activation_on_revoked_license_is_refused() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    let mut record = read_record(t.store.as_ref(), &key);
    record.status = LicenseStatus::Revoked;
    t.store.put(&key, &record.to_json().unwrap()).unwrap();

    let err = t.service.activate_device(&key, "d1").unwrap_err();
    assert!(matches!(err, AppError::LicenseInactive));
    assert_eq!(err.client_message(), "License is not active");
    assert_eq!(read_record(t.store.as_ref(), &key).devices_used(), 0);
}

#[test]
fn test_configured_device_limit_is_enforced() {
    let t = create_test_service();
    let service = LicenseService::new(t.store.clone()).with_max_devices(1);
    let key = create_test_license(&service);

    service.activate_device(&key, "d1").unwrap();
    let err = service.activate_device(&key, "d2").unwrap_err();

    assert!(matches!(
        err,
        AppError::DeviceLimitExceeded { used: 1, max: 1 }
    ));
}

#[test]
fn test_zero_device_limit_is_clamped_to_one() {
    let store = Arc::new(MemoryStore::new());
    let service = LicenseService::new(store).with_max_devices(0);
    assert_eq!(service.max_devices(), 1);
}

#[test]
fn test_concurrent_activations_never_exceed_limit() {
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(LicenseService::new(store.clone()));
    let key = create_test_license(&service);

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let service = Arc::clone(&service);
            let key = key.clone();
            thread::spawn(move || service.activate_device(&key, &format!("device-{}", i)))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::DeviceLimitExceeded { .. })))
        .count();

    assert_eq!(accepted, 3, "exactly max_devices activations should win");
    assert_eq!(refused, 9);
    assert_eq!(read_record(store.as_ref(), &key).devices_used(), 3);
}

//! Tests for license creation, validation, session lookup and deactivation.

use std::sync::Arc;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[test]
fn test_created_license_has_valid_key_and_fresh_record() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    assert!(is_valid_license_key(&key), "unexpected key format: {}", key);

    let record = read_record(t.store.as_ref(), &key);
    assert_eq!(record.email.as_deref(), Some(TEST_EMAIL));
    assert_eq!(record.created_at, test_epoch());
    assert_eq!(record.status, LicenseStatus::Active);
    assert_eq!(record.origin_session_id.as_deref(), Some(TEST_SESSION));
    assert!(record.devices.is_empty());

    assert_eq!(
        t.store.get(&email_index_key(TEST_EMAIL)).unwrap().as_deref(),
        Some(key.as_str())
    );
}

#[test]
fn test_create_without_email_writes_no_email_index() {
    let t = create_test_service();

    let key = t.service.create_license(None, TEST_SESSION).unwrap();
    let blank = t.service.create_license(Some("   "), "cs_blank").unwrap();

    assert!(read_record(t.store.as_ref(), &key).email.is_none());
    assert!(read_record(t.store.as_ref(), &blank).email.is_none());
    assert!(
        t.store.list().unwrap().iter().all(|k| !k.starts_with(EMAIL_INDEX_PREFIX)),
        "no email index entries expected"
    );
}

#[test]
fn test_create_uses_injected_key_generator() {
    let store = Arc::new(MemoryStore::new());
    let service = LicenseService::new(store.clone()).with_key_generator(Arc::new(
        SequenceKeyGenerator::new(&["PAKT-AAAA-BBBB-CCCC"]),
    ));

    let key = create_test_license(&service);
    assert_eq!(key, "PAKT-AAAA-BBBB-CCCC");
    assert!(store.get("PAKT-AAAA-BBBB-CCCC").unwrap().is_some());
}

#[test]
fn test_validate_fresh_license() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    let validation = t.service.validate_key(&key).unwrap();

    assert!(validation.valid);
    assert_eq!(validation.email.as_deref(), Some(TEST_EMAIL));
    assert_eq!(validation.devices_used, Some(0));
    assert_eq!(validation.max_devices, Some(3));
}

#[test]
fn test_validate_counts_bound_devices() {
    let t = create_test_service();
    let key = create_test_license(&t.service);
    t.service.activate_device(&key, "d1").unwrap();
    t.service.activate_device(&key, "d2").unwrap();

    assert_eq!(t.service.validate_key(&key).unwrap().devices_used, Some(2));
}

#[test]
fn test_validate_is_read_only() {
    let store = Arc::new(FailingStore::new());
    let service = LicenseService::new(store.clone());
    let key = create_test_license(&service);
    let before = store.inner.snapshot();

    // Writes would fail, reads still work
    store.fail_puts_matching("");
    assert!(service.validate_key(&key).unwrap().valid);
    assert_eq!(store.inner.snapshot(), before);
}

#[test]
fn test_validate_unknown_or_revoked_is_invalid() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    assert_eq!(
        t.service.validate_key("PAKT-XXXX-XXXX-XXXX").unwrap(),
        Validation::invalid()
    );
    assert_eq!(t.service.validate_key("").unwrap(), Validation::invalid());

    let mut record = read_record(t.store.as_ref(), &key);
    record.status = LicenseStatus::Revoked;
    t.store.put(&key, &record.to_json().unwrap()).unwrap();

    assert!(!t.service.validate_key(&key).unwrap().valid);
}

#[test]
fn test_find_by_session_returns_matching_license() {
    let t = create_test_service();
    t.service.create_license(Some("x@y.com"), "cs_other").unwrap();
    let key = create_test_license(&t.service);

    let lookup = t.service.find_by_session(TEST_SESSION).unwrap();

    assert!(lookup.success);
    assert_eq!(lookup.license_key.as_deref(), Some(key.as_str()));
    assert_eq!(lookup.email.as_deref(), Some(TEST_EMAIL));
    assert!(lookup.message.is_none());
}

#[test]
fn test_find_by_session_pending_until_webhook_lands() {
    let t = create_test_service();
    create_test_license(&t.service);

    let lookup = t.service.find_by_session("cs_not_yet").unwrap();

    assert!(!lookup.success);
    assert_eq!(lookup.message, Some("Processing..."));
    assert!(lookup.license_key.is_none());

    assert!(!t.service.find_by_session("").unwrap().success);
}

#[test]
fn test_find_by_session_skips_index_and_corrupt_entries() {
    let t = create_test_service();
    let key = create_test_license(&t.service);
    t.service.activate_device(&key, "d1").unwrap();
    // Sorts before any PAKT- key
    t.store.put("AAAA-broken", "{not json").unwrap();

    let lookup = t.service.find_by_session(TEST_SESSION).unwrap();
    assert!(lookup.success);
    assert_eq!(lookup.license_key.as_deref(), Some(key.as_str()));
}

#[test]
fn test_deactivate_frees_a_slot() {
    let t = create_test_service();
    let key = create_test_license(&t.service);
    for device in ["d1", "d2", "d3"] {
        t.service.activate_device(&key, device).unwrap();
    }

    let deactivation = t.service.deactivate_device(&key, "d2").unwrap();
    assert_eq!(
        deactivation,
        Deactivation {
            success: true,
            devices_used: 2,
            max_devices: 3,
        }
    );
    assert!(t.store.get(&device_index_key("d2")).unwrap().is_none());

    let activation = t.service.activate_device(&key, "d4").unwrap();
    assert_eq!(activation.devices_used, 3);

    let ids: Vec<_> = read_record(t.store.as_ref(), &key)
        .devices
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, ["d1", "d3", "d4"], "bindings keep insertion order");
}

#[test]
fn test_deactivate_unbound_device_still_succeeds() {
    let t = create_test_service();
    let key = create_test_license(&t.service);
    t.service.activate_device(&key, "d1").unwrap();

    let deactivation = t.service.deactivate_device(&key, "never-bound").unwrap();

    assert!(deactivation.success);
    assert_eq!(deactivation.devices_used, 1);
}

#[test]
fn test_deactivate_rejects_missing_input_and_unknown_key() {
    let t = create_test_service();
    let key = create_test_license(&t.service);

    let err = t.service.deactivate_device(&key, "").unwrap_err();
    assert_eq!(err.client_message(), "Missing key or deviceId");

    let err = t.service.deactivate_device("PAKT-NONE-NONE-NONE", "d1").unwrap_err();
    assert!(matches!(err, AppError::InvalidKey));
}

#[test]
fn test_deactivate_on_revoked_license_is_allowed() {
    let t = create_test_service();
    let key = create_test_license(&t.service);
    t.service.activate_device(&key, "d1").unwrap();

    let mut record = read_record(t.store.as_ref(), &key);
    record.status = LicenseStatus::Revoked;
    t.store.put(&key, &record.to_json().unwrap()).unwrap();

    let deactivation = t.service.deactivate_device(&key, "d1").unwrap();
    assert_eq!(deactivation.devices_used, 0);
}

#[test]
fn test_index_entry_names_are_not_license_keys() {
    let t = create_test_service();
    let key = create_test_license(&t.service);
    t.service.activate_device(&key, "d1").unwrap();
    let email_index = email_index_key(TEST_EMAIL);

    assert_eq!(
        t.service.validate_key("device:d1").unwrap(),
        Validation::invalid()
    );
    assert!(!t.service.validate_key(&email_index).unwrap().valid);

    let err = t.service.activate_device(&email_index, "d9").unwrap_err();
    assert!(matches!(err, AppError::InvalidKey), "got {:?}", err);

    let err = t.service.deactivate_device("device:d1", "d1").unwrap_err();
    assert!(matches!(err, AppError::InvalidKey), "got {:?}", err);

    // Index entries are untouched
    assert_eq!(
        t.store.get(&device_index_key("d1")).unwrap().as_deref(),
        Some(key.as_str())
    );
    assert!(t.service.check_device("d1").unwrap().activated);
}

#[test]
fn test_create_refuses_key_outside_license_namespace() {
    let store = Arc::new(MemoryStore::new());
    let service = LicenseService::new(store.clone())
        .with_key_generator(Arc::new(SequenceKeyGenerator::new(&["device:d1"])));

    let err = service
        .create_license(Some(TEST_EMAIL), TEST_SESSION)
        .unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
    assert!(store.is_empty(), "nothing should be written");
}

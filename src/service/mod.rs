//! License and device state machine.
//!
//! Every operation reads and writes through a `LicenseStore`. A license lives
//! under its key; `email:<lowercased email>` and `device:<id>` entries point
//! back at it. The record is always written first and the index second, with
//! no atomicity between them:
//!
//! - once the record write succeeds the operation has happened, and an index
//!   write that fails afterwards is logged, not returned;
//! - an index may therefore lag or dangle, so every read that goes through an
//!   index re-checks the record and treats a mismatch as "not found".

mod locks;
mod outcomes;

pub use outcomes::*;

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::{AppError, Result, msg};
use crate::keygen::{KeyGenerator, RandomKeyGenerator, is_valid_license_key};
use crate::models::{DeviceBinding, LicenseRecord, device_index_key, email_index_key, is_index_key};
use crate::store::{LicenseStore, StoreError};

use locks::KeyLocks;

pub const DEFAULT_MAX_DEVICES: usize = 3;

pub struct LicenseService {
    store: Arc<dyn LicenseStore>,
    keygen: Arc<dyn KeyGenerator>,
    clock: Arc<dyn Clock>,
    max_devices: usize,
    locks: KeyLocks,
}

impl LicenseService {
    /// Service with the system clock, random keys and the default device limit.
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self {
            store,
            keygen: Arc::new(RandomKeyGenerator),
            clock: Arc::new(SystemClock),
            max_devices: DEFAULT_MAX_DEVICES,
            locks: KeyLocks::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_generator(mut self, keygen: Arc<dyn KeyGenerator>) -> Self {
        self.keygen = keygen;
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn with_max_devices(mut self, max_devices: usize) -> Self {
        self.max_devices = max_devices.max(1);
        self
    }

    pub fn max_devices(&self) -> usize {
        self.max_devices
    }

    // ============ Store helpers ============

    /// Index entries share the namespace but are never licenses.
    fn load(&self, key: &str) -> Result<Option<LicenseRecord>> {
        if is_index_key(key) {
            return Ok(None);
        }
        let Some(raw) = self.store.get(key).map_err(AppError::StoreRead)? else {
            return Ok(None);
        };
        LicenseRecord::from_json(&raw)
            .map(Some)
            .map_err(|source| {
                AppError::StoreRead(StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                })
            })
    }

    fn save(&self, key: &str, record: &LicenseRecord) -> Result<()> {
        let json = record.to_json()?;
        self.store.put(key, &json).map_err(AppError::StoreWrite)
    }

    /// Second phase of a two-phase write. The record is already committed,
    /// so failure here only leaves the index behind.
    fn put_index(&self, index_key: &str, license_key: &str) {
        if let Err(e) = self.store.put(index_key, license_key) {
            tracing::warn!(
                index = %index_key,
                license_key = %license_key,
                error = %e,
                "Failed to write index entry; index now lags the record"
            );
        }
    }

    fn delete_index(&self, index_key: &str) {
        if let Err(e) = self.store.delete(index_key) {
            tracing::warn!(
                index = %index_key,
                error = %e,
                "Failed to delete index entry; index now points at a stale binding"
            );
        }
    }

    /// Raw record lookup, no side effects.
    pub fn get_license(&self, key: &str) -> Result<Option<LicenseRecord>> {
        self.load(key)
    }

    // ============ Operations ============

    /// Issue a new license for a completed payment.
    ///
    /// Never checks for an existing license for the same email: a replayed
    /// payment event yields a second license and the email index moves to it.
    pub fn create_license(&self, email: Option<&str>, origin_session_id: &str) -> Result<String> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        let key = self.keygen.generate();
        // A key outside the PAKT- namespace could overwrite an index entry
        if !is_valid_license_key(&key) {
            return Err(AppError::Internal(format!("Key generator produced malformed key {:?}", key)));
        }
        let record = LicenseRecord::new(email, Some(origin_session_id), self.clock.now());

        self.save(&key, &record)?;

        if let Some(email) = email {
            self.put_index(&email_index_key(email), &key);
        }

        tracing::info!(
            license_key = %key,
            email = email.unwrap_or("<none>"),
            session_id = %origin_session_id,
            "License created"
        );

        Ok(key)
    }

    /// Bind `device_id` to the license, or refresh it if already bound.
    ///
    /// A device that is already bound is always accepted, even at the limit;
    /// only new devices are counted against `max_devices`.
    pub fn activate_device(&self, key: &str, device_id: &str) -> Result<Activation> {
        if key.is_empty() || device_id.is_empty() {
            return Err(AppError::BadRequest(msg::MISSING_KEY_OR_DEVICE.into()));
        }

        let _guard = self.locks.acquire(key);

        let mut record = self.load(key)?.ok_or(AppError::InvalidKey)?;

        if !record.is_active() {
            return Err(AppError::LicenseInactive);
        }

        let now = self.clock.now();

        if let Some(binding) = record.device_mut(device_id) {
            binding.touch(now);
            tracing::debug!(license_key = %key, device_id = %device_id, "Device re-activated");
        } else {
            let used = record.devices_used();
            if used >= self.max_devices {
                tracing::info!(
                    license_key = %key,
                    device_id = %device_id,
                    used,
                    max = self.max_devices,
                    "Activation refused: device limit reached"
                );
                return Err(AppError::DeviceLimitExceeded {
                    used,
                    max: self.max_devices,
                });
            }
            record.devices.push(DeviceBinding::new(device_id, now));
            tracing::info!(
                license_key = %key,
                device_id = %device_id,
                devices_used = record.devices_used(),
                "Device activated"
            );
        }

        self.save(key, &record)?;
        self.put_index(&device_index_key(device_id), key);

        Ok(Activation {
            email: record.email,
            license_key: key.to_string(),
            devices_used: record.devices.len(),
            max_devices: self.max_devices,
        })
    }

    /// Recover the license a device was activated with.
    ///
    /// A missing, dangling or stale index entry is a plain "not activated".
    /// A bound device gets its `last_seen` refreshed on a best-effort basis.
    pub fn check_device(&self, device_id: &str) -> Result<DeviceCheck> {
        if device_id.is_empty() {
            return Ok(DeviceCheck::not_activated());
        }

        let Some(key) = self
            .store
            .get(&device_index_key(device_id))
            .map_err(AppError::StoreRead)?
        else {
            return Ok(DeviceCheck::not_activated());
        };

        let _guard = self.locks.acquire(&key);

        let Some(mut record) = self.load(&key)? else {
            tracing::debug!(device_id = %device_id, license_key = %key, "Device index points at a missing license");
            return Ok(DeviceCheck::not_activated());
        };

        if !record.is_active() {
            return Ok(DeviceCheck::not_activated());
        }

        let now = self.clock.now();
        let Some(binding) = record.device_mut(device_id) else {
            tracing::debug!(device_id = %device_id, license_key = %key, "Device index is stale; no binding on license");
            return Ok(DeviceCheck::not_activated());
        };
        binding.touch(now);

        if let Err(e) = self.save(&key, &record) {
            tracing::warn!(
                device_id = %device_id,
                license_key = %key,
                error = %e,
                "Failed to record device keep-alive"
            );
        }

        Ok(DeviceCheck::activated(key, record.email))
    }

    /// Read-only status of a license key.
    pub fn validate_key(&self, key: &str) -> Result<Validation> {
        if key.is_empty() {
            return Ok(Validation::invalid());
        }

        match self.load(key)? {
            Some(record) if record.is_active() => Ok(Validation {
                valid: true,
                devices_used: Some(record.devices_used()),
                max_devices: Some(self.max_devices),
                email: record.email,
            }),
            _ => Ok(Validation::invalid()),
        }
    }

    /// Find the license issued to an email address (case-insensitive).
    pub fn lookup_by_email(&self, email: &str) -> Result<EmailLookup> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(EmailLookup::not_found());
        }

        let Some(key) = self
            .store
            .get(&email_index_key(email))
            .map_err(AppError::StoreRead)?
        else {
            return Ok(EmailLookup::not_found());
        };

        if self.store.get(&key).map_err(AppError::StoreRead)?.is_none() {
            tracing::debug!(license_key = %key, "Email index points at a missing license");
            return Ok(EmailLookup::not_found());
        }

        Ok(EmailLookup {
            found: true,
            key: Some(key),
        })
    }

    /// Find the license created for a payment session.
    ///
    /// Full scan of the namespace: cost grows with the number of licenses.
    /// Only meant for the post-checkout page, which polls until it succeeds.
    pub fn find_by_session(&self, session_id: &str) -> Result<SessionLookup> {
        let pending = SessionLookup {
            success: false,
            license_key: None,
            email: None,
            message: Some(msg::PROCESSING),
        };

        if session_id.is_empty() {
            return Ok(pending);
        }

        let keys = self.store.list().map_err(AppError::StoreRead)?;

        for key in keys.iter().filter(|k| !is_index_key(k)) {
            let record = match self.load(key) {
                Ok(Some(record)) => record,
                // Deleted between list and get
                Ok(None) => continue,
                Err(AppError::StoreRead(StoreError::Corrupt { key, source })) => {
                    tracing::warn!(key = %key, error = %source, "Skipping unreadable record during session scan");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if record.origin_session_id.as_deref() == Some(session_id) {
                return Ok(SessionLookup {
                    success: true,
                    license_key: Some(key.clone()),
                    email: record.email,
                    message: None,
                });
            }
        }

        Ok(pending)
    }

    /// Unbind a device from a license, freeing its slot.
    ///
    /// Unbinding a device that is not bound still succeeds. The device index
    /// entry is removed either way.
    pub fn deactivate_device(&self, key: &str, device_id: &str) -> Result<Deactivation> {
        if key.is_empty() || device_id.is_empty() {
            return Err(AppError::BadRequest(msg::MISSING_KEY_OR_DEVICE.into()));
        }

        let _guard = self.locks.acquire(key);

        let mut record = self.load(key)?.ok_or(AppError::InvalidKey)?;

        let removed = record.remove_device(device_id);
        self.save(key, &record)?;
        self.delete_index(&device_index_key(device_id));

        if removed {
            tracing::info!(
                license_key = %key,
                device_id = %device_id,
                devices_used = record.devices_used(),
                "Device deactivated"
            );
        }

        Ok(Deactivation {
            success: true,
            devices_used: record.devices_used(),
            max_devices: self.max_devices,
        })
    }
}

impl std::fmt::Debug for LicenseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseService")
            .field("max_devices", &self.max_devices)
            .finish()
    }
}

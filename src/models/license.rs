use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DeviceBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    /// Reserved. Nothing produces it yet, but a revoked record must refuse activation.
    Revoked,
}

/// The value stored under a license key.
///
/// Field names match records already in the store, so older records stay
/// readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Purchase email, never mutated. Absent when the checkout carried none.
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: LicenseStatus,
    /// Payment session that produced this license
    #[serde(rename = "stripeSessionId", default)]
    pub origin_session_id: Option<String>,
    /// Insertion ordered, no duplicate ids
    #[serde(default)]
    pub devices: Vec<DeviceBinding>,
}

impl LicenseRecord {
    pub fn new(email: Option<&str>, origin_session_id: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            email: email.map(String::from),
            created_at: now,
            status: LicenseStatus::Active,
            origin_session_id: origin_session_id.map(String::from),
            devices: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == LicenseStatus::Active
    }

    pub fn devices_used(&self) -> usize {
        self.devices.len()
    }

    pub fn device(&self, device_id: &str) -> Option<&DeviceBinding> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    pub fn device_mut(&mut self, device_id: &str) -> Option<&mut DeviceBinding> {
        self.devices.iter_mut().find(|d| d.id == device_id)
    }

    /// Remove every binding for `device_id`. Returns whether any was removed.
    pub fn remove_device(&mut self, device_id: &str) -> bool {
        let before = self.devices.len();
        self.devices.retain(|d| d.id != device_id);
        self.devices.len() != before
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One device's activation against a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceBinding {
    /// Caller-supplied device identifier, unique within a record
    pub id: String,
    pub activated_at: DateTime<Utc>,
    /// Refreshed on re-activation and on successful device checks
    pub last_seen: DateTime<Utc>,
}

impl DeviceBinding {
    pub fn new(id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            activated_at: now,
            last_seen: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

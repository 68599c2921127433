use serde::Serialize;

/// Successful activation of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub email: Option<String>,
    pub license_key: String,
    pub devices_used: usize,
    pub max_devices: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCheck {
    pub activated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl DeviceCheck {
    pub fn not_activated() -> Self {
        Self {
            activated: false,
            license_key: None,
            email: None,
        }
    }

    pub fn activated(license_key: String, email: Option<String>) -> Self {
        Self {
            activated: true,
            license_key: Some(license_key),
            email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices_used: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_devices: Option<usize>,
}

impl Validation {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            email: None,
            devices_used: None,
            max_devices: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailLookup {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl EmailLookup {
    pub fn not_found() -> Self {
        Self {
            found: false,
            key: None,
        }
    }
}

/// Result of polling for the license created by a payment session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLookup {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Set when nothing matched yet; callers should poll again
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deactivation {
    pub success: bool,
    pub devices_used: usize,
    pub max_devices: usize,
}

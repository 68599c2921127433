mod device;
mod license;

pub use device::*;
pub use license::*;

/// Store key prefix for the email → license key index.
pub const EMAIL_INDEX_PREFIX: &str = "email:";
/// Store key prefix for the device → license key index.
pub const DEVICE_INDEX_PREFIX: &str = "device:";

/// Store key for the email index entry. Emails are matched case-insensitively.
pub fn email_index_key(email: &str) -> String {
    format!("{}{}", EMAIL_INDEX_PREFIX, email.to_lowercase())
}

pub fn device_index_key(device_id: &str) -> String {
    format!("{}{}", DEVICE_INDEX_PREFIX, device_id)
}

/// Whether a store key names a secondary index entry rather than a license record.
pub fn is_index_key(key: &str) -> bool {
    key.starts_with(EMAIL_INDEX_PREFIX) || key.starts_with(DEVICE_INDEX_PREFIX)
}

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result, msg};

type HmacSha256 = Hmac<Sha256>;

/// Checks `Stripe-Signature` headers against the endpoint's signing secret.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    webhook_secret: String,
}

impl StripeWebhookVerifier {
    /// Maximum age of a webhook timestamp before it's rejected (in seconds).
    /// Stripe recommends 300 seconds (5 minutes).
    const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

    /// How far in the future a timestamp may be (clock skew).
    const FUTURE_SKEW_SECS: i64 = 60;

    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        self.verify_at(payload, signature, chrono::Utc::now().timestamp())
    }

    /// Verify against an explicit current time (unix seconds).
    pub fn verify_at(&self, payload: &[u8], signature: &str, now: i64) -> Result<bool> {
        // Format: t=timestamp,v1=signature[,v1=...]
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in signature.split(',') {
            let part = part.trim();
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = Some(t);
            } else if let Some(s) = part.strip_prefix("v1=") {
                signatures.push(s);
            }
        }

        let timestamp_str =
            timestamp.ok_or_else(|| AppError::BadRequest(msg::INVALID_SIGNATURE_FORMAT.into()))?;
        if signatures.is_empty() {
            return Err(AppError::BadRequest(msg::INVALID_SIGNATURE_FORMAT.into()));
        }

        let timestamp: i64 = timestamp_str
            .parse()
            .map_err(|_| AppError::BadRequest(msg::INVALID_TIMESTAMP_IN_SIGNATURE.into()))?;

        let Some(age) = now.checked_sub(timestamp) else {
            tracing::warn!("Stripe webhook rejected: timestamp out of range ({})", timestamp);
            return Ok(false);
        };
        if age > Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS {
            tracing::warn!(
                "Stripe webhook rejected: timestamp too old (age={}s, max={}s)",
                age,
                Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS
            );
            return Ok(false);
        }
        if age < -Self::FUTURE_SKEW_SECS {
            tracing::warn!("Stripe webhook rejected: timestamp in the future (age={}s)", age);
            return Ok(false);
        }

        let expected = compute_signature(&self.webhook_secret, timestamp_str, payload)?;
        let expected_bytes = expected.as_bytes();

        // Stripe may send several v1 entries while a secret is being rolled
        Ok(signatures.iter().any(|provided| {
            let provided = provided.as_bytes();
            provided.len() == expected_bytes.len() && bool::from(expected_bytes.ct_eq(provided))
        }))
    }
}

impl std::fmt::Debug for StripeWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeWebhookVerifier").finish_non_exhaustive()
    }
}

/// Hex HMAC-SHA256 of `{timestamp}.{payload}`, as Stripe computes `v1`.
pub fn compute_signature(secret: &str, timestamp: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal(msg::INVALID_WEBHOOK_SECRET.into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Generic Stripe webhook event - object is parsed based on event_type
#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

// ============ checkout.session.completed ============

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub customer_email: Option<String>,
    pub customer_details: Option<StripeCustomerDetails>,
}

#[derive(Debug, Deserialize)]
pub struct StripeCustomerDetails {
    pub email: Option<String>,
}

impl StripeCheckoutSession {
    /// Email given at checkout: `customer_email` when prefilled, otherwise
    /// what the customer typed into `customer_details`.
    pub fn email(&self) -> Option<&str> {
        self.customer_email
            .as_deref()
            .or_else(|| self.customer_details.as_ref()?.email.as_deref())
            .filter(|e| !e.trim().is_empty())
    }
}

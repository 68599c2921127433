use std::sync::Arc;

use crate::payments::StripeWebhookVerifier;
use crate::service::LicenseService;

/// Shared handler state. Everything mutable lives behind the store.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LicenseService>,
    /// `None` accepts unsigned webhook payloads
    pub stripe_verifier: Option<StripeWebhookVerifier>,
}

impl AppState {
    pub fn new(service: LicenseService) -> Self {
        Self {
            service: Arc::new(service),
            stripe_verifier: None,
        }
    }

    pub fn with_stripe_secret(mut self, secret: Option<&str>) -> Self {
        self.stripe_verifier = secret.map(StripeWebhookVerifier::new);
        self
    }
}

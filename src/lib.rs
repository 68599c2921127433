//! PAKT license service - issues license keys, binds them to a bounded set
//! of devices and recovers device-to-license associations after reinstalls.
//!
//! All state lives in a key-value store with per-key consistency and no
//! transactions; `service::LicenseService` is the state machine over it and
//! `handlers` is the HTTP surface.

pub mod clock;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod keygen;
pub mod models;
pub mod payments;
pub mod rate_limit;
pub mod service;
pub mod state;
pub mod store;

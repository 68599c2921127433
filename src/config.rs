use std::env;

use crate::service::DEFAULT_MAX_DEVICES;

/// Per-IP rate limits for public endpoints (requests per minute, 0 = off).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub standard_rpm: u32,
    pub relaxed_rpm: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            standard_rpm: 60,
            relaxed_rpm: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub max_devices: usize,
    /// Unset = accept webhook payloads without a signature check
    pub stripe_webhook_secret: Option<String>,
    pub rate_limit: RateLimitConfig,
    /// `None` = any origin
    pub cors_allowed_origins: Option<Vec<String>>,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let dev_mode = var("PAKT_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = var("PORT").and_then(|p| p.parse().ok()).unwrap_or(8787);

        let max_devices = var("PAKT_MAX_DEVICES")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_MAX_DEVICES);

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            standard_rpm: var("RATE_LIMIT_STANDARD_RPM")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.standard_rpm),
            relaxed_rpm: var("RATE_LIMIT_RELAXED_RPM")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.relaxed_rpm),
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && v != "*")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            });

        Self {
            host,
            port,
            database_path: var("DATABASE_PATH").unwrap_or_else(|| "pakt_licenses.db".to_string()),
            max_devices,
            stripe_webhook_secret: var("STRIPE_WEBHOOK_SECRET").filter(|s| !s.is_empty()),
            rate_limit,
            cors_allowed_origins,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

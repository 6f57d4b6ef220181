//! Session management configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sliding-expiration window in hours. Every authenticated request
    /// extends the session to now + this window.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    /// Expiry window in days for "remember me" sessions.
    #[serde(default = "default_remember_ttl_days")]
    pub remember_ttl_days: u64,
    /// Interval between expired-session sweeps in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            remember_ttl_days: default_remember_ttl_days(),
            sweep_interval_minutes: default_sweep_interval(),
            cookie_name: default_cookie_name(),
        }
    }
}

fn default_ttl_hours() -> u64 {
    36
}

// 50 years, matching the product's "remember me" semantics.
fn default_remember_ttl_days() -> u64 {
    50 * 365
}

fn default_sweep_interval() -> u64 {
    360
}

fn default_cookie_name() -> String {
    "cliphub_session".to_string()
}

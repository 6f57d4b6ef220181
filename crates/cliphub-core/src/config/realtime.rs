//! Real-time event delivery configuration.

use serde::{Deserialize, Serialize};

/// Real-time event delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each session's delivery channel. Deliveries to a full
    /// channel are dropped rather than blocking the publisher.
    #[serde(default = "default_channel_buffer_size")]
    pub channel_buffer_size: usize,
    /// SSE keep-alive interval in seconds.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer_size(),
            keep_alive_seconds: default_keep_alive(),
        }
    }
}

fn default_channel_buffer_size() -> usize {
    8
}

fn default_keep_alive() -> u64 {
    15
}

//! Periodic removal of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::store::SessionStore;

/// Background task that sweeps the session store on a fixed interval.
///
/// Runs until the shutdown signal fires; the caller keeps the sender half
/// of the watch channel and flips it on graceful shutdown.
pub struct SessionSweeper {
    store: Arc<SessionStore>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl SessionSweeper {
    /// Creates a sweeper ticking every `interval`.
    pub fn new(store: Arc<SessionStore>, interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            store,
            interval,
            shutdown,
        }
    }

    /// Runs the sweep loop until shutdown.
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a fresh store is
        // not swept at startup.
        ticker.tick().await;

        info!(interval_secs = self.interval.as_secs(), "Session sweeper started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.store.sweep();
                    if removed > 0 {
                        info!(removed, remaining = self.store.len(), "Swept expired sessions");
                    } else {
                        debug!(remaining = self.store.len(), "Sweep found no expired sessions");
                    }
                }
                _ = self.shutdown.changed() => {
                    info!("Session sweeper stopping");
                    return;
                }
            }
        }
    }
}

//! The in-memory session record.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use cliphub_core::events::Notice;
use cliphub_core::types::id::{SessionToken, UserId};

/// A live session binding an opaque token to a user identity, an expiry,
/// and a private delivery channel.
///
/// The store owns the authoritative copy; clones handed to request
/// handlers are snapshots sharing the same channel. The channel closes —
/// observed as `None` by the receiving stream loop — once the store
/// entry and every broker entry holding a sender clone are gone, which
/// is exactly the removal path. Tokens are never reused, so a closed
/// channel is never resurrected.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session token (the cookie value and broker subscriber key).
    pub token: SessionToken,
    /// Owning user identity; also the broker fan-out key.
    pub user_id: UserId,
    /// Cached username for display.
    pub username: String,
    /// Expiry timestamp; monotonic non-decreasing under revitalization.
    pub expires_at: DateTime<Utc>,
    /// Sender half of the private delivery channel.
    notify_tx: mpsc::Sender<Notice>,
    /// Receiver half, parked until a stream connection claims it.
    notify_rx: Arc<Mutex<Option<mpsc::Receiver<Notice>>>>,
}

impl Session {
    /// Creates a session with a fresh bounded delivery channel.
    pub(crate) fn new(
        token: SessionToken,
        user_id: UserId,
        username: String,
        expires_at: DateTime<Utc>,
        channel_buffer: usize,
    ) -> Self {
        let (notify_tx, notify_rx) = mpsc::channel(channel_buffer);
        Self {
            token,
            user_id,
            username,
            expires_at,
            notify_tx,
            notify_rx: Arc::new(Mutex::new(Some(notify_rx))),
        }
    }

    /// Whether the session is expired at `now` (`now >= expires_at`).
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A sender clone for registering with a broker.
    pub fn sender(&self) -> mpsc::Sender<Notice> {
        self.notify_tx.clone()
    }

    /// Claims the delivery receiver for a stream connection.
    ///
    /// Returns `None` if another live stream already holds it — at most
    /// one stream per session.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<Notice>> {
        let mut slot = self.notify_rx.lock().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }

    /// Returns the receiver after a stream connection ends, so the client
    /// can reconnect and stream again on the same session.
    pub fn restore_receiver(&self, rx: mpsc::Receiver<Notice>) {
        let mut slot = self.notify_rx.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(rx);
    }

    /// A sender-free handle to the receiver slot.
    ///
    /// A long-lived stream must hold this instead of a `Session` clone:
    /// a clone carries the channel's sender, which would keep the channel
    /// open forever and hide session removal from the very stream that
    /// needs to observe it.
    pub fn receiver_slot(&self) -> ReceiverSlot {
        ReceiverSlot {
            slot: Arc::clone(&self.notify_rx),
        }
    }
}

/// Handle for parking a claimed receiver back on its session.
#[derive(Debug, Clone)]
pub struct ReceiverSlot {
    slot: Arc<Mutex<Option<mpsc::Receiver<Notice>>>>,
}

impl ReceiverSlot {
    /// Parks the receiver for the next stream connection to claim.
    pub fn restore(&self, rx: mpsc::Receiver<Notice>) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(rx);
    }
}

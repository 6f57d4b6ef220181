//! In-memory session store with sliding expiration.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::debug;

use cliphub_core::config::session::SessionConfig;
use cliphub_core::error::AppError;
use cliphub_core::result::AppResult;
use cliphub_core::types::id::{SessionToken, UserId};
use cliphub_realtime::EventBroker;

use super::record::Session;

/// Authoritative table of active sessions keyed by opaque token.
///
/// Constructed once at startup and shared by handle; there is no global
/// state. Removal is the single owner of channel close: `DashMap::remove`
/// yields the entry to exactly one caller, which then drops the broker
/// subscriptions holding the remaining sender clones. A second remove of
/// the same token is a no-op, so the channel can never be closed twice.
#[derive(Debug)]
pub struct SessionStore {
    /// token → session.
    sessions: DashMap<SessionToken, Session>,
    /// Brokers to unsubscribe from when a session is removed.
    brokers: Vec<Arc<EventBroker>>,
    /// Session timing configuration.
    config: SessionConfig,
    /// Delivery channel capacity for new sessions.
    channel_buffer: usize,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new(
        config: SessionConfig,
        channel_buffer: usize,
        brokers: Vec<Arc<EventBroker>>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            brokers,
            config,
            channel_buffer,
        }
    }

    /// Creates a session for a user and returns a snapshot of it.
    ///
    /// The token is 32 bytes of OS entropy, URL-safe base64 encoded.
    /// Expiry is now + the sliding window, or decades out for
    /// "remember me" sessions. Entropy-source failure is an internal
    /// error for this one request, not fatal to the process.
    pub fn create(&self, user_id: UserId, username: &str, remember: bool) -> AppResult<Session> {
        let token = mint_token()?;
        let now = Utc::now();
        let expires_at = if remember {
            now + Duration::days(self.config.remember_ttl_days as i64)
        } else {
            now + Duration::hours(self.config.ttl_hours as i64)
        };

        let session = Session::new(
            token.clone(),
            user_id,
            username.to_string(),
            expires_at,
            self.channel_buffer,
        );
        self.sessions.insert(token.clone(), session.clone());

        debug!(user_id = %user_id, session = %token, %expires_at, "Session created");
        Ok(session)
    }

    /// Looks up a session without touching its expiry.
    ///
    /// An expired entry is treated as absent even before the sweep gets
    /// to it.
    pub fn lookup(&self, token: &SessionToken) -> Option<Session> {
        let entry = self.sessions.get(token)?;
        if entry.expired(Utc::now()) {
            return None;
        }
        Some(entry.clone())
    }

    /// Extends a still-alive session to now + the sliding window and
    /// returns the updated snapshot. Expired or unknown tokens are
    /// treated as absent.
    ///
    /// Expiry never decreases: a "remember me" session keeps its
    /// far-future expiry.
    pub fn revitalize(&self, token: &SessionToken) -> Option<Session> {
        let mut entry = self.sessions.get_mut(token)?;
        let now = Utc::now();
        if entry.expired(now) {
            return None;
        }

        let extended = now + Duration::hours(self.config.ttl_hours as i64);
        if extended > entry.expires_at {
            entry.expires_at = extended;
        }
        Some(entry.clone())
    }

    /// Removes a session and closes its delivery channel.
    ///
    /// Exactly one caller wins the removal; the losers get `None`.
    /// Broker subscriptions for the token are dropped so the channel
    /// closes once the returned snapshot goes out of scope.
    pub fn remove(&self, token: &SessionToken) -> Option<Session> {
        let (_, session) = self.sessions.remove(token)?;
        for broker in &self.brokers {
            broker.unsubscribe(session.user_id, token);
        }
        debug!(user_id = %session.user_id, session = %token, "Session removed");
        Some(session)
    }

    /// Removes every session belonging to a user. Returns how many were
    /// removed.
    pub fn remove_user_sessions(&self, user_id: UserId) -> usize {
        let tokens: Vec<SessionToken> = self
            .sessions
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .map(|e| e.key().clone())
            .collect();

        tokens
            .into_iter()
            .filter(|token| self.remove(token).is_some())
            .count()
    }

    /// Removes every session whose expiry is at or before now.
    ///
    /// The expiry predicate is re-checked under the exclusive entry lock,
    /// so a session revitalized between the scan and the removal
    /// survives. Returns how many sessions were removed.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let candidates: Vec<SessionToken> = self
            .sessions
            .iter()
            .filter(|e| e.value().expired(now))
            .map(|e| e.key().clone())
            .collect();

        let mut removed = 0;
        for token in candidates {
            if let Some((_, session)) = self.sessions.remove_if(&token, |_, s| s.expired(now)) {
                for broker in &self.brokers {
                    broker.unsubscribe(session.user_id, &token);
                }
                removed += 1;
            }
        }
        removed
    }

    /// Number of sessions currently in the table (live or awaiting sweep).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Forces a session's expiry into the past.
    #[cfg(test)]
    pub(crate) fn force_expire(&self, token: &SessionToken) {
        if let Some(mut entry) = self.sessions.get_mut(token) {
            entry.expires_at = Utc::now() - Duration::hours(1);
        }
    }
}

/// Draws 32 bytes from the OS CSPRNG and encodes them URL-safe.
fn mint_token() -> AppResult<SessionToken> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::internal(format!("Entropy source failure: {e}")))?;
    Ok(SessionToken::new(URL_SAFE_NO_PAD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliphub_core::events::Topic;
    use uuid::Uuid;

    fn store() -> SessionStore {
        SessionStore::new(SessionConfig::default(), 8, Vec::new())
    }

    fn store_with_brokers() -> (SessionStore, Arc<EventBroker>, Arc<EventBroker>) {
        let clip = Arc::new(EventBroker::new(Topic::Clipboard));
        let files = Arc::new(EventBroker::new(Topic::Files));
        let store = SessionStore::new(
            SessionConfig::default(),
            8,
            vec![Arc::clone(&clip), Arc::clone(&files)],
        );
        (store, clip, files)
    }

    #[test]
    fn create_and_lookup() {
        let store = store();
        let user = Uuid::new_v4();
        let session = store.create(user, "alice", false).unwrap();

        let found = store.lookup(&session.token).unwrap();
        assert_eq!(found.user_id, user);
        assert_eq!(found.username, "alice");
        assert!(found.expires_at > Utc::now());
    }

    #[test]
    fn tokens_are_unique_and_long() {
        let store = store();
        let user = Uuid::new_v4();
        let a = store.create(user, "alice", false).unwrap();
        let b = store.create(user, "alice", false).unwrap();
        assert_ne!(a.token, b.token);
        // 32 bytes, URL-safe base64 without padding.
        assert_eq!(a.token.expose().len(), 43);
    }

    #[test]
    fn remember_me_expires_decades_out() {
        let store = store();
        let session = store.create(Uuid::new_v4(), "alice", true).unwrap();
        assert!(session.expires_at > Utc::now() + Duration::days(365 * 40));
    }

    #[test]
    fn lookup_rejects_expired_before_sweep() {
        let store = store();
        let session = store.create(Uuid::new_v4(), "alice", false).unwrap();
        store.force_expire(&session.token);

        assert!(store.lookup(&session.token).is_none());
        assert!(store.revitalize(&session.token).is_none());
        // Entry still physically present until the sweep.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn revitalize_extends_expiry() {
        let store = store();
        let session = store.create(Uuid::new_v4(), "alice", false).unwrap();
        let before = session.expires_at;

        std::thread::sleep(std::time::Duration::from_millis(5));
        let renewed = store.revitalize(&session.token).unwrap();
        assert!(renewed.expires_at > before);
    }

    #[test]
    fn revitalize_never_shortens_remember_me() {
        let store = store();
        let session = store.create(Uuid::new_v4(), "alice", true).unwrap();
        let far_future = session.expires_at;

        let renewed = store.revitalize(&session.token).unwrap();
        assert_eq!(renewed.expires_at, far_future);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = store();
        let session = store.create(Uuid::new_v4(), "alice", false).unwrap();

        assert!(store.remove(&session.token).is_some());
        assert!(store.remove(&session.token).is_none());
    }

    #[tokio::test]
    async fn remove_closes_the_delivery_channel() {
        let (store, clip, _files) = store_with_brokers();
        let user = Uuid::new_v4();
        let session = store.create(user, "alice", false).unwrap();
        let mut rx = session.take_receiver().unwrap();

        clip.subscribe(user, session.token.clone(), session.sender());
        assert_eq!(clip.publish(user, 1), 1);
        assert_eq!(rx.recv().await.unwrap().value, 1);

        let removed = store.remove(&session.token).unwrap();
        drop(removed);
        drop(session);

        // All senders gone: store entry, broker entry, local snapshots.
        assert!(rx.recv().await.is_none());
        assert_eq!(clip.subscriber_count(user), 0);
    }

    #[test]
    fn sweep_removes_only_expired_sessions() {
        let store = store();
        let user = Uuid::new_v4();
        let stale = store.create(user, "alice", false).unwrap();
        let live = store.create(user, "alice", false).unwrap();
        store.force_expire(&stale.token);

        assert_eq!(store.sweep(), 1);
        assert!(store.lookup(&stale.token).is_none());
        assert!(store.lookup(&live.token).is_some());
    }

    #[test]
    fn revitalized_session_survives_the_next_sweep() {
        let store = store();
        let session = store.create(Uuid::new_v4(), "alice", false).unwrap();

        store.revitalize(&session.token).unwrap();
        assert_eq!(store.sweep(), 0);
        assert!(store.lookup(&session.token).is_some());
    }

    #[test]
    fn remove_user_sessions_terminates_all_devices() {
        let store = store();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.create(alice, "alice", false).unwrap();
        store.create(alice, "alice", false).unwrap();
        let bobs = store.create(bob, "bob", false).unwrap();

        assert_eq!(store.remove_user_sessions(alice), 2);
        assert_eq!(store.len(), 1);
        assert!(store.lookup(&bobs.token).is_some());
    }

    #[test]
    fn second_stream_cannot_claim_the_receiver() {
        let store = store();
        let session = store.create(Uuid::new_v4(), "alice", false).unwrap();

        let rx = session.take_receiver().unwrap();
        assert!(session.take_receiver().is_none());

        session.restore_receiver(rx);
        assert!(session.take_receiver().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_lifecycle_operations_do_not_corrupt_the_table() {
        let (store, clip, _files) = store_with_brokers();
        let store = Arc::new(store);
        let user = Uuid::new_v4();
        let mut handles = Vec::new();

        for _ in 0..16 {
            let store = Arc::clone(&store);
            let clip = Arc::clone(&clip);
            handles.push(tokio::spawn(async move {
                let session = store.create(user, "alice", false).unwrap();
                clip.subscribe(user, session.token.clone(), session.sender());
                store.lookup(&session.token);
                store.revitalize(&session.token);
                clip.publish(user, 1);
                tokio::task::yield_now().await;
                // Both a direct remove and a sweep may race here; exactly
                // one path wins per token.
                store.sweep();
                store.remove(&session.token);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert!(store.is_empty());
        assert_eq!(clip.subscriber_count(user), 0);
    }
}

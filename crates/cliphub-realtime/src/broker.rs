//! Per-topic event broker.

use std::collections::HashMap;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use cliphub_core::events::{Notice, Topic};
use cliphub_core::types::id::{SessionToken, UserId};

/// Fans a published event out to every delivery channel currently
/// subscribed under a user identity.
///
/// The subscriber table maps user id → (session token → sender). Multiple
/// sessions of the same user each hold their own entry, so every open
/// device/tab is notified independently.
///
/// Structural mutation and fan-out iteration are serialized per shard by
/// the map itself: `publish` iterates a user's entry under a shard read
/// guard while `subscribe`/`unsubscribe` take the shard write guard, so
/// the table is never mutated mid-iteration. Deliveries use `try_send`
/// on bounded channels — a stalled subscriber drops notices instead of
/// wedging the publisher.
#[derive(Debug)]
pub struct EventBroker {
    /// Which topic family this broker serves.
    topic: Topic,
    /// user id → (session token → delivery sender).
    subscribers: DashMap<UserId, HashMap<SessionToken, mpsc::Sender<Notice>>>,
}

impl EventBroker {
    /// Creates an empty broker for a topic family.
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            subscribers: DashMap::new(),
        }
    }

    /// The topic family this broker serves.
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Registers a session's delivery channel under its user identity.
    ///
    /// Subscribing the same (user, token) pair again replaces the sender;
    /// the token is the subscriber key, so a session has at most one
    /// entry per broker.
    pub fn subscribe(&self, user_id: UserId, token: SessionToken, sender: mpsc::Sender<Notice>) {
        debug!(topic = %self.topic, user_id = %user_id, session = %token, "Subscribing");
        self.subscribers
            .entry(user_id)
            .or_default()
            .insert(token, sender);
    }

    /// Removes the entry for (user, token). No-op when absent — the
    /// connection may already be gone.
    ///
    /// Deliberately synchronous so stream guards can unsubscribe from
    /// `Drop`.
    pub fn unsubscribe(&self, user_id: UserId, token: &SessionToken) {
        if let Some(mut entry) = self.subscribers.get_mut(&user_id) {
            if entry.remove(token).is_some() {
                debug!(topic = %self.topic, user_id = %user_id, session = %token, "Unsubscribed");
            }
            if entry.is_empty() {
                drop(entry);
                self.subscribers.remove_if(&user_id, |_, m| m.is_empty());
            }
        }
    }

    /// Delivers `value` to every channel currently registered under
    /// `user_id`. Returns the number of successful deliveries.
    ///
    /// Best-effort, at-most-once per currently-subscribed channel: a full
    /// buffer drops the notice with a warning, a closed channel is simply
    /// skipped (its entry is torn down by the unsubscribe/removal path).
    /// Zero subscribers is a no-op.
    pub fn publish(&self, user_id: UserId, value: u8) -> usize {
        let notice = Notice {
            topic: self.topic,
            value,
        };

        let Some(entry) = self.subscribers.get(&user_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (token, sender) in entry.iter() {
            match sender.try_send(notice) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        topic = %self.topic,
                        user_id = %user_id,
                        session = %token,
                        "Delivery channel full, dropping notice"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(
                        topic = %self.topic,
                        user_id = %user_id,
                        session = %token,
                        "Delivery channel closed, skipping"
                    );
                }
            }
        }
        delivered
    }

    /// Number of channels currently subscribed under a user.
    pub fn subscriber_count(&self, user_id: UserId) -> usize {
        self.subscribers
            .get(&user_id)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Number of users with at least one subscription.
    pub fn user_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn channel() -> (mpsc::Sender<Notice>, mpsc::Receiver<Notice>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn publish_reaches_subscriber_exactly_once() {
        let broker = EventBroker::new(Topic::Clipboard);
        let user = Uuid::new_v4();
        let token = SessionToken::new("t1");
        let (tx, mut rx) = channel();

        broker.subscribe(user, token, tx);
        assert_eq!(broker.publish(user, 1), 1);

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.topic, Topic::Clipboard);
        assert_eq!(notice.value, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribed_channel_receives_nothing_more() {
        let broker = EventBroker::new(Topic::Clipboard);
        let user = Uuid::new_v4();
        let token = SessionToken::new("t1");
        let (tx, mut rx) = channel();

        broker.subscribe(user, token.clone(), tx);
        broker.publish(user, 1);
        broker.unsubscribe(user, &token);
        assert_eq!(broker.publish(user, 2), 0);

        assert_eq!(rx.recv().await.unwrap().value, 1);
        assert!(rx.try_recv().is_err());
        assert_eq!(broker.user_count(), 0);
    }

    #[tokio::test]
    async fn fan_out_to_all_sessions_of_a_user() {
        let broker = EventBroker::new(Topic::Files);
        let user = Uuid::new_v4();
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();

        broker.subscribe(user, SessionToken::new("s1"), tx1);
        broker.subscribe(user, SessionToken::new("s2"), tx2);

        assert_eq!(broker.publish(user, 1), 2);
        assert_eq!(rx1.recv().await.unwrap().value, 1);
        assert_eq!(rx2.recv().await.unwrap().value, 1);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let broker = EventBroker::new(Topic::Clipboard);
        assert_eq!(broker.publish(Uuid::new_v4(), 1), 0);
    }

    #[tokio::test]
    async fn publish_does_not_cross_users() {
        let broker = EventBroker::new(Topic::Clipboard);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let (tx, mut rx) = channel();

        broker.subscribe(bob, SessionToken::new("b1"), tx);
        assert_eq!(broker.publish(alice, 1), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let broker = EventBroker::new(Topic::Clipboard);
        let user = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(1);

        broker.subscribe(user, SessionToken::new("t1"), tx);
        assert_eq!(broker.publish(user, 1), 1);
        // Buffer full: the second publish must return immediately with a drop.
        assert_eq!(broker.publish(user, 2), 0);

        assert_eq!(rx.recv().await.unwrap().value, 1);
    }

    #[tokio::test]
    async fn closed_channel_is_skipped_without_panic() {
        let broker = EventBroker::new(Topic::Files);
        let user = Uuid::new_v4();
        let (tx, rx) = channel();
        drop(rx);

        broker.subscribe(user, SessionToken::new("t1"), tx);
        assert_eq!(broker.publish(user, 1), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_subscribe_publish_unsubscribe_is_consistent() {
        use std::sync::Arc;

        let broker = Arc::new(EventBroker::new(Topic::Clipboard));
        let user = Uuid::new_v4();
        let mut handles = Vec::new();

        for i in 0..32 {
            let broker = Arc::clone(&broker);
            handles.push(tokio::spawn(async move {
                let token = SessionToken::new(format!("s{i}"));
                let (tx, mut rx) = mpsc::channel(64);
                broker.subscribe(user, token.clone(), tx);
                for v in 0..16 {
                    broker.publish(user, v);
                    tokio::task::yield_now().await;
                }
                // Drain whatever arrived, then drop out.
                while rx.try_recv().is_ok() {}
                broker.unsubscribe(user, &token);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // Every subscribe was paired with an unsubscribe.
        assert_eq!(broker.subscriber_count(user), 0);
        assert_eq!(broker.user_count(), 0);
    }
}

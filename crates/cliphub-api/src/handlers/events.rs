//! SSE event stream handler.
//!
//! One stream per session carries notices from both brokers; each frame
//! is named by its topic so the client knows which view to refresh.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use cliphub_auth::session::record::{ReceiverSlot, Session};
use cliphub_auth::session::store::SessionStore;
use cliphub_core::error::AppError;
use cliphub_core::events::Notice;
use cliphub_core::types::id::{SessionToken, UserId};
use cliphub_realtime::EventBroker;

use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// GET /api/events
///
/// Claims the session's delivery receiver (at most one live stream per
/// session — a concurrent second stream gets 409), registers the session
/// with both brokers, and streams until the client disconnects or the
/// session is removed.
pub async fn events(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Sse<KeepAliveStream<EventStream>>, ApiError> {
    let brokers = vec![
        Arc::clone(&state.clip_broker),
        Arc::clone(&state.file_broker),
    ];
    let stream = open_stream(&state.session_store, brokers, &session)?;

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(state.config.realtime.keep_alive_seconds)),
    ))
}

/// Claims the session's receiver and registers it with the brokers.
///
/// A logout on another device can land between the claim and the broker
/// registration; the store is re-checked after registering, and if the
/// session is gone the brokers are detached again and the stream never
/// opens. The spent receiver is dropped, not parked — the token will not
/// be seen again.
fn open_stream(
    store: &SessionStore,
    brokers: Vec<Arc<EventBroker>>,
    session: &Session,
) -> Result<EventStream, AppError> {
    let rx = session
        .take_receiver()
        .ok_or_else(|| AppError::conflict("An event stream is already open for this session"))?;

    for broker in &brokers {
        broker.subscribe(session.user_id, session.token.clone(), session.sender());
    }

    if store.lookup(&session.token).is_none() {
        for broker in &brokers {
            broker.unsubscribe(session.user_id, &session.token);
        }
        return Err(AppError::unauthorized("Session expired"));
    }

    debug!(user_id = %session.user_id, session = %session.token, "Event stream opened");
    Ok(EventStream {
        user_id: session.user_id,
        token: session.token.clone(),
        slot: session.receiver_slot(),
        brokers,
        rx: Some(rx),
    })
}

/// The live half of one SSE connection.
///
/// Deliberately holds no `Session` clone: a clone carries the channel's
/// sender, which would keep the channel open and hide session removal
/// from this very stream. Yields one frame per notice; ends when the
/// delivery channel closes, which only happens when the session is
/// removed. Dropping the stream — client disconnect or normal end —
/// detaches the session from both brokers and parks the receiver back on
/// the session so a reconnect can claim it. Unsubscribe is idempotent,
/// so the removal path and the drop guard can both run.
pub struct EventStream {
    user_id: UserId,
    token: SessionToken,
    slot: ReceiverSlot,
    brokers: Vec<Arc<EventBroker>>,
    rx: Option<mpsc::Receiver<Notice>>,
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(rx) = this.rx.as_mut() else {
            return Poll::Ready(None);
        };

        match rx.poll_recv(cx) {
            Poll::Ready(Some(notice)) => Poll::Ready(Some(Ok(Event::default()
                .event(notice.topic.sse_event())
                .data(notice.value.to_string())))),
            Poll::Ready(None) => {
                // Session removed; the receiver is spent, do not park it.
                this.rx = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        for broker in &self.brokers {
            broker.unsubscribe(self.user_id, &self.token);
        }
        if let Some(rx) = self.rx.take() {
            self.slot.restore(rx);
        }
        debug!(user_id = %self.user_id, session = %self.token, "Event stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliphub_core::config::session::SessionConfig;
    use cliphub_core::error::ErrorKind;
    use cliphub_core::events::Topic;
    use futures::StreamExt;
    use uuid::Uuid;

    fn stream_for(store: &SessionStore, brokers: Vec<Arc<EventBroker>>) -> (Session, EventStream) {
        let session = store.create(Uuid::new_v4(), "alice", false).unwrap();
        let stream = open_stream(store, brokers, &session).unwrap();
        (session, stream)
    }

    #[tokio::test]
    async fn yields_one_frame_per_notice() {
        let clip = Arc::new(EventBroker::new(Topic::Clipboard));
        let store = SessionStore::new(SessionConfig::default(), 8, vec![Arc::clone(&clip)]);
        let (session, mut stream) = stream_for(&store, vec![Arc::clone(&clip)]);

        assert_eq!(clip.publish(session.user_id, 1), 1);
        assert!(stream.next().await.is_some());
    }

    #[tokio::test]
    async fn ends_when_the_session_is_removed() {
        let clip = Arc::new(EventBroker::new(Topic::Clipboard));
        let store = SessionStore::new(SessionConfig::default(), 8, vec![Arc::clone(&clip)]);
        let (session, mut stream) = stream_for(&store, vec![Arc::clone(&clip)]);

        let removed = store.remove(&session.token).unwrap();
        drop(removed);
        drop(session);

        // The stream holds no sender of its own, so the channel is closed.
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn drop_unsubscribes_and_parks_the_receiver() {
        let clip = Arc::new(EventBroker::new(Topic::Clipboard));
        let store = SessionStore::new(SessionConfig::default(), 8, vec![Arc::clone(&clip)]);
        let (session, stream) = stream_for(&store, vec![Arc::clone(&clip)]);

        drop(stream);
        assert_eq!(clip.subscriber_count(session.user_id), 0);
        // A reconnect can claim the receiver again.
        assert!(session.take_receiver().is_some());
    }

    #[tokio::test]
    async fn logout_racing_stream_setup_leaves_no_subscription() {
        let clip = Arc::new(EventBroker::new(Topic::Clipboard));
        let store = SessionStore::new(SessionConfig::default(), 8, vec![Arc::clone(&clip)]);
        let session = store.create(Uuid::new_v4(), "alice", false).unwrap();

        // The other device's logout wins before this stream registers.
        store.remove(&session.token).unwrap();

        let Err(err) = open_stream(&store, vec![Arc::clone(&clip)], &session) else {
            panic!("stream opened for a removed session");
        };
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(clip.subscriber_count(session.user_id), 0);
    }
}

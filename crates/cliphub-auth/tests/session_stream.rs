//! End-to-end session lifecycle against the store and both brokers,
//! exercising the same wiring the HTTP layer uses.

use std::sync::Arc;

use uuid::Uuid;

use cliphub_auth::SessionStore;
use cliphub_core::config::session::SessionConfig;
use cliphub_core::events::Topic;
use cliphub_realtime::EventBroker;

fn wiring() -> (Arc<SessionStore>, Arc<EventBroker>, Arc<EventBroker>) {
    let clip = Arc::new(EventBroker::new(Topic::Clipboard));
    let files = Arc::new(EventBroker::new(Topic::Files));
    let store = Arc::new(SessionStore::new(
        SessionConfig::default(),
        8,
        vec![Arc::clone(&clip), Arc::clone(&files)],
    ));
    (store, clip, files)
}

#[tokio::test]
async fn login_stream_publish_logout() {
    let (store, clip, files) = wiring();
    let user = Uuid::new_v4();

    // Login: mint a session and attach its channel to both brokers, as
    // the stream handler does when the client connects.
    let session = store.create(user, "alice", false).unwrap();
    let mut rx = session.take_receiver().unwrap();
    clip.subscribe(user, session.token.clone(), session.sender());
    files.subscribe(user, session.token.clone(), session.sender());

    // A clipboard mutation reaches the stream exactly once, tagged with
    // its topic.
    assert_eq!(clip.publish(user, 1), 1);
    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.topic, Topic::Clipboard);

    // A file mutation arrives on the same channel with the other tag.
    assert_eq!(files.publish(user, 1), 1);
    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.topic, Topic::Files);

    // Logout: the store removal detaches both brokers, and once the
    // session snapshots drop, the stream observes end-of-channel.
    let removed = store.remove(&session.token).unwrap();
    drop(removed);
    drop(session);
    assert!(rx.recv().await.is_none());

    // Publishing after logout reaches nobody.
    assert_eq!(clip.publish(user, 1), 0);
    assert_eq!(files.publish(user, 1), 0);
}

#[tokio::test]
async fn two_devices_fan_out_independently() {
    let (store, clip, _files) = wiring();
    let user = Uuid::new_v4();

    let phone = store.create(user, "alice", false).unwrap();
    let laptop = store.create(user, "alice", false).unwrap();
    let mut phone_rx = phone.take_receiver().unwrap();
    let mut laptop_rx = laptop.take_receiver().unwrap();
    clip.subscribe(user, phone.token.clone(), phone.sender());
    clip.subscribe(user, laptop.token.clone(), laptop.sender());

    // Both devices see the update.
    assert_eq!(clip.publish(user, 1), 2);
    assert!(phone_rx.recv().await.is_some());
    assert!(laptop_rx.recv().await.is_some());

    // Logging out the phone leaves the laptop streaming.
    let removed = store.remove(&phone.token).unwrap();
    drop(removed);
    drop(phone);
    assert!(phone_rx.recv().await.is_none());

    assert_eq!(clip.publish(user, 1), 1);
    assert!(laptop_rx.recv().await.is_some());
}

#[tokio::test]
async fn reconnect_reclaims_the_receiver() {
    let (store, clip, _files) = wiring();
    let user = Uuid::new_v4();
    let session = store.create(user, "alice", false).unwrap();

    // First stream claims the channel; a second concurrent stream cannot.
    let rx = session.take_receiver().unwrap();
    assert!(session.take_receiver().is_none());

    // The stream ends (client disconnect) and parks the receiver again.
    session.restore_receiver(rx);

    // The reconnecting stream picks up where the first left off.
    let mut rx = session.take_receiver().unwrap();
    clip.subscribe(user, session.token.clone(), session.sender());
    assert_eq!(clip.publish(user, 1), 1);
    assert!(rx.recv().await.is_some());
}

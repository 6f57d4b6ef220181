//! Real-time notification fan-out.
//!
//! One [`EventBroker`] instance exists per notification topic family;
//! publishers are ordinary request handlers, subscribers are the
//! long-lived streaming connections holding a session's delivery channel.

pub mod broker;

pub use broker::EventBroker;

//! Session lifecycle: record, in-memory store, login flows, periodic sweep.

pub mod manager;
pub mod record;
pub mod store;
pub mod sweeper;

pub use manager::SessionManager;
pub use record::Session;
pub use store::SessionStore;
pub use sweeper::SessionSweeper;

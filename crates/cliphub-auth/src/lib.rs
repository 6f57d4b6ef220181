//! Authentication and session lifecycle management.

pub mod password;
pub mod session;

pub use password::hasher::PasswordHasher;
pub use session::manager::SessionManager;
pub use session::record::Session;
pub use session::store::SessionStore;
pub use session::sweeper::SessionSweeper;

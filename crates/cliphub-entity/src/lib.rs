//! Persistent domain models.

pub mod clip;
pub mod file;
pub mod user;

pub use clip::Clip;
pub use file::StoredFile;
pub use user::User;

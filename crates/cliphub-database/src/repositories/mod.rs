//! Repository implementations, one per table.

pub mod clip;
pub mod file;
pub mod user;

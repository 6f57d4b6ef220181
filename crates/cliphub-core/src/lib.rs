//! Shared foundation for ClipHub: error types, configuration, event types.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

//! HTTP request handlers, organized by domain.

pub mod auth;
pub mod clip;
pub mod events;
pub mod file;
pub mod health;
pub mod user;

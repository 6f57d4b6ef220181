//! Password hashing.

pub mod hasher;

pub use hasher::{MIN_PASSWORD_LENGTH, PasswordHasher};

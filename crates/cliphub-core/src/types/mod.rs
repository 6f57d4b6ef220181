//! Shared primitive types.

pub mod id;

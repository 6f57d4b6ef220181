//! Per-user on-disk file storage.

pub mod manager;

pub use manager::StorageManager;

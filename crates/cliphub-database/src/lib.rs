//! PostgreSQL access layer: connection pool, migrations, repositories.

pub mod connection;
pub mod migration;
pub mod repositories;

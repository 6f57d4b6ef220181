//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use cliphub_auth::password::hasher::PasswordHasher;
use cliphub_auth::session::manager::SessionManager;
use cliphub_auth::session::store::SessionStore;
use cliphub_core::config::AppConfig;
use cliphub_realtime::EventBroker;
use cliphub_storage::manager::StorageManager;

use cliphub_database::repositories::clip::ClipRepository;
use cliphub_database::repositories::file::FileRepository;
use cliphub_database::repositories::user::UserRepository;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Per-user on-disk file storage
    pub storage: Arc<StorageManager>,

    // ── Auth & sessions ──────────────────────────────────────
    /// Password hasher (Argon2)
    pub password_hasher: Arc<PasswordHasher>,
    /// In-memory session table
    pub session_store: Arc<SessionStore>,
    /// Login/register/account-deletion orchestration
    pub session_manager: Arc<SessionManager>,

    // ── Realtime ─────────────────────────────────────────────
    /// Broker for clipboard change notices
    pub clip_broker: Arc<EventBroker>,
    /// Broker for file change notices
    pub file_broker: Arc<EventBroker>,

    // ── Repositories ─────────────────────────────────────────
    /// User repository
    pub user_repo: Arc<UserRepository>,
    /// Clipboard repository
    pub clip_repo: Arc<ClipRepository>,
    /// File metadata repository
    pub file_repo: Arc<FileRepository>,
}

//! ClipHub Server — multi-user clipboard and file sharing.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use cliphub_api::AppState;
use cliphub_core::config::AppConfig;
use cliphub_core::error::AppError;
use cliphub_core::events::Topic;

#[tokio::main]
async fn main() {
    let env = std::env::var("CLIPHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ClipHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db_pool = cliphub_database::connection::create_pool(&config.database).await?;
    cliphub_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: File storage root ────────────────────────────────
    let storage =
        Arc::new(cliphub_storage::manager::StorageManager::new(config.storage.root.clone()).await?);

    // ── Step 3: Repositories ─────────────────────────────────────
    let user_repo = Arc::new(cliphub_database::repositories::user::UserRepository::new(
        db_pool.clone(),
    ));
    let clip_repo = Arc::new(cliphub_database::repositories::clip::ClipRepository::new(
        db_pool.clone(),
    ));
    let file_repo = Arc::new(cliphub_database::repositories::file::FileRepository::new(
        db_pool.clone(),
    ));

    // ── Step 4: Realtime brokers ─────────────────────────────────
    let clip_broker = Arc::new(cliphub_realtime::EventBroker::new(Topic::Clipboard));
    let file_broker = Arc::new(cliphub_realtime::EventBroker::new(Topic::Files));

    // ── Step 5: Sessions ─────────────────────────────────────────
    let password_hasher = Arc::new(cliphub_auth::password::hasher::PasswordHasher::new());
    let session_store = Arc::new(cliphub_auth::session::store::SessionStore::new(
        config.session.clone(),
        config.realtime.channel_buffer_size,
        vec![Arc::clone(&clip_broker), Arc::clone(&file_broker)],
    ));
    let session_manager = Arc::new(cliphub_auth::session::manager::SessionManager::new(
        user_repo.as_ref().clone(),
        password_hasher.as_ref().clone(),
        Arc::clone(&session_store),
    ));

    // ── Step 6: Session sweeper ──────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = cliphub_auth::session::sweeper::SessionSweeper::new(
        Arc::clone(&session_store),
        Duration::from_secs(config.session.sweep_interval_minutes * 60),
        shutdown_rx,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    // ── Step 7: HTTP server ──────────────────────────────────────
    let bind_addr = config.server.bind_addr();
    let state = AppState {
        config: Arc::new(config),
        db_pool,
        storage,
        password_hasher,
        session_store,
        session_manager,
        clip_broker,
        file_broker,
        user_repo,
        clip_repo,
        file_repo,
    };
    let app = cliphub_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {bind_addr}: {e}")))?;
    tracing::info!("Listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server failed: {e}")))?;

    // ── Step 8: Drain background tasks ───────────────────────────
    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        tracing::warn!("Sweeper task ended abnormally: {e}");
    }

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

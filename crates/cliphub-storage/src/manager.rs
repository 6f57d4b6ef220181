//! Filesystem layout and I/O for stored files.
//!
//! Files live at `{root}/{user_id}/{file_id}` with no extension; the
//! original file name is a database column, never a path component, so
//! client-supplied names cannot influence where bytes land on disk.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tracing::{debug, warn};

use cliphub_core::result::AppResult;
use cliphub_core::types::id::UserId;

/// Manages the per-user directory tree under a single storage root.
#[derive(Debug, Clone)]
pub struct StorageManager {
    root: PathBuf,
}

impl StorageManager {
    /// Creates a manager and ensures the root directory exists.
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Storage root ready");
        Ok(Self { root })
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute-ish path of one stored file.
    pub fn file_path(&self, user_id: UserId, file_id: i64) -> PathBuf {
        self.user_dir(user_id).join(file_id.to_string())
    }

    fn user_dir(&self, user_id: UserId) -> PathBuf {
        self.root.join(user_id.to_string())
    }

    /// Creates the file for a new upload, creating the user directory on
    /// first use.
    pub async fn create_file(&self, user_id: UserId, file_id: i64) -> AppResult<File> {
        fs::create_dir_all(self.user_dir(user_id)).await?;
        let path = self.file_path(user_id, file_id);
        let file = File::create(&path).await?;
        debug!(user_id = %user_id, file_id, path = %path.display(), "File created");
        Ok(file)
    }

    /// Opens a stored file for a download stream.
    pub async fn open_file(&self, user_id: UserId, file_id: i64) -> AppResult<File> {
        let file = File::open(self.file_path(user_id, file_id)).await?;
        Ok(file)
    }

    /// Removes one stored file. Missing files are logged and skipped so a
    /// half-failed earlier delete does not wedge the row cleanup.
    pub async fn remove_file(&self, user_id: UserId, file_id: i64) -> AppResult<()> {
        let path = self.file_path(user_id, file_id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(user_id = %user_id, file_id, "File removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(user_id = %user_id, file_id, "File already absent on disk");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a user's whole directory, for account deletion. A user who
    /// never uploaded has no directory, which is fine.
    pub async fn remove_user_dir(&self, user_id: UserId) -> AppResult<()> {
        match fs::remove_dir_all(self.user_dir(user_id)).await {
            Ok(()) => {
                debug!(user_id = %user_id, "User directory removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use uuid::Uuid;

    async fn manager() -> StorageManager {
        let root = std::env::temp_dir().join(format!("cliphub-test-{}", Uuid::new_v4()));
        StorageManager::new(root).await.unwrap()
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let storage = manager().await;
        let user = Uuid::new_v4();

        let mut file = storage.create_file(user, 1).await.unwrap();
        file.write_all(b"clipboard payload").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        let mut file = storage.open_file(user, 1).await.unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"clipboard payload");

        fs::remove_dir_all(storage.root()).await.unwrap();
    }

    #[tokio::test]
    async fn files_are_isolated_per_user() {
        let storage = manager().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let mut file = storage.create_file(alice, 7).await.unwrap();
        file.write_all(b"alice").await.unwrap();
        drop(file);

        // Same id under a different user is a different path.
        assert!(storage.open_file(bob, 7).await.is_err());

        fs::remove_dir_all(storage.root()).await.unwrap();
    }

    #[tokio::test]
    async fn remove_file_tolerates_missing_files() {
        let storage = manager().await;
        let user = Uuid::new_v4();

        storage.remove_file(user, 42).await.unwrap();

        fs::remove_dir_all(storage.root()).await.unwrap();
    }

    #[tokio::test]
    async fn remove_user_dir_deletes_everything() {
        let storage = manager().await;
        let user = Uuid::new_v4();

        storage.create_file(user, 1).await.unwrap();
        storage.create_file(user, 2).await.unwrap();
        storage.remove_user_dir(user).await.unwrap();

        assert!(storage.open_file(user, 1).await.is_err());
        // Second removal is a no-op.
        storage.remove_user_dir(user).await.unwrap();

        fs::remove_dir_all(storage.root()).await.unwrap();
    }
}

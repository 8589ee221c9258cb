//! Filesystem-backed `ObjectStore` (§4.3). Keys are relative paths under
//! `base_dir`; `/` in a key becomes a directory separator, mirroring the
//! `skills/{owner}/{repo}/SKILL.md` and `cache/{name}.json` layouts in §6.

use std::path::PathBuf;

use skillreg_core::repository::object_store::ObjectStore;
use skillreg_types::error::ApiError;

pub struct FilesystemObjectStore {
    base_dir: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, ApiError> {
        if key.contains("..") {
            return Err(ApiError::Validation(format!("invalid object key: {key}")));
        }
        Ok(self.base_dir.join(key))
    }
}

impl ObjectStore for FilesystemObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ApiError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::Internal(format!("failed to create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to write {}: {e}", path.display())))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ApiError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ApiError::Internal(format!("failed to read {}: {err}", path.display()))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), ApiError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ApiError::Internal(format!("failed to delete {}: {err}", path.display()))),
        }
    }
}

/// Disk-based blob storage backend
use crate::{
    blob_store::BlobBackend,
    error::{WishError, WishResult},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores blobs on the local filesystem. The file name inside each folder is
/// sharded by its first two characters so a busy folder stays browsable.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Map a storage path to a file path
    ///
    /// `videos/ab12_clip.mp4` -> `{base}/videos/ab/ab12_clip.mp4`
    fn get_blob_path(&self, path: &str) -> WishResult<PathBuf> {
        let segments: Vec<&str> = path.split('/').collect();
        let valid = segments
            .iter()
            .all(|s| !s.is_empty() && *s != "." && *s != ".." && !s.contains('\\'));
        if !valid {
            return Err(WishError::InvalidInput(format!("Invalid storage path: {}", path)));
        }

        let (file_name, folders) = match segments.split_last() {
            Some(split) => split,
            None => return Err(WishError::InvalidInput("Empty storage path".to_string())),
        };

        let mut blob_path = self.base_path.clone();
        for folder in folders {
            blob_path.push(folder);
        }
        let shard: String = file_name.chars().take(2).collect();
        if shard.chars().count() == 2 {
            blob_path.push(shard);
        } else {
            blob_path.push("_");
        }
        blob_path.push(file_name);

        Ok(blob_path)
    }

    /// Ensure the directory for a blob exists
    async fn ensure_blob_dir(&self, path: &str) -> WishResult<PathBuf> {
        let blob_path = self.get_blob_path(path)?;
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                WishError::BlobStorage(format!("Failed to create blob directory: {}", e))
            })?;
        }
        Ok(blob_path)
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, path: &str, data: Vec<u8>, _content_type: &str) -> WishResult<()> {
        let blob_path = self.ensure_blob_dir(path).await?;

        fs::write(&blob_path, data).await.map_err(|e| {
            WishError::BlobStorage(format!("Failed to write blob {}: {}", path, e))
        })?;

        Ok(())
    }

    async fn get(&self, path: &str) -> WishResult<Option<Vec<u8>>> {
        let blob_path = self.get_blob_path(path)?;

        match fs::read(&blob_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WishError::BlobStorage(format!(
                "Failed to read blob {}: {}",
                path, e
            ))),
        }
    }

    async fn delete(&self, path: &str) -> WishResult<()> {
        let blob_path = self.get_blob_path(path)?;

        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WishError::BlobStorage(format!(
                "Failed to delete blob {}: {}",
                path, e
            ))),
        }
    }

    async fn exists(&self, path: &str) -> WishResult<bool> {
        let blob_path = self.get_blob_path(path)?;
        Ok(fs::try_exists(&blob_path).await.unwrap_or(false))
    }
}

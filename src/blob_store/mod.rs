/// Blob Storage System
///
/// Holds uploaded files (pictures, video wishes and other attachments)
/// addressed by a storage path such as `videos/<id>_clip.mp4`, and hands out
/// public download URLs for them.

pub mod disk;
pub mod models;
pub mod store;
pub mod url;

pub use models::*;
pub use store::{BlobStore, BlobStoreConfig};
pub use url::{build_download_url, storage_path_from_url};

use crate::error::WishResult;
use async_trait::async_trait;

/// Blob storage backend trait
///
/// Implementations handle the actual storage and retrieval of blob data.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store a blob at a storage path
    async fn put(&self, path: &str, data: Vec<u8>, content_type: &str) -> WishResult<()>;

    /// Retrieve a blob by storage path
    async fn get(&self, path: &str) -> WishResult<Option<Vec<u8>>>;

    /// Delete a blob by storage path
    async fn delete(&self, path: &str) -> WishResult<()>;

    /// Check if a blob exists
    async fn exists(&self, path: &str) -> WishResult<bool>;
}

/// Top-level folder a blob is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobFolder {
    Images,
    Videos,
    Files,
}

impl BlobFolder {
    /// Pick a folder by coarse content-type sniffing
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("image/") => BlobFolder::Images,
            Some(ct) if ct.starts_with("video/") => BlobFolder::Videos,
            _ => BlobFolder::Files,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlobFolder::Images => "images",
            BlobFolder::Videos => "videos",
            BlobFolder::Files => "files",
        }
    }
}

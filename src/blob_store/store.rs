/// Blob Store Manager
///
/// Coordinates the blob backend with metadata tracking in the database
use crate::{
    blob_store::{
        build_download_url, disk::DiskBlobBackend, BlobBackend, BlobFolder, BlobMetadata,
        FileUpload, ImageDimensions, StoredBlob,
    },
    config::AppConfig,
    error::WishResult,
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Longest original file name kept in a storage key
const MAX_FILE_NAME_LEN: usize = 100;

/// Blob store configuration
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    pub location: PathBuf,
    pub public_url: String,
    pub bucket: String,
}

impl BlobStoreConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            location: config.storage.blobstore.location.clone(),
            public_url: config.service.public_url.clone(),
            bucket: config.storage.blobstore.bucket.clone(),
        }
    }
}

/// Main blob store manager
#[derive(Clone)]
pub struct BlobStore {
    config: BlobStoreConfig,
    backend: Arc<dyn BlobBackend>,
    db: SqlitePool,
}

impl BlobStore {
    /// Create a disk-backed blob store
    pub fn new(config: BlobStoreConfig, db: SqlitePool) -> Self {
        let backend = Arc::new(DiskBlobBackend::new(config.location.clone()));
        Self::with_backend(config, backend, db)
    }

    /// Create a blob store over an arbitrary backend
    pub fn with_backend(config: BlobStoreConfig, backend: Arc<dyn BlobBackend>, db: SqlitePool) -> Self {
        Self { config, backend, db }
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Extract image dimensions from data
    fn extract_image_dimensions(data: &[u8], content_type: &str) -> Option<ImageDimensions> {
        if !content_type.starts_with("image/") {
            return None;
        }

        match image::load_from_memory(data) {
            Ok(img) => Some(ImageDimensions {
                width: img.width(),
                height: img.height(),
            }),
            Err(e) => {
                tracing::warn!("Failed to extract image dimensions: {}", e);
                None
            }
        }
    }

    /// Public download URL for a stored path
    pub fn download_url(&self, path: &str, token: &str) -> String {
        build_download_url(&self.config.public_url, &self.config.bucket, path, token)
    }

    /// Upload a file, picking its folder from the content type
    pub async fn upload(&self, upload: FileUpload) -> WishResult<StoredBlob> {
        let folder = BlobFolder::from_content_type(upload.content_type.as_deref());
        self.upload_to(folder, upload).await
    }

    /// Upload a file into a fixed folder
    pub async fn upload_to(&self, folder: BlobFolder, upload: FileUpload) -> WishResult<StoredBlob> {
        let FileUpload {
            data,
            content_type,
            file_name,
        } = upload;

        let path = storage_key(folder, &file_name);
        let content_type = content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let size = data.len() as i64;
        let sha256 = hex::encode(Sha256::digest(&data));
        let dimensions = Self::extract_image_dimensions(&data, &content_type);
        let download_token = Uuid::new_v4().to_string();

        self.backend.put(&path, data, &content_type).await?;

        let metadata = BlobMetadata {
            path: path.clone(),
            content_type: content_type.clone(),
            size,
            sha256,
            download_token,
            width: dimensions.map(|d| d.width as i64),
            height: dimensions.map(|d| d.height as i64),
            created_at: Utc::now(),
        };

        if let Err(e) = self.store_metadata(&metadata).await {
            if let Err(cleanup) = self.backend.delete(&path).await {
                tracing::warn!("Failed to remove blob {} after metadata error: {}", path, cleanup);
            }
            return Err(e);
        }

        tracing::info!("Stored blob {} ({} bytes, {})", path, size, content_type);

        Ok(StoredBlob {
            download_url: self.download_url(&path, &metadata.download_token),
            path,
            content_type,
            size,
        })
    }

    /// Get blob data with its metadata
    pub async fn get(&self, path: &str) -> WishResult<Option<(Vec<u8>, BlobMetadata)>> {
        let metadata = match self.get_metadata(path).await? {
            Some(metadata) => metadata,
            None => return Ok(None),
        };

        let data = self.backend.get(path).await?;
        Ok(data.map(|data| (data, metadata)))
    }

    /// Whether the backend still holds bytes for a path
    pub async fn exists(&self, path: &str) -> WishResult<bool> {
        self.backend.exists(path).await
    }

    /// Delete a blob and its metadata
    pub async fn delete(&self, path: &str) -> WishResult<()> {
        let mut conn = self.db.acquire().await?;
        self.delete_with(&mut conn, path).await
    }

    /// Delete a blob, removing its metadata through the caller's connection
    ///
    /// Used inside a record-deletion transaction so a backend failure rolls
    /// back both the metadata and the record.
    pub async fn delete_with(&self, conn: &mut SqliteConnection, path: &str) -> WishResult<()> {
        sqlx::query("DELETE FROM blob_metadata WHERE path = ?1")
            .bind(path)
            .execute(&mut *conn)
            .await?;

        self.backend.delete(path).await?;

        tracing::info!("Deleted blob {}", path);
        Ok(())
    }

    /// Store blob metadata
    async fn store_metadata(&self, metadata: &BlobMetadata) -> WishResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blob_metadata (path, content_type, size, sha256, download_token, width, height, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&metadata.path)
        .bind(&metadata.content_type)
        .bind(metadata.size)
        .bind(&metadata.sha256)
        .bind(&metadata.download_token)
        .bind(metadata.width)
        .bind(metadata.height)
        .bind(metadata.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Get blob metadata
    pub async fn get_metadata(&self, path: &str) -> WishResult<Option<BlobMetadata>> {
        let row = sqlx::query(
            r#"
            SELECT path, content_type, size, sha256, download_token, width, height, created_at
            FROM blob_metadata
            WHERE path = ?1
            "#,
        )
        .bind(path)
        .fetch_optional(&self.db)
        .await?;

        row.map(|row| metadata_from_row(&row)).transpose()
    }
}

fn metadata_from_row(row: &SqliteRow) -> WishResult<BlobMetadata> {
    Ok(BlobMetadata {
        path: row.try_get("path")?,
        content_type: row.try_get("content_type")?,
        size: row.try_get("size")?,
        sha256: row.try_get("sha256")?,
        download_token: row.try_get("download_token")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Build a unique storage key: `{folder}/{id}_{sanitized name}`
pub fn storage_key(folder: BlobFolder, original_name: &str) -> String {
    format!(
        "{}/{}_{}",
        folder.as_str(),
        Uuid::new_v4().simple(),
        sanitize_file_name(original_name)
    )
}

/// Keep only characters that are safe in a single path segment
fn sanitize_file_name(name: &str) -> String {
    // Browsers on some platforms send the full client-side path
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Wish Store
///
/// Document-store access for text wishes and video wishes. Both kinds live
/// in the `wishes` table; attachments are kept in the blob store and the
/// record holds both the download URL and the storage path.
use crate::{
    blob_store::{storage_path_from_url, BlobFolder, BlobStore, FileUpload, StoredBlob},
    error::{WishError, WishResult},
    wishes::models::{require_text, VideoWish, Wish, WishKind, WishUpdate},
};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Wish store manager
#[derive(Clone)]
pub struct WishStore {
    db: SqlitePool,
    blobs: Arc<BlobStore>,
}

impl WishStore {
    pub fn new(db: SqlitePool, blobs: Arc<BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// Save a text wish, uploading the optional file first
    ///
    /// Returns the generated wish id.
    pub async fn create_wish(
        &self,
        name: &str,
        message: &str,
        file: Option<FileUpload>,
    ) -> WishResult<String> {
        let name = require_text("Name", name)?;
        let message = require_text("Message", message)?;

        let attachment = match file {
            Some(file) => Some(self.blobs.upload(file).await?),
            None => None,
        };

        let id = self
            .insert(WishKind::Text, &name, Some(&message), attachment.as_ref())
            .await?;

        tracing::info!("Wish saved with id {}", id);
        Ok(id)
    }

    /// Upload a video and save it as a video wish
    pub async fn create_video_wish(&self, name: &str, video: FileUpload) -> WishResult<String> {
        let name = require_text("Name", name)?;
        if video.data.is_empty() {
            return Err(WishError::Validation("Video file is required".to_string()));
        }

        let stored = self.blobs.upload_to(BlobFolder::Videos, video).await?;
        let id = self.insert(WishKind::Video, &name, None, Some(&stored)).await?;

        tracing::info!("Video wish saved with id {} ({})", id, stored.path);
        Ok(id)
    }

    /// Insert a record, removing its freshly uploaded blob if the write fails
    async fn insert(
        &self,
        kind: WishKind,
        name: &str,
        message: Option<&str>,
        attachment: Option<&StoredBlob>,
    ) -> WishResult<String> {
        let id = Uuid::new_v4().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO wishes (id, kind, name, message, file_url, file_path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(kind.as_str())
        .bind(name)
        .bind(message)
        .bind(attachment.map(|a| a.download_url.as_str()))
        .bind(attachment.map(|a| a.path.as_str()))
        .bind(Utc::now())
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            if let Some(attachment) = attachment {
                if let Err(cleanup) = self.blobs.delete(&attachment.path).await {
                    tracing::warn!(
                        "Failed to remove blob {} after insert error: {}",
                        attachment.path,
                        cleanup
                    );
                }
            }
            return Err(e.into());
        }

        Ok(id)
    }

    /// All text wishes, newest first
    pub async fn list_wishes(&self) -> WishResult<Vec<Wish>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, message, file_url, file_path, created_at
            FROM wishes
            WHERE kind = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(WishKind::Text.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(wish_from_row).collect()
    }

    /// Get a single text wish
    pub async fn get_wish(&self, id: &str) -> WishResult<Option<Wish>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, message, file_url, file_path, created_at
            FROM wishes
            WHERE id = ?1 AND kind = ?2
            "#,
        )
        .bind(id)
        .bind(WishKind::Text.as_str())
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(wish_from_row).transpose()
    }

    /// Change the name and/or message of a wish
    ///
    /// The attachment and creation time are never touched.
    pub async fn update_wish(&self, id: &str, update: WishUpdate) -> WishResult<()> {
        let name = update
            .name
            .as_deref()
            .map(|name| require_text("Name", name))
            .transpose()?;
        let message = update
            .message
            .as_deref()
            .map(|message| require_text("Message", message))
            .transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE wishes
            SET name = COALESCE(?1, name), message = COALESCE(?2, message)
            WHERE id = ?3 AND kind = ?4
            "#,
        )
        .bind(name)
        .bind(message)
        .bind(id)
        .bind(WishKind::Text.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WishError::NotFound(format!("Wish not found: {}", id)));
        }

        tracing::info!("Wish updated: {}", id);
        Ok(())
    }

    /// Delete a text wish together with its attachment, if any
    pub async fn delete_wish(&self, id: &str) -> WishResult<()> {
        self.remove(id, WishKind::Text, None).await?;
        tracing::info!("Wish deleted: {}", id);
        Ok(())
    }

    /// All video wishes, newest first
    pub async fn list_video_wishes(&self) -> WishResult<Vec<VideoWish>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, file_url, file_path, created_at
            FROM wishes
            WHERE kind = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(WishKind::Video.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(video_wish_from_row).collect()
    }

    /// Delete a video wish given the download URL the client holds
    ///
    /// A URL without an object path fails before anything is deleted.
    pub async fn delete_video_wish(&self, id: &str, download_url: &str) -> WishResult<()> {
        let path = storage_path_from_url(download_url)?;
        self.remove(id, WishKind::Video, Some(&path)).await?;
        tracing::info!("Video wish deleted: {} ({})", id, path);
        Ok(())
    }

    /// Remove a record and its blob in one transaction
    ///
    /// The row delete is the first statement so the write lock is taken up
    /// front. The blob is deleted before commit; a blob failure or a path
    /// mismatch rolls the row back.
    async fn remove(&self, id: &str, kind: WishKind, expected_path: Option<&str>) -> WishResult<()> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query("DELETE FROM wishes WHERE id = ?1 AND kind = ?2 RETURNING file_path")
            .bind(id)
            .bind(kind.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| WishError::NotFound(format!("Wish not found: {}", id)))?;
        let file_path: Option<String> = row.try_get("file_path")?;

        if let Some(expected) = expected_path {
            if file_path.as_deref() != Some(expected) {
                tx.rollback().await?;
                return Err(WishError::InvalidInput(format!(
                    "Download URL does not belong to wish {}",
                    id
                )));
            }
        }

        if let Some(path) = &file_path {
            self.blobs.delete_with(&mut *tx, path).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn wish_from_row(row: &SqliteRow) -> WishResult<Wish> {
    let message: Option<String> = row.try_get("message")?;
    Ok(Wish {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        message: message.unwrap_or_default(),
        file_url: row.try_get("file_url")?,
        file_path: row.try_get("file_path")?,
        created_at: row.try_get("created_at")?,
    })
}

fn video_wish_from_row(row: &SqliteRow) -> WishResult<VideoWish> {
    Ok(VideoWish {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        file_url: row.try_get("file_url")?,
        file_path: row.try_get("file_path")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::{disk::DiskBlobBackend, BlobBackend, BlobStoreConfig};
    use crate::db;
    use async_trait::async_trait;
    use tempfile::{tempdir, TempDir};

    async fn create_test_pool(dir: &TempDir) -> SqlitePool {
        let pool = db::create_pool(&dir.path().join("test.sqlite"), db::DatabaseOptions::default())
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn blob_config(dir: &TempDir) -> BlobStoreConfig {
        BlobStoreConfig {
            location: dir.path().join("blobs"),
            public_url: "http://localhost:8080".to_string(),
            bucket: "wishes".to_string(),
        }
    }

    async fn create_test_store() -> (TempDir, WishStore, Arc<BlobStore>) {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir).await;
        let blobs = Arc::new(BlobStore::new(blob_config(&dir), pool.clone()));
        (dir, WishStore::new(pool, blobs.clone()), blobs)
    }

    fn file(data: &[u8], content_type: &str, file_name: &str) -> FileUpload {
        FileUpload {
            data: data.to_vec(),
            content_type: Some(content_type.to_string()),
            file_name: file_name.to_string(),
        }
    }

    /// Disk backend whose deletes always fail
    struct FailingDeleteBackend(DiskBlobBackend);

    #[async_trait]
    impl BlobBackend for FailingDeleteBackend {
        async fn put(&self, path: &str, data: Vec<u8>, content_type: &str) -> WishResult<()> {
            self.0.put(path, data, content_type).await
        }
        async fn get(&self, path: &str) -> WishResult<Option<Vec<u8>>> {
            self.0.get(path).await
        }
        async fn delete(&self, path: &str) -> WishResult<()> {
            Err(WishError::BlobStorage(format!("refusing to delete {}", path)))
        }
        async fn exists(&self, path: &str) -> WishResult<bool> {
            self.0.exists(path).await
        }
    }

    #[tokio::test]
    async fn test_create_and_list_wish() {
        let (_dir, store, _) = create_test_store().await;

        let id = store.create_wish("Ana", "Happy birthday!", None).await.unwrap();

        let wishes = store.list_wishes().await.unwrap();
        assert_eq!(wishes.len(), 1);
        assert_eq!(wishes[0].id, id);
        assert_eq!(wishes[0].name, "Ana");
        assert_eq!(wishes[0].message, "Happy birthday!");
        assert_eq!(wishes[0].file_url, None);
    }

    #[tokio::test]
    async fn test_create_wish_with_file() {
        let (_dir, store, blobs) = create_test_store().await;

        let id = store
            .create_wish("Ben", "Cheers", Some(file(b"card", "application/pdf", "card.pdf")))
            .await
            .unwrap();

        let wish = store.get_wish(&id).await.unwrap().unwrap();
        let url = wish.file_url.unwrap();
        let path = wish.file_path.unwrap();
        assert!(!url.is_empty());
        assert!(path.starts_with("files/"));
        assert_eq!(storage_path_from_url(&url).unwrap(), path);
        assert!(blobs.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let (_dir, store, _) = create_test_store().await;

        let err = store.create_wish("  ", "hi", None).await.unwrap_err();
        assert!(matches!(err, WishError::Validation(_)));

        let err = store.create_wish("Ana", "", None).await.unwrap_err();
        assert!(matches!(err, WishError::Validation(_)));

        assert!(store.list_wishes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_dir, store, _) = create_test_store().await;

        for name in ["first", "second", "third"] {
            store.create_wish(name, "message", None).await.unwrap();
        }

        let wishes = store.list_wishes().await.unwrap();
        let names: Vec<&str> = wishes.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
        assert!(wishes.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let (_dir, store, _) = create_test_store().await;

        let id = store
            .create_wish("Ana", "Happy birthday!", Some(file(b"png", "image/png", "cake.png")))
            .await
            .unwrap();
        let before = store.get_wish(&id).await.unwrap().unwrap();

        store
            .update_wish(
                &id,
                WishUpdate {
                    name: None,
                    message: Some("X".to_string()),
                },
            )
            .await
            .unwrap();

        let after = store.get_wish(&id).await.unwrap().unwrap();
        assert_eq!(after.message, "X");
        assert_eq!(after.id, before.id);
        assert_eq!(after.name, before.name);
        assert_eq!(after.file_url, before.file_url);
        assert_eq!(after.file_path, before.file_path);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_wish() {
        let (_dir, store, _) = create_test_store().await;

        let err = store
            .update_wish(
                "missing",
                WishUpdate {
                    name: Some("Ana".to_string()),
                    message: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WishError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let (_dir, store, _) = create_test_store().await;
        let id = store.create_wish("Ana", "hi", None).await.unwrap();

        let err = store
            .update_wish(
                &id,
                WishUpdate {
                    name: Some(" ".to_string()),
                    message: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WishError::Validation(_)));
        assert_eq!(store.get_wish(&id).await.unwrap().unwrap().name, "Ana");
    }

    #[tokio::test]
    async fn test_delete_wish() {
        let (_dir, store, _) = create_test_store().await;

        let keep = store.create_wish("Keep", "me", None).await.unwrap();
        let gone = store.create_wish("Gone", "soon", None).await.unwrap();

        store.delete_wish(&gone).await.unwrap();

        let ids: Vec<String> = store.list_wishes().await.unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![keep]);

        let err = store.delete_wish(&gone).await.unwrap_err();
        assert!(matches!(err, WishError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_wish_removes_attachment() {
        let (_dir, store, blobs) = create_test_store().await;

        let id = store
            .create_wish("Ana", "photo", Some(file(b"jpg", "image/jpeg", "us.jpg")))
            .await
            .unwrap();
        let path = store.get_wish(&id).await.unwrap().unwrap().file_path.unwrap();

        store.delete_wish(&id).await.unwrap();

        assert!(!blobs.exists(&path).await.unwrap());
        assert!(blobs.get_metadata(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_video_wishes_kept_apart_from_text_wishes() {
        let (_dir, store, _) = create_test_store().await;

        store
            .create_wish("Ana", "with picture", Some(file(b"png", "image/png", "a.png")))
            .await
            .unwrap();
        let video_id = store
            .create_video_wish("Ben", file(b"mp4", "application/octet-stream", "clip.mp4"))
            .await
            .unwrap();

        let videos = store.list_video_wishes().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, video_id);
        assert!(videos[0].file_path.starts_with("videos/"));

        let wishes = store.list_wishes().await.unwrap();
        assert_eq!(wishes.len(), 1);
        assert_eq!(wishes[0].name, "Ana");
    }

    #[tokio::test]
    async fn test_create_video_wish_requires_video() {
        let (_dir, store, _) = create_test_store().await;

        let err = store
            .create_video_wish("Ben", file(b"", "video/mp4", "empty.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, WishError::Validation(_)));
        assert!(store.list_video_wishes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_video_wish() {
        let (_dir, store, blobs) = create_test_store().await;

        let id = store
            .create_video_wish("Ben", file(b"mp4", "video/mp4", "clip.mp4"))
            .await
            .unwrap();
        let video = store.list_video_wishes().await.unwrap().remove(0);

        store.delete_video_wish(&id, &video.file_url).await.unwrap();

        assert!(store.list_video_wishes().await.unwrap().is_empty());
        assert!(!blobs.exists(&video.file_path).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_video_wish_with_malformed_url() {
        let (_dir, store, blobs) = create_test_store().await;

        let id = store
            .create_video_wish("Ben", file(b"mp4", "video/mp4", "clip.mp4"))
            .await
            .unwrap();
        let video = store.list_video_wishes().await.unwrap().remove(0);

        let err = store
            .delete_video_wish(&id, "http://localhost/videos/clip.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, WishError::InvalidInput(_)));

        assert_eq!(store.list_video_wishes().await.unwrap().len(), 1);
        assert!(blobs.exists(&video.file_path).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_video_wish_with_foreign_url() {
        let (_dir, store, blobs) = create_test_store().await;

        let first = store
            .create_video_wish("Ben", file(b"one", "video/mp4", "one.mp4"))
            .await
            .unwrap();
        store
            .create_video_wish("Cy", file(b"two", "video/mp4", "two.mp4"))
            .await
            .unwrap();
        let videos = store.list_video_wishes().await.unwrap();
        let other = videos.iter().find(|v| v.id != first).unwrap();

        let err = store.delete_video_wish(&first, &other.file_url).await.unwrap_err();
        assert!(matches!(err, WishError::InvalidInput(_)));

        assert_eq!(store.list_video_wishes().await.unwrap().len(), 2);
        assert!(blobs.exists(&other.file_path).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_video_wish() {
        let (_dir, store, _) = create_test_store().await;

        let err = store
            .delete_video_wish("missing", "http://localhost/v0/b/wishes/o/videos%2Fx.mp4?alt=media")
            .await
            .unwrap_err();
        assert!(matches!(err, WishError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blob_failure_keeps_record() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir).await;
        let backend = Arc::new(FailingDeleteBackend(DiskBlobBackend::new(dir.path().join("blobs"))));
        let blobs = Arc::new(BlobStore::with_backend(blob_config(&dir), backend, pool.clone()));
        let store = WishStore::new(pool, blobs.clone());

        let id = store
            .create_video_wish("Ben", file(b"mp4", "video/mp4", "clip.mp4"))
            .await
            .unwrap();
        let video = store.list_video_wishes().await.unwrap().remove(0);

        let err = store.delete_video_wish(&id, &video.file_url).await.unwrap_err();
        assert!(matches!(err, WishError::BlobStorage(_)));

        // Row delete and metadata delete were rolled back
        assert_eq!(store.list_video_wishes().await.unwrap().len(), 1);
        assert!(blobs.get_metadata(&video.file_path).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_deletes_race_with_creates() {
        let (_dir, store, _) = create_test_store().await;

        let mut ids = Vec::new();
        for i in 0..100 {
            ids.push(store.create_wish(&format!("guest {}", i), "hi", None).await.unwrap());
        }

        let mut handles = Vec::new();
        for id in ids {
            let deleter = store.clone();
            handles.push(tokio::spawn(async move { deleter.delete_wish(&id).await }));
            let creator = store.clone();
            handles.push(tokio::spawn(async move {
                creator.create_wish("late", "guest", None).await.map(|_| ())
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let wishes = store.list_wishes().await.unwrap();
        assert_eq!(wishes.len(), 100);
        assert!(wishes.iter().all(|w| w.name == "late"));
    }
}

/// Application context and dependency injection
use crate::{
    blob_store::{BlobStore, BlobStoreConfig},
    config::AppConfig,
    db,
    error::WishResult,
    wishes::WishStore,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
///
/// Built once at startup, handed to the router as state, and closed on
/// shutdown.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub blob_store: Arc<BlobStore>,
    pub wishes: Arc<WishStore>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: AppConfig) -> WishResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let blob_store = Arc::new(BlobStore::new(
            BlobStoreConfig::from_app_config(&config),
            db.clone(),
        ));
        let wishes = Arc::new(WishStore::new(db.clone(), blob_store.clone()));

        Ok(Self {
            config: Arc::new(config),
            db,
            blob_store,
            wishes,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &AppConfig) -> WishResult<()> {
        for dir in [&config.storage.data_directory, &config.storage.blobstore.location] {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        Ok(())
    }

    /// Release the database pool
    pub async fn close(&self) {
        self.db.close().await;
        tracing::info!("Database pool closed");
    }
}

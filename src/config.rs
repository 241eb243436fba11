/// Configuration management for Wishwall
use crate::error::{WishError, WishResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL used when building public download URLs
    pub public_url: String,
    /// Maximum accepted request body in bytes
    pub upload_limit: usize,
    /// Built frontend bundle to serve for non-API paths
    pub static_directory: Option<PathBuf>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub blobstore: BlobstoreConfig,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobstoreConfig {
    pub location: PathBuf,
    /// Bucket name embedded in download URLs
    pub bucket: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level for this crate and tower_http when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl AppConfig {
    /// Default configuration rooted at a data directory
    pub fn local(data_directory: PathBuf) -> Self {
        let hostname = "127.0.0.1".to_string();
        let port = 8080;

        Self {
            service: ServiceConfig {
                public_url: format!("http://{}:{}", hostname, port),
                hostname,
                port,
                upload_limit: 100 * 1024 * 1024,
                static_directory: None,
            },
            storage: StorageConfig {
                database: data_directory.join("wishes.sqlite"),
                blobstore: BlobstoreConfig {
                    location: data_directory.join("blobs"),
                    bucket: "wishes".to_string(),
                },
                data_directory,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> WishResult<Self> {
        dotenv::dotenv().ok();

        let data_directory: PathBuf = env::var("WISHES_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let mut config = Self::local(data_directory);

        if let Ok(hostname) = env::var("WISHES_HOSTNAME") {
            config.service.hostname = hostname;
        }
        if let Ok(port) = env::var("WISHES_PORT") {
            config.service.port = port
                .parse()
                .map_err(|_| WishError::Validation("Invalid port number".to_string()))?;
        }
        config.service.public_url = env::var("WISHES_PUBLIC_URL").unwrap_or_else(|_| {
            format!("http://{}:{}", config.service.hostname, config.service.port)
        });
        config.service.upload_limit = env::var("WISHES_UPLOAD_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.service.upload_limit);
        config.service.static_directory = env::var("WISHES_STATIC_DIRECTORY").ok().map(PathBuf::from);

        if let Ok(database) = env::var("WISHES_DB_LOCATION") {
            config.storage.database = PathBuf::from(database);
        }
        if let Ok(location) = env::var("WISHES_BLOBSTORE_LOCATION") {
            config.storage.blobstore.location = PathBuf::from(location);
        }
        if let Ok(bucket) = env::var("WISHES_BUCKET") {
            config.storage.blobstore.bucket = bucket;
        }

        if let Ok(level) = env::var("WISHES_LOG_LEVEL") {
            config.logging.level = level;
        }
        config.logging.json = env::var("WISHES_LOG_JSON")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> WishResult<()> {
        if self.service.hostname.is_empty() {
            return Err(WishError::Validation("Hostname cannot be empty".to_string()));
        }

        if !self.service.public_url.starts_with("http://")
            && !self.service.public_url.starts_with("https://")
        {
            return Err(WishError::Validation(format!(
                "Public URL must be http(s): {}",
                self.service.public_url
            )));
        }

        let bucket = &self.storage.blobstore.bucket;
        if bucket.is_empty() || bucket.contains('/') {
            return Err(WishError::Validation(format!("Invalid bucket name: {:?}", bucket)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_defaults() {
        let config = AppConfig::local(PathBuf::from("/tmp/wishes"));

        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.public_url, "http://127.0.0.1:8080");
        assert_eq!(config.storage.database, PathBuf::from("/tmp/wishes/wishes.sqlite"));
        assert_eq!(config.storage.blobstore.location, PathBuf::from("/tmp/wishes/blobs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_bucket() {
        let mut config = AppConfig::local(PathBuf::from("/tmp/wishes"));
        config.storage.blobstore.bucket = "a/b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_public_url() {
        let mut config = AppConfig::local(PathBuf::from("/tmp/wishes"));
        config.service.public_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }
}

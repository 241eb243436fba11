/// Blob storage data models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blob metadata stored in database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    pub path: String,
    pub content_type: String,
    pub size: i64,
    pub sha256: String,
    #[serde(skip_serializing)]
    pub download_token: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Image dimensions
#[derive(Debug, Clone, Copy)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// A file submitted by a visitor, before it is stored
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    /// Name of the file on the visitor's machine
    pub file_name: String,
}

/// Result of a successful upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    pub path: String,
    #[serde(rename = "url")]
    pub download_url: String,
    pub content_type: String,
    pub size: i64,
}

/// Wish data models
use crate::error::{WishError, WishResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of record held in the wishes table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishKind {
    Text,
    Video,
}

impl WishKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WishKind::Text => "text",
            WishKind::Video => "video",
        }
    }
}

/// A text birthday wish, optionally carrying an attached file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wish {
    pub id: String,
    pub name: String,
    pub message: String,
    pub file_url: Option<String>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A video wish: a name paired with an uploaded video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWish {
    pub id: String,
    pub name: String,
    pub file_url: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

/// Partial edit of a wish; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WishUpdate {
    pub name: Option<String>,
    pub message: Option<String>,
}

/// Reject blank required text, returning it trimmed
pub(crate) fn require_text(field: &str, value: &str) -> WishResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WishError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// File upload and public blob download endpoints
use crate::{
    api::form::UploadForm,
    blob_store::{BlobMetadata, StoredBlob},
    context::AppContext,
    error::{WishError, WishResult},
};
use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

const CACHE_CONTROL: &str = "public, max-age=3600";

/// Build blob routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/uploads", post(upload_file))
        .route("/v0/b/:bucket/o/:path", get(get_blob))
}

/// Query string of a download URL
#[derive(Debug, Deserialize)]
struct DownloadQuery {
    alt: Option<String>,
    token: Option<String>,
}

/// Upload a single file (multipart field `file`) and return its download URL
async fn upload_file(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> WishResult<(StatusCode, Json<StoredBlob>)> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| WishError::Validation("Please select a file".to_string()))?;

    let stored = ctx.blob_store.upload(file).await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

/// Serve a blob by storage path
///
/// With `alt=media` the bytes are returned (Range and If-None-Match are
/// honoured); otherwise the blob metadata is returned as JSON. The token
/// from the download URL must match.
async fn get_blob(
    State(ctx): State<AppContext>,
    Path((bucket, path)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> WishResult<Response> {
    let not_found = || WishError::NotFound(format!("Blob not found: {}", path));

    if bucket != ctx.blob_store.bucket() {
        return Err(not_found());
    }

    let (data, metadata) = ctx.blob_store.get(&path).await?.ok_or_else(not_found)?;

    if query.token.as_deref() != Some(metadata.download_token.as_str()) {
        return Err(not_found());
    }

    if query.alt.as_deref() != Some("media") {
        return Ok(Json(metadata).into_response());
    }

    media_response(data, &metadata, &headers)
}

/// Build the byte response for a blob
fn media_response(data: Vec<u8>, metadata: &BlobMetadata, headers: &HeaderMap) -> WishResult<Response> {
    let total_size = data.len();
    let etag = format!("\"{}\"", metadata.sha256);

    // 304 when the client already has this content
    let cached = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == etag)
        .unwrap_or(false);
    if cached {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, etag)
            .header(header::CACHE_CONTROL, CACHE_CONTROL)
            .body(Body::empty())
            .map_err(|e| WishError::Internal(format!("Failed to build response: {}", e)));
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_range(v, total_size));

    if let Some((start, end)) = range {
        let length = end - start + 1;
        let partial = data[start..=end].to_vec();

        return Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_TYPE, &metadata.content_type)
            .header(header::CONTENT_LENGTH, length.to_string())
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end, total_size),
            )
            .header(header::ETAG, etag)
            .header(header::CACHE_CONTROL, CACHE_CONTROL)
            .header(header::ACCEPT_RANGES, "bytes")
            .body(Body::from(partial))
            .map_err(|e| WishError::Internal(format!("Failed to build response: {}", e)));
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &metadata.content_type)
        .header(header::CONTENT_LENGTH, total_size.to_string())
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .header(header::ACCEPT_RANGES, "bytes")
        .body(Body::from(data))
        .map_err(|e| WishError::Internal(format!("Failed to build response: {}", e)))
}

/// Parse HTTP Range header
///
/// Returns (start, end) inclusive byte positions, or None if invalid
fn parse_range(range_header: &str, total_size: usize) -> Option<(usize, usize)> {
    if total_size == 0 {
        return None;
    }

    let range_spec = range_header.trim().strip_prefix("bytes=")?;
    let (start_str, end_str) = range_spec.split_once('-')?;

    if start_str.is_empty() {
        // Suffix range: "bytes=-500" (last 500 bytes)
        let suffix = end_str.parse::<usize>().ok()?;
        if suffix == 0 {
            return None;
        }
        return Some((total_size.saturating_sub(suffix), total_size - 1));
    }

    let start = start_str.parse::<usize>().ok()?;
    if start >= total_size {
        return None;
    }

    if end_str.is_empty() {
        // Open-ended range: "bytes=500-"
        return Some((start, total_size - 1));
    }

    let end = end_str.parse::<usize>().ok()?.min(total_size - 1);
    (start <= end).then_some((start, end))
}

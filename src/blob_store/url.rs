/// Public download URLs for stored blobs
///
/// URLs take the form
/// `{public_url}/v0/b/{bucket}/o/{percent-encoded path}?alt=media&token={token}`.
use crate::error::{WishError, WishResult};

const OBJECT_MARKER: &str = "/o/";

/// Build the public download URL for a storage path
pub fn build_download_url(public_url: &str, bucket: &str, path: &str, token: &str) -> String {
    format!(
        "{}/v0/b/{}/o/{}?alt=media&token={}",
        public_url.trim_end_matches('/'),
        bucket,
        urlencoding::encode(path),
        token
    )
}

/// Recover the storage path from a download URL
///
/// The path is the URL-decoded segment between `/o/` and the next `?`
/// (or the end of the URL).
pub fn storage_path_from_url(url: &str) -> WishResult<String> {
    let start = url
        .find(OBJECT_MARKER)
        .map(|i| i + OBJECT_MARKER.len())
        .ok_or_else(|| WishError::InvalidInput(format!("Invalid storage URL: {}", url)))?;

    let rest = &url[start..];
    let encoded = match rest.find('?') {
        Some(end) => &rest[..end],
        None => rest,
    };

    let path = urlencoding::decode(encoded)
        .map_err(|e| WishError::InvalidInput(format!("Invalid storage URL encoding: {}", e)))?;

    if path.is_empty() {
        return Err(WishError::InvalidInput(format!(
            "Storage URL has no object path: {}",
            url
        )));
    }

    Ok(path.into_owned())
}

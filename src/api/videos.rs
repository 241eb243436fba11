/// Video wish endpoints
use crate::{
    api::{form::UploadForm, CreatedResponse, MAX_NAME_LEN},
    context::AppContext,
    error::{WishError, WishResult},
    wishes::VideoWish,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

/// Build video wish routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/videos", get(list_videos).post(create_video))
        .route("/api/videos/:id", delete(delete_video))
}

/// Body of a video deletion: the download URL the client was given
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteVideoRequest {
    file_url: String,
}

/// Text fields of the video wish form
#[derive(Debug, Validate)]
struct VideoFields {
    #[validate(length(max = MAX_NAME_LEN))]
    name: String,
}

/// Re-sort store order (newest first) into display order (oldest first)
fn display_order(mut videos: Vec<VideoWish>) -> Vec<VideoWish> {
    videos.reverse();
    videos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    videos
}

/// List video wishes, oldest first
async fn list_videos(State(ctx): State<AppContext>) -> WishResult<Json<Vec<VideoWish>>> {
    let videos = ctx.wishes.list_video_wishes().await?;
    Ok(Json(display_order(videos)))
}

/// Create a video wish from a multipart form: `name`, `video`
async fn create_video(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> WishResult<(StatusCode, Json<CreatedResponse>)> {
    let mut form = UploadForm::read(multipart).await?;

    let fields = VideoFields {
        name: form.text("name"),
    };
    fields
        .validate()
        .map_err(|e| WishError::Validation(e.to_string()))?;

    let video = form
        .take_file("video")
        .ok_or_else(|| WishError::Validation("Please select a video file".to_string()))?;

    let id = ctx.wishes.create_video_wish(&fields.name, video).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Delete a video wish and its video
async fn delete_video(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<DeleteVideoRequest>,
) -> WishResult<StatusCode> {
    ctx.wishes.delete_video_wish(&id, &req.file_url).await?;
    Ok(StatusCode::NO_CONTENT)
}

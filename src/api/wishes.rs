/// Text wish endpoints
use crate::{
    api::{form::UploadForm, CreatedResponse, MAX_MESSAGE_LEN, MAX_NAME_LEN},
    context::AppContext,
    error::{WishError, WishResult},
    wishes::{Wish, WishUpdate},
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

/// Build wish routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/wishes", get(list_wishes).post(create_wish))
        .route("/api/wishes/:id", patch(update_wish).delete(delete_wish))
}

/// Text fields of the wish form
#[derive(Debug, Validate)]
struct WishFields {
    #[validate(length(max = MAX_NAME_LEN))]
    name: String,
    #[validate(length(max = MAX_MESSAGE_LEN))]
    message: String,
}

/// Partial edit of a wish
#[derive(Debug, Deserialize, Validate)]
struct UpdateWishRequest {
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    name: Option<String>,
    #[validate(length(min = 1, max = MAX_MESSAGE_LEN))]
    message: Option<String>,
}

/// List all wishes, newest first
async fn list_wishes(State(ctx): State<AppContext>) -> WishResult<Json<Vec<Wish>>> {
    Ok(Json(ctx.wishes.list_wishes().await?))
}

/// Create a wish from a multipart form: `name`, `message`, optional `file`
async fn create_wish(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> WishResult<(StatusCode, Json<CreatedResponse>)> {
    let mut form = UploadForm::read(multipart).await?;

    let fields = WishFields {
        name: form.text("name"),
        message: form.text("message"),
    };
    fields
        .validate()
        .map_err(|e| WishError::Validation(e.to_string()))?;

    let file = form.take_file("file");
    let id = ctx
        .wishes
        .create_wish(&fields.name, &fields.message, file)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Edit the name and/or message of a wish
async fn update_wish(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<UpdateWishRequest>,
) -> WishResult<StatusCode> {
    req.validate()
        .map_err(|e| WishError::Validation(e.to_string()))?;

    ctx.wishes
        .update_wish(
            &id,
            WishUpdate {
                name: req.name,
                message: req.message,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a wish
async fn delete_wish(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> WishResult<StatusCode> {
    ctx.wishes.delete_wish(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

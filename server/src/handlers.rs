use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use inkgallery_shared::{CaptureRequest, DeleteRequest, DrawingRequest, ImageList, MoveRequest};

use crate::error::GalleryError;
use crate::logic::{
    build_listing, capture_screenshot, delete_images, move_images, refresh_thumbnails,
    store_drawing,
};
use crate::state::AppState;

pub async fn status_handler() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn image_list_handler(
    State(state): State<AppState>,
) -> Result<Json<ImageList>, GalleryError> {
    refresh_thumbnails(&state).await;
    Ok(Json(build_listing(&state).await?))
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<ImageList>, GalleryError> {
    delete_images(&state, &request.paths).await?;
    Ok(Json(build_listing(&state).await?))
}

pub async fn move_handler(
    State(state): State<AppState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<ImageList>, GalleryError> {
    move_images(&state, &request.paths, &request.destination).await?;
    Ok(Json(build_listing(&state).await?))
}

pub async fn capture_handler(
    State(state): State<AppState>,
    Json(request): Json<CaptureRequest>,
) -> Result<Json<ImageList>, GalleryError> {
    capture_screenshot(&state, &request.current_dir).await?;
    Ok(Json(build_listing(&state).await?))
}

pub async fn drawing_handler(
    State(state): State<AppState>,
    Json(request): Json<DrawingRequest>,
) -> Result<Json<ImageList>, GalleryError> {
    store_drawing(&state, request).await?;
    Ok(Json(build_listing(&state).await?))
}

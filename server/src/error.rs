use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("data file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("screenshot failed: {0}")]
    Capture(String),
    #[error("screenshots are not supported by this build")]
    CaptureUnavailable,
}

impl GalleryError {
    pub fn status(&self) -> StatusCode {
        match self {
            GalleryError::Forbidden(_) => StatusCode::FORBIDDEN,
            GalleryError::NotFound(_) => StatusCode::NOT_FOUND,
            GalleryError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GalleryError::CaptureUnavailable => StatusCode::NOT_IMPLEMENTED,
            GalleryError::Io(_)
            | GalleryError::Image(_)
            | GalleryError::Json(_)
            | GalleryError::Join(_)
            | GalleryError::Capture(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::warn!("{self}");
        }
        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            GalleryError::Forbidden("x".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GalleryError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GalleryError::CaptureUnavailable.into_response().status(),
            StatusCode::NOT_IMPLEMENTED
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(
            GalleryError::from(io).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

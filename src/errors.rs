use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::bad_request(err.body_text())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failure of an outbound call to the image service.
///
/// Network and status failures are logged separately but shown to the user
/// as the same generic notice.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server responded with status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Network(err.to_string()),
        }
    }
}

/// A required field was missing before a navigation or submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username parameter is required")]
    MissingUsername,

    #[error("Password parameter is required")]
    MissingPassword,

    #[error("Please select a file to upload")]
    MissingFile,

    #[error("Category name is required")]
    MissingCategoryName,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Upload failed: {0}")]
    Failed(#[from] FetchError),
}

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::models::ErrorList;

pub const NOT_FOUND_MESSAGE: &str = "404 Not Found: The requested URL was not found on the server. \
     If you entered the URL manually please check your spelling and try again.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found() -> Self {
        Self::NotFound(NOT_FOUND_MESSAGE.to_string())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge(err.body_text());
        }
        Self::Validation(vec![format!("Malformed form submission - {}", err.body_text())])
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(vec![format!("Malformed form submission - {}", rejection.body_text())])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(ErrorList { errors })).into_response()
            }
            AppError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorList { errors: vec![message] })).into_response()
            }
            AppError::PayloadTooLarge(message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, Json(ErrorList { errors: vec![message] }))
                    .into_response()
            }
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Html(crate::templates::not_found_page(&message)))
                    .into_response()
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                let errors = vec!["Internal Server Error".to_string()];
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorList { errors })).into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

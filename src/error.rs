use axum::{
    extract::{multipart::MultipartError, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::preprocessing::Region;

/// Failures raised by the preprocessing core.
///
/// Only `Decode` is ever surfaced by [`crate::preprocessing::Pipeline::preprocess`];
/// the pipeline absorbs detection failures and continues with the undetected buffer.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Raster buffer has {actual} bytes, expected {expected}")]
    InvalidBuffer { expected: usize, actual: usize },

    #[error("Region {region:?} lies outside a {width}x{height} buffer")]
    RegionOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },
}

/// Errors returned by the HTTP layer
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to initialize recognition engine: {0}")]
    InitializationError(String),

    #[error("Failed to recognize plate: {0}")]
    RecognitionError(String),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Upload exceeds the {max} byte limit")]
    UploadTooLarge { max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Recognition engine is not available")]
    EngineUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Classify a multipart read failure; the body limit surfaces here as a 413
    pub fn from_multipart(err: MultipartError, max_file_size: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServiceError::UploadTooLarge { max: max_file_size }
        } else {
            ServiceError::InvalidRequest(format!("{}: {}", err, err.body_text()))
        }
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::InvalidRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServiceError::InitializationError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR")
            }
            ServiceError::RecognitionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "RECOGNITION_ERROR")
            }
            ServiceError::Preprocess(PreprocessError::Decode(_)) => {
                (StatusCode::BAD_REQUEST, "DECODE_ERROR")
            }
            ServiceError::Preprocess(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PREPROCESSING_ERROR")
            }
            ServiceError::ImageTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            ServiceError::UploadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            ServiceError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ServiceError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServiceError::EngineUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "ENGINE_UNAVAILABLE")
            }
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

//! Error types for the lexaudit server

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use defect_engine::AnalysisError;
use document_loader::NormalizeError;
use serde::Serialize;
use shared_types::DetectorStatus;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detector_status: Option<BTreeMap<String, DetectorStatus>>,
}

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Analysis(err) => {
                let status = match err {
                    AnalysisError::Normalize(NormalizeError::UnsupportedFormat(_)) => {
                        StatusCode::UNSUPPORTED_MEDIA_TYPE
                    }
                    AnalysisError::Normalize(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    AnalysisError::AnalysisUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    AnalysisError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code())
            }
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE")
            }
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        let detector_status = match self {
            ServerError::Analysis(AnalysisError::AnalysisUnavailable { detector_status }) => {
                Some(detector_status)
            }
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
            detector_status,
        };

        (status, Json(body)).into_response()
    }
}

impl From<NormalizeError> for ServerError {
    fn from(err: NormalizeError) -> Self {
        ServerError::Analysis(AnalysisError::Normalize(err))
    }
}

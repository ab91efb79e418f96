//! API handlers for the lexaudit server
//!
//! Provides REST endpoints for:
//! - Document analysis
//! - Text correction
//! - Detector listing

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use defect_engine::{DetectorInfo, TextEdit};
use document_loader::detect_kind;
use serde::{Deserialize, Serialize};
use shared_types::{Defect, DetectorStatus, Severity, Span};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "lexaudit-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Detector list response
#[derive(Serialize)]
pub struct DetectorListResponse {
    pub success: bool,
    pub detectors: Vec<DetectorInfo>,
    pub count: usize,
}

/// Handler: GET /api/detectors
pub async fn handle_list_detectors(State(state): State<AppState>) -> Json<DetectorListResponse> {
    let detectors = state.engine.detectors();
    let count = detectors.len();
    Json(DetectorListResponse {
        success: true,
        detectors,
        count,
    })
}

/// One defect as returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorEntry {
    #[serde(rename = "type")]
    pub error_type: String,
    pub position: String,
    pub message: String,
    pub severity: Severity,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl From<&Defect> for ErrorEntry {
    fn from(defect: &Defect) -> Self {
        Self {
            error_type: defect.category.label().to_string(),
            position: defect.position.clone(),
            message: defect.message.clone(),
            severity: defect.severity,
            span: defect.span,
            suggested_fix: defect.suggested_fix.clone(),
        }
    }
}

/// Analyze request body
#[derive(Deserialize)]
pub struct AnalyzeRequest {
    /// Original file name; its extension selects the format
    pub filename: String,
    /// Base64-encoded file content
    pub content_base64: String,
}

/// Analyze response
#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub document_ref: String,
    pub errors: Vec<ErrorEntry>,
    pub detector_status: BTreeMap<String, DetectorStatus>,
    pub error_count: usize,
    /// True when some detector failed or timed out
    pub partial: bool,
    pub analyzed_at: String,
}

/// Handler: POST /api/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ServerError> {
    info!("Analyze request: filename={}", req.filename);

    let mime_kind = detect_kind(&req.filename)?;
    let bytes = BASE64.decode(req.content_base64.trim()).map_err(|e| {
        ServerError::InvalidRequest(format!("content_base64 is not valid base64: {}", e))
    })?;

    if bytes.len() > state.max_upload_bytes {
        return Err(ServerError::PayloadTooLarge {
            size: bytes.len(),
            limit: state.max_upload_bytes,
        });
    }
    debug!("Decoded {} bytes as {:?}", bytes.len(), mime_kind);

    let report = state.engine.analyze_bytes(bytes, mime_kind).await?;

    let errors: Vec<ErrorEntry> = report.errors.iter().map(ErrorEntry::from).collect();
    let error_count = errors.len();
    let partial = report.is_partial();

    Ok(Json(AnalyzeResponse {
        success: true,
        document_ref: report.document_ref,
        errors,
        detector_status: report.detector_status,
        error_count,
        partial,
        analyzed_at: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Correct request body
#[derive(Deserialize)]
pub struct CorrectRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Correct response
#[derive(Serialize)]
pub struct CorrectResponse {
    pub success: bool,
    pub original_text: String,
    pub corrected_text: String,
    pub errors: Vec<ErrorEntry>,
    pub edits: Vec<TextEdit>,
    pub detector_status: BTreeMap<String, DetectorStatus>,
    pub partial: bool,
}

/// Handler: POST /api/correct
pub async fn handle_correct(
    State(state): State<AppState>,
    Json(req): Json<CorrectRequest>,
) -> Result<Json<CorrectResponse>, ServerError> {
    let text = match req.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            return Err(ServerError::InvalidRequest(
                "Field 'text' is required and must not be empty".to_string(),
            ))
        }
    };
    if text.len() > state.max_upload_bytes {
        return Err(ServerError::PayloadTooLarge {
            size: text.len(),
            limit: state.max_upload_bytes,
        });
    }
    info!("Correct request: {} chars", text.chars().count());

    let (report, correction) = state.engine.correct_text(&text).await?;
    let partial = report.is_partial();

    Ok(Json(CorrectResponse {
        success: true,
        original_text: text,
        corrected_text: correction.corrected_text,
        errors: report.errors.iter().map(ErrorEntry::from).collect(),
        edits: correction.edits,
        detector_status: report.detector_status,
        partial,
    }))
}

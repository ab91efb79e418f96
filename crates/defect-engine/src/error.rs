//! Error types for analysis

use std::collections::BTreeMap;

use document_loader::NormalizeError;
use shared_types::DetectorStatus;
use thiserror::Error;

/// Request-level failures.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Analysis unavailable: no detector completed")]
    AnalysisUnavailable {
        detector_status: BTreeMap<String, DetectorStatus>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Machine-readable kind surfaced to clients
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Normalize(e) => e.code(),
            AnalysisError::AnalysisUnavailable { .. } => "ANALYSIS_UNAVAILABLE",
            AnalysisError::Config(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Failure of a single detector. Never escapes the orchestrator; it is
/// recorded as `failed` in the report's detector status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorError {
    #[error("Scan cancelled")]
    Cancelled,

    #[error("Detector failed: {0}")]
    Internal(String),
}

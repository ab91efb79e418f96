pub mod config;
pub mod correction;
pub mod detector;
pub mod detectors;
pub mod error;
pub mod extractors;
pub mod fusion;
pub mod orchestrator;
pub mod patterns;

use std::sync::Arc;

use document_loader::Document;
use serde::{Deserialize, Serialize};
use shared_types::{Category, ErrorReport, MimeKind};

pub use config::EngineConfig;
pub use correction::{apply_fixes, Correction, EditKind, TextEdit};
pub use detector::{CancelToken, Detector, DetectorRegistry};
pub use error::{AnalysisError, DetectorError};
pub use fusion::fuse;
pub use orchestrator::Orchestrator;

/// Registry entry as listed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorInfo {
    pub id: String,
    pub category: Category,
    pub description: String,
}

/// DefectEngine entry point
#[derive(Debug, Clone)]
pub struct DefectEngine {
    orchestrator: Orchestrator,
}

impl DefectEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let registry = DetectorRegistry::from_config(config)?;
        Ok(Self {
            orchestrator: Orchestrator::new(Arc::new(registry), config),
        })
    }

    pub fn from_registry(registry: DetectorRegistry, config: &EngineConfig) -> Self {
        Self {
            orchestrator: Orchestrator::new(Arc::new(registry), config),
        }
    }

    pub async fn analyze(&self, document: &Document) -> Result<ErrorReport, AnalysisError> {
        self.orchestrator.analyze(document).await
    }

    /// Normalize raw bytes and analyze them. Normalization errors are
    /// returned before any detector runs.
    pub async fn analyze_bytes(
        &self,
        raw_bytes: Vec<u8>,
        mime_kind: MimeKind,
    ) -> Result<ErrorReport, AnalysisError> {
        let document = Document::load(raw_bytes, mime_kind)?;
        self.analyze(&document).await
    }

    /// Analyze `text` as a plain-text document and apply every
    /// non-conflicting suggested fix to its normalized text.
    pub async fn correct_text(
        &self,
        text: &str,
    ) -> Result<(ErrorReport, Correction), AnalysisError> {
        let document = Document::from_text(text)?;
        let report = self.analyze(&document).await?;
        let correction = apply_fixes(document.text().as_str(), &report.errors);
        Ok((report, correction))
    }

    pub fn detectors(&self) -> Vec<DetectorInfo> {
        self.orchestrator
            .registry()
            .iter()
            .map(|d| DetectorInfo {
                id: d.id().to_string(),
                category: d.category(),
                description: d.description().to_string(),
            })
            .collect()
    }
}

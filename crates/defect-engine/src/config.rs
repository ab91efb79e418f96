//! Engine configuration
//!
//! Loaded from an optional JSON file; every field has a default so a partial
//! file only overrides what it names.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline for each detector
    pub detector_timeout_ms: u64,
    /// Deadline for the whole analysis
    pub global_timeout_ms: u64,
    /// Detector ids to register, in registration (tie-break) order
    pub enabled_detectors: Vec<String>,
    pub grammar: GrammarConfig,
    pub citation: CitationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detector_timeout_ms: 5_000,
            global_timeout_ms: 15_000,
            enabled_detectors: vec![
                "grammar".to_string(),
                "citation".to_string(),
                "contradiction".to_string(),
            ],
            grammar: GrammarConfig::default(),
            citation: CitationConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalysisError::Config(format!("Invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.detector_timeout_ms == 0 || self.global_timeout_ms == 0 {
            return Err(AnalysisError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if let Some((name, _)) = self.citation.extra_statutes.iter().find(|(_, n)| **n == 0) {
            return Err(AnalysisError::Config(format!(
                "statute '{}' must have at least one article",
                name
            )));
        }
        Ok(())
    }

    pub fn detector_timeout(&self) -> Duration {
        Duration::from_millis(self.detector_timeout_ms)
    }

    pub fn global_timeout(&self) -> Duration {
        Duration::from_millis(self.global_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Additional misspelling -> correction pairs
    pub extra_confusions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationConfig {
    /// Additional statutes and their article counts
    pub extra_statutes: BTreeMap<String, u32>,
    /// Additional statutes that are no longer in force
    pub extra_repealed: Vec<String>,
}

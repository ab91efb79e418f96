//! Detector capability and registry
//!
//! A detector is anything that can scan normalized text and emit findings.
//! Detectors are selected by name at configuration time; the registry keeps
//! them in registration order, which fusion uses as a tie-break.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use document_loader::NormalizedText;
use shared_types::{Category, Finding};

use crate::config::EngineConfig;
use crate::detectors::{CitationDetector, ContradictionDetector, GrammarDetector};
use crate::error::{AnalysisError, DetectorError};

/// Cooperative cancellation flag shared between the orchestrator and a scan.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once cancelled, for use with `?` in scan loops.
    pub fn check(&self) -> Result<(), DetectorError> {
        if self.is_cancelled() {
            Err(DetectorError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One independent analysis unit.
///
/// `scan` must be a pure function of its input: detectors run concurrently
/// on worker threads and share nothing mutable. Long scans should call
/// [`CancelToken::check`] regularly.
pub trait Detector: Send + Sync {
    /// Stable registry name, also the key in the report's detector status
    fn id(&self) -> &str;

    fn category(&self) -> Category;

    fn description(&self) -> &str {
        ""
    }

    fn scan(
        &self,
        text: &NormalizedText,
        cancel: &CancelToken,
    ) -> Result<Vec<Finding>, DetectorError>;
}

/// Named detectors in registration order.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in detectors named in `config.enabled_detectors`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, AnalysisError> {
        let mut registry = Self::new();
        for name in &config.enabled_detectors {
            let detector: Arc<dyn Detector> = match name.as_str() {
                "grammar" => Arc::new(GrammarDetector::new(&config.grammar)?),
                "citation" => Arc::new(CitationDetector::new(&config.citation)?),
                "contradiction" => Arc::new(ContradictionDetector::new()),
                other => {
                    return Err(AnalysisError::Config(format!(
                        "Unknown detector '{}'. Available: grammar, citation, contradiction",
                        other
                    )))
                }
            };
            registry.register(detector)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, detector: Arc<dyn Detector>) -> Result<(), AnalysisError> {
        if self.get(detector.id()).is_some() {
            return Err(AnalysisError::Config(format!(
                "Detector '{}' registered twice",
                detector.id()
            )));
        }
        self.detectors.push(detector);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Detector>> {
        self.detectors.iter().find(|d| d.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Detector>> {
        self.detectors.iter()
    }

    /// Detector ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.detectors.iter().map(|d| d.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

//! Concurrent detector dispatch
//!
//! Every registered detector scans the same shared text on the blocking pool,
//! each under its own deadline, all under a global one. Outcomes are joined
//! before fusion runs; failures and timeouts degrade the report instead of
//! failing the request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use document_loader::Document;
use shared_types::{DetectorStatus, ErrorReport, Finding};
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::detector::{CancelToken, DetectorRegistry};
use crate::error::AnalysisError;
use crate::fusion::fuse;

/// How one detector's scan ended.
#[derive(Debug)]
enum Outcome {
    Completed(Vec<Finding>),
    Failed(String),
    TimedOut,
}

/// Cancels every token it holds when dropped, so a dropped request stops
/// its still-running scans.
struct CancelGuard(Vec<CancelToken>);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        for token in &self.0 {
            token.cancel();
        }
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<DetectorRegistry>,
    detector_timeout: Duration,
    global_timeout: Duration,
}

impl Orchestrator {
    pub fn new(registry: Arc<DetectorRegistry>, config: &EngineConfig) -> Self {
        Self::with_timeouts(registry, config.detector_timeout(), config.global_timeout())
    }

    pub fn with_timeouts(
        registry: Arc<DetectorRegistry>,
        detector_timeout: Duration,
        global_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            detector_timeout,
            global_timeout,
        }
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// Run all detectors on `document` and fuse their findings.
    ///
    /// Fails with [`AnalysisError::AnalysisUnavailable`] only when no
    /// detector completed.
    pub async fn analyze(&self, document: &Document) -> Result<ErrorReport, AnalysisError> {
        let short_ref = document.document_ref().get(..12).unwrap_or_default();
        let span = info_span!(
            "analyze",
            document = %short_ref,
            kind = ?document.mime_kind(),
            chars = document.text().len()
        );
        self.run(document).instrument(span).await
    }

    async fn run(&self, document: &Document) -> Result<ErrorReport, AnalysisError> {
        if self.registry.is_empty() {
            warn!("No detectors registered");
            return Err(AnalysisError::AnalysisUnavailable {
                detector_status: BTreeMap::new(),
            });
        }

        let started = Instant::now();
        let deadline = started + self.global_timeout;
        let text = document.shared_text();
        let text_len = text.len();

        let mut tokens = Vec::with_capacity(self.registry.len());
        let mut tasks = JoinSet::new();
        for (rank, detector) in self.registry.iter().enumerate() {
            let detector = Arc::clone(detector);
            let text = Arc::clone(&text);
            let token = CancelToken::new();
            tokens.push(token.clone());
            let per_detector = self.detector_timeout;

            tasks.spawn(async move {
                let id = detector.id().to_string();
                let scan_token = token.clone();
                let scan = tokio::task::spawn_blocking(move || detector.scan(&text, &scan_token));
                let outcome = match timeout(per_detector, scan).await {
                    Ok(Ok(Ok(findings))) => Outcome::Completed(findings),
                    Ok(Ok(Err(e))) => Outcome::Failed(e.to_string()),
                    Ok(Err(join_error)) => {
                        Outcome::Failed(format!("scan did not finish: {}", join_error))
                    }
                    Err(_) => {
                        token.cancel();
                        Outcome::TimedOut
                    }
                };
                (rank, id, outcome)
            });
        }
        let _guard = CancelGuard(tokens);

        let mut detector_status: BTreeMap<String, DetectorStatus> = BTreeMap::new();
        let mut findings_by_rank: BTreeMap<usize, Vec<Finding>> = BTreeMap::new();

        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((rank, id, outcome)))) => {
                    let status = match outcome {
                        Outcome::Completed(findings) => {
                            let valid = keep_valid_spans(&id, findings, text_len);
                            debug!(detector = %id, findings = valid.len(), "Detector completed");
                            findings_by_rank.insert(rank, valid);
                            DetectorStatus::Ok
                        }
                        Outcome::Failed(reason) => {
                            warn!(detector = %id, "Detector failed: {}", reason);
                            DetectorStatus::Failed
                        }
                        Outcome::TimedOut => {
                            warn!(
                                detector = %id,
                                "Detector exceeded {:?}", self.detector_timeout
                            );
                            DetectorStatus::TimedOut
                        }
                    };
                    detector_status.insert(id, status);
                }
                Ok(Some(Err(join_error))) => {
                    warn!("Detector task ended abnormally: {}", join_error);
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Global analysis deadline of {:?} elapsed; cancelling {} detector(s)",
                        self.global_timeout,
                        tasks.len()
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        for id in self.registry.ids() {
            detector_status.entry(id).or_insert(DetectorStatus::TimedOut);
        }

        if !detector_status.values().any(|s| s.is_ok()) {
            warn!("No detector completed");
            return Err(AnalysisError::AnalysisUnavailable { detector_status });
        }

        // registry order keeps fusion input, and so the report, deterministic
        let findings: Vec<Finding> = findings_by_rank.into_values().flatten().collect();
        let finding_count = findings.len();
        let errors = fuse(findings, &self.registry.ids(), document.offset_map());

        info!(
            "Analysis complete in {:?}: {} findings -> {} errors",
            started.elapsed(),
            finding_count,
            errors.len()
        );

        Ok(ErrorReport {
            document_ref: document.document_ref().to_string(),
            errors,
            detector_status,
        })
    }
}

/// Drop findings whose span does not fit the text.
fn keep_valid_spans(detector: &str, findings: Vec<Finding>, text_len: usize) -> Vec<Finding> {
    findings
        .into_iter()
        .filter(|f| {
            let fits = f.span.fits_within(text_len);
            if !fits {
                warn!(
                    detector = %detector,
                    "Discarding finding with span {} outside text of {} chars",
                    f.span,
                    text_len
                );
            }
            fits
        })
        .collect()
}

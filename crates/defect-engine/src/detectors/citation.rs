//! Statute citation checks
//!
//! Validates references such as `《中华人民共和国民法典》第五百条` against a
//! knowledge base of article counts, and flags statutes that were repealed
//! when the Civil Code took effect.

use std::collections::HashMap;

use document_loader::NormalizedText;
use regex::Regex;
use shared_types::{Category, Finding, Severity};

use crate::config::CitationConfig;
use crate::detector::{CancelToken, Detector};
use crate::error::{AnalysisError, DetectorError};
use crate::extractors::numerals::parse_article_number;
use crate::patterns::{REPEALED_STATUTES, STATUTE_ARTICLE_COUNTS};

const DETECTOR_ID: &str = "citation";
const REPEAL_DATE: &str = "2021-01-01";
const REPLACEMENT_STATUTE: &str = "民法典";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatuteStatus {
    InForce { articles: u32 },
    Repealed,
}

pub struct CitationDetector {
    statutes: HashMap<String, StatuteStatus>,
    pattern: Regex,
}

impl CitationDetector {
    pub fn new(config: &CitationConfig) -> Result<Self, AnalysisError> {
        let mut statutes: HashMap<String, StatuteStatus> = STATUTE_ARTICLE_COUNTS
            .iter()
            .map(|(name, articles)| {
                (
                    name.to_string(),
                    StatuteStatus::InForce {
                        articles: *articles,
                    },
                )
            })
            .collect();
        for name in REPEALED_STATUTES {
            statutes.insert(name.to_string(), StatuteStatus::Repealed);
        }
        for (name, articles) in &config.extra_statutes {
            statutes.insert(
                name.clone(),
                StatuteStatus::InForce {
                    articles: *articles,
                },
            );
        }
        for name in &config.extra_repealed {
            statutes.insert(name.clone(), StatuteStatus::Repealed);
        }

        let mut names: Vec<&str> = statutes
            .keys()
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .collect();
        names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        let alternation = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(
            r"《?(?:中华人民共和国)?(?P<name>{})》?(?:第(?P<num>[0-9０-９]+|[零〇一二两三四五六七八九十百千万]+)条)?",
            alternation
        ))
        .map_err(|e| AnalysisError::Config(format!("Invalid statute list: {}", e)))?;

        Ok(Self { statutes, pattern })
    }

    /// Number of statutes known to the detector.
    pub fn known_statutes(&self) -> usize {
        self.statutes.len()
    }
}

impl Detector for CitationDetector {
    fn id(&self) -> &str {
        DETECTOR_ID
    }

    fn category(&self) -> Category {
        Category::Citation
    }

    fn description(&self) -> &str {
        "Statute references to nonexistent articles or repealed laws"
    }

    fn scan(
        &self,
        text: &NormalizedText,
        cancel: &CancelToken,
    ) -> Result<Vec<Finding>, DetectorError> {
        let mut findings = Vec::new();

        for cap in self.pattern.captures_iter(text.as_str()) {
            cancel.check()?;
            let Some(name) = cap.name("name") else {
                continue;
            };
            let Some(status) = self.statutes.get(name.as_str()) else {
                continue;
            };

            match (*status, cap.name("num")) {
                (StatuteStatus::Repealed, _) => {
                    findings.push(
                        Finding::new(
                            DETECTOR_ID,
                            Category::Citation,
                            text.char_span(name.range()),
                            Severity::Medium,
                            format!(
                                "{} was repealed on {}; cite the {} instead",
                                name.as_str(),
                                REPEAL_DATE,
                                REPLACEMENT_STATUTE
                            ),
                        )
                        .with_confidence(0.9),
                    );
                }
                (StatuteStatus::InForce { articles }, Some(num)) => {
                    // the article reference starts at "第", one char before the number
                    let reference =
                        (num.start() - '第'.len_utf8())..(num.end() + '条'.len_utf8());
                    let article = parse_article_number(num.as_str());
                    let valid = matches!(article, Some(n) if (1..=articles).contains(&n));
                    if !valid {
                        let shown = article
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| num.as_str().to_string());
                        findings.push(Finding::new(
                            DETECTOR_ID,
                            Category::Citation,
                            text.char_span(reference),
                            Severity::High,
                            format!(
                                "{} has no article {} (valid range 1-{})",
                                name.as_str(),
                                shown,
                                articles
                            ),
                        ));
                    }
                }
                (StatuteStatus::InForce { .. }, None) => {}
            }
        }

        Ok(findings)
    }
}

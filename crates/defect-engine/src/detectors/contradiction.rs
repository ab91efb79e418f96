//! Clause-level contradiction checks
//!
//! Each clause is reduced to an assertion `(party, modality, action)`. Two
//! assertions about the same party and action conflict when one forbids what
//! the other requires or allows, or when both set different deadlines.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use document_loader::NormalizedText;
use lazy_static::lazy_static;
use regex::{Match, Regex};
use shared_types::{Category, Finding, Severity, Span};

use crate::detector::{CancelToken, Detector};
use crate::error::DetectorError;
use crate::extractors::numerals::find_period_days;
use crate::patterns::{
    build_alternation, snippet, CLAUSE_CONNECTIVES, CLAUSE_DELIMITERS, OBLIGATION_MARKERS,
    PARTY_TERMS_EN, PARTY_TERMS_ZH, PERMISSION_MARKERS, PROHIBITION_MARKERS,
};

const DETECTOR_ID: &str = "contradiction";
const MAX_UNNAMED_PARTY_CHARS: usize = 12;
const QUOTE_CHARS: usize = 20;

/// Characters that turn a following 应 into part of another word (供应, 相应, ...)
const NON_MODAL_BEFORE_YING: &[char] = &[
    '供', '相', '反', '对', '适', '响', '答', '回', '效', '感', '呼', '顺',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modality {
    Obligation,
    Prohibition,
    Permission,
}

impl Modality {
    fn label(self) -> &'static str {
        match self {
            Modality::Obligation => "obligation",
            Modality::Prohibition => "prohibition",
            Modality::Permission => "permission",
        }
    }
}

lazy_static! {
    static ref MODALITIES: HashMap<String, Modality> = {
        let mut map = HashMap::new();
        for (markers, modality) in [
            (OBLIGATION_MARKERS, Modality::Obligation),
            (PROHIBITION_MARKERS, Modality::Prohibition),
            (PERMISSION_MARKERS, Modality::Permission),
        ] {
            for marker in markers {
                map.insert(marker.to_lowercase(), modality);
            }
        }
        map
    };
    static ref MARKERS: Regex = {
        let all: Vec<&str> = OBLIGATION_MARKERS
            .iter()
            .chain(PROHIBITION_MARKERS)
            .chain(PERMISSION_MARKERS)
            .copied()
            .collect();
        build_alternation(&all, true).expect("modality markers form a valid pattern")
    };
}

/// What one clause says a party must, must not or may do.
#[derive(Debug, Clone)]
struct Assertion {
    clause: Span,
    text: String,
    party: String,
    modality: Modality,
    action: String,
    period_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContradictionDetector;

impl ContradictionDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for ContradictionDetector {
    fn id(&self) -> &str {
        DETECTOR_ID
    }

    fn category(&self) -> Category {
        Category::Contradiction
    }

    fn description(&self) -> &str {
        "Clauses that require, forbid or permit the same action inconsistently"
    }

    fn scan(
        &self,
        text: &NormalizedText,
        cancel: &CancelToken,
    ) -> Result<Vec<Finding>, DetectorError> {
        let s = text.as_str();
        let mut assertions = Vec::new();
        for range in split_clauses(s) {
            cancel.check()?;
            if let Some(assertion) = parse_assertion(&s[range.clone()], text.char_span(range)) {
                assertions.push(assertion);
            }
        }

        let mut groups: BTreeMap<(&str, &str), Vec<&Assertion>> = BTreeMap::new();
        for assertion in &assertions {
            groups
                .entry((assertion.party.as_str(), assertion.action.as_str()))
                .or_default()
                .push(assertion);
        }

        let mut findings = Vec::new();
        for group in groups.values() {
            for (j, later) in group.iter().enumerate().skip(1) {
                cancel.check()?;
                let mut worst: Option<(&Assertion, Conflict)> = None;
                for earlier in &group[..j] {
                    if let Some(conflict) = conflict_between(earlier, later) {
                        let replace = worst
                            .as_ref()
                            .map_or(true, |(_, w)| conflict.severity > w.severity);
                        if replace {
                            worst = Some((*earlier, conflict));
                        }
                    }
                }
                if let Some((earlier, conflict)) = worst {
                    findings.push(
                        Finding::new(
                            DETECTOR_ID,
                            Category::Contradiction,
                            later.clause,
                            conflict.severity,
                            format!(
                                "Contradicts earlier clause \"{}\": {}",
                                snippet(&earlier.text, QUOTE_CHARS),
                                conflict.reason
                            ),
                        )
                        .with_confidence(conflict.confidence),
                    );
                }
            }
        }

        findings.sort_by_key(|f| (f.span.start, f.span.end));
        Ok(findings)
    }
}

struct Conflict {
    severity: Severity,
    confidence: f64,
    reason: String,
}

fn conflict_between(earlier: &Assertion, later: &Assertion) -> Option<Conflict> {
    use Modality::*;
    match (earlier.modality, later.modality) {
        (Obligation, Prohibition) | (Prohibition, Obligation) => Some(Conflict {
            severity: Severity::High,
            confidence: 0.8,
            reason: format!(
                "{} conflicts with {}",
                later.modality.label(),
                earlier.modality.label()
            ),
        }),
        (Permission, Prohibition) | (Prohibition, Permission) => Some(Conflict {
            severity: Severity::Medium,
            confidence: 0.7,
            reason: format!(
                "{} conflicts with {}",
                later.modality.label(),
                earlier.modality.label()
            ),
        }),
        (a, b) if a == b => match (earlier.period_days, later.period_days) {
            (Some(before), Some(now)) if before != now => Some(Conflict {
                severity: Severity::Medium,
                confidence: 0.6,
                reason: format!("deadline of {} days conflicts with {} days", now, before),
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Byte ranges of the trimmed, non-empty clauses of `s`.
fn split_clauses(s: &str) -> Vec<Range<usize>> {
    let mut clauses = Vec::new();
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if CLAUSE_DELIMITERS.contains(&ch) {
            push_trimmed(s, start..i, &mut clauses);
            start = i + ch.len_utf8();
        }
    }
    push_trimmed(s, start..s.len(), &mut clauses);
    clauses
}

fn push_trimmed(s: &str, range: Range<usize>, out: &mut Vec<Range<usize>>) {
    let raw = &s[range.clone()];
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        let start = range.start + (raw.len() - raw.trim_start().len());
        out.push(start..start + trimmed.len());
    }
}

fn parse_assertion(clause: &str, span: Span) -> Option<Assertion> {
    let marker = MARKERS
        .find_iter(clause)
        .find(|m| !is_false_marker(clause, m))?;
    let modality = *MODALITIES.get(&marker.as_str().to_lowercase())?;
    let party = party_of(&clause[..marker.start()])?;
    let (action, period_days) = action_of(&clause[marker.end()..])?;

    Some(Assertion {
        clause: span,
        text: clause.to_string(),
        party,
        modality,
        action,
        period_days,
    })
}

fn is_false_marker(clause: &str, m: &Match<'_>) -> bool {
    let before = clause[..m.start()].chars().next_back();
    let after = clause[m.end()..].chars().next();
    match m.as_str() {
        "应" => before.is_some_and(|c| NON_MODAL_BEFORE_YING.contains(&c)) || after == Some('用'),
        "须" => after == Some('知'),
        // "May 1"
        marker if marker.eq_ignore_ascii_case("may") => clause[m.end()..]
            .trim_start()
            .starts_with(|c: char| c.is_ascii_digit()),
        _ => false,
    }
}

/// The party a clause speaks about, from the text before its modal marker.
fn party_of(prefix: &str) -> Option<String> {
    let lower = prefix.trim().to_lowercase();
    let mut rest = lower.as_str();
    'strip: loop {
        for connective in CLAUSE_CONNECTIVES {
            if let Some(tail) = rest.strip_prefix(connective) {
                let word_ends = !connective.is_ascii()
                    || !tail.starts_with(|c: char| c.is_ascii_alphanumeric());
                if word_ends {
                    rest = tail.trim_start();
                    continue 'strip;
                }
            }
        }
        break;
    }
    let rest = rest.trim_matches(|c: char| c.is_whitespace() || ",，、:：".contains(c));
    if rest.is_empty() {
        return None;
    }

    let known = PARTY_TERMS_ZH
        .iter()
        .chain(PARTY_TERMS_EN)
        .filter_map(|term| rest.find(term).map(|pos| (pos, *term)))
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())));
    match known {
        Some((_, term)) => Some(term.to_string()),
        None if rest.chars().count() <= MAX_UNNAMED_PARTY_CHARS => Some(rest.to_string()),
        None => None,
    }
}

/// Normalized action key and deadline, from the text after the modal marker.
fn action_of(rest: &str) -> Option<(String, Option<u32>)> {
    let lower = rest.to_lowercase();
    let (core, days) = match find_period_days(&lower) {
        Some((days, range)) => {
            let before = lower[..range.start].trim_end();
            let before = before
                .strip_suffix("within")
                .or_else(|| before.strip_suffix('在'))
                .or_else(|| before.strip_suffix('于'))
                .unwrap_or(before);
            let after = lower[range.end..].trim_start();
            let after = after
                .strip_prefix("以内")
                .or_else(|| after.strip_prefix("之内"))
                .or_else(|| after.strip_prefix('内'))
                .unwrap_or(after);
            (format!("{} {}", before, after), Some(days))
        }
        None => (lower, None),
    };

    let core = core.trim_start();
    let core = core.strip_prefix("to ").unwrap_or(core);
    let key: String = core
        .chars()
        .filter(|c| {
            !c.is_whitespace() && !c.is_ascii_punctuation() && !"，、：“”‘’（）《》".contains(*c)
        })
        .collect();
    if key.is_empty() {
        None
    } else {
        Some((key, days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(text: &str) -> Vec<Finding> {
        ContradictionDetector::new()
            .scan(&NormalizedText::new(text), &CancelToken::new())
            .unwrap()
    }

    #[test]
    fn test_obligation_against_prohibition() {
        let findings = scan("甲方应当在十日内交付房屋。甲方不得交付房屋。");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].span, Span::new(13, 21));
        assert_eq!(findings[0].severity, Severity::High);
        assert!(findings[0].message.contains("甲方应当在十日内交付房屋"));
    }

    #[test]
    fn test_english_clauses() {
        let findings = scan("The Tenant shall pay rent monthly. Tenant shall not pay rent monthly.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].span, Span::new(35, 68));
    }

    #[test]
    fn test_permission_against_prohibition() {
        let findings = scan("乙方可以转租房屋；乙方不得转租房屋。");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].span, Span::new(9, 17));
    }

    #[test]
    fn test_conflicting_deadlines() {
        let findings = scan("乙方应当在十五日内支付租金。乙方应当在三十日内支付租金。");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert!(findings[0].message.contains("30 days"));
    }

    #[test]
    fn test_same_deadline_is_consistent() {
        assert!(scan("乙方应当在十五日内支付租金。乙方必须在十五日内支付租金。").is_empty());
    }

    #[test]
    fn test_different_parties_do_not_conflict() {
        assert!(scan("甲方不得转租房屋。乙方可以转租房屋。").is_empty());
    }

    #[test]
    fn test_obligation_and_permission_are_compatible() {
        assert!(scan("乙方应当支付押金；乙方可以支付押金。").is_empty());
    }

    #[test]
    fn test_non_modal_ying_is_ignored() {
        assert!(scan("甲方供应材料。甲方不得供应材料。").is_empty());
    }

    #[test]
    fn test_one_finding_per_later_clause() {
        let findings = scan("甲方应当公开信息。甲方不得公开信息。但甲方可以公开信息。");
        assert_eq!(findings.len(), 2);
        assert!(findings[0].span.start < findings[1].span.start);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[1].severity, Severity::Medium);
    }

    #[test]
    fn test_split_clauses_trims_whitespace() {
        let s = " a; b.\n\nc ";
        let clauses: Vec<&str> = split_clauses(s).into_iter().map(|r| &s[r]).collect();
        assert_eq!(clauses, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_party_of() {
        assert_eq!(party_of("但是甲方在收到通知后"), Some("甲方".to_string()));
        assert_eq!(party_of("However, the Landlord"), Some("landlord".to_string()));
        assert_eq!(party_of("双方"), Some("双方".to_string()));
        assert_eq!(party_of(""), None);
    }

    #[test]
    fn test_cancelled_scan() {
        let token = CancelToken::new();
        token.cancel();
        let result = ContradictionDetector::new()
            .scan(&NormalizedText::new("甲方应当付款。甲方不得付款。"), &token);
        assert_eq!(result, Err(DetectorError::Cancelled));
    }
}

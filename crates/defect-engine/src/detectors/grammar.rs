//! Grammar and spelling checks
//!
//! Rule based: a confusion lexicon of common misspellings in legal writing,
//! doubled words, English article agreement and doubled CJK punctuation.

use std::collections::HashMap;

use document_loader::NormalizedText;
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{Category, Finding, Severity};

use crate::config::GrammarConfig;
use crate::detector::{CancelToken, Detector};
use crate::error::{AnalysisError, DetectorError};
use crate::patterns::{
    build_alternation, match_case, CONSONANT_SOUND_VOWEL_START, LEGAL_CONFUSIONS_EN,
    LEGAL_CONFUSIONS_ZH, LEGITIMATE_REPEATS, VOWEL_SOUND_CONSONANT_START,
};

const DETECTOR_ID: &str = "grammar";

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\b[A-Za-z]+\b").expect("word pattern is valid");
    static ref ARTICLE: Regex =
        Regex::new(r"\b(a|an)\s+([A-Za-z]+)\b").expect("article pattern is valid");
    static ref REPEATED_PUNCTUATION: Regex =
        Regex::new(r"[，。；：、！？]{2,}").expect("punctuation pattern is valid");
}

/// A lexicon compiled to one alternation, plus its corrections.
struct Lexicon {
    pattern: Regex,
    fixes: HashMap<String, String>,
    case_insensitive: bool,
}

impl Lexicon {
    fn build(
        pairs: Vec<(String, String)>,
        case_insensitive: bool,
    ) -> Result<Option<Self>, regex::Error> {
        if pairs.is_empty() {
            return Ok(None);
        }
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        let pattern = build_alternation(&keys, case_insensitive)?;
        let fixes = pairs
            .into_iter()
            .map(|(wrong, right)| {
                let key = if case_insensitive { wrong.to_lowercase() } else { wrong };
                (key, right)
            })
            .collect();
        Ok(Some(Self {
            pattern,
            fixes,
            case_insensitive,
        }))
    }

    fn correction_for(&self, matched: &str) -> Option<String> {
        if self.case_insensitive {
            self.fixes
                .get(&matched.to_lowercase())
                .map(|fix| match_case(matched, fix))
        } else {
            self.fixes.get(matched).cloned()
        }
    }
}

pub struct GrammarDetector {
    cjk: Option<Lexicon>,
    latin: Option<Lexicon>,
}

impl GrammarDetector {
    pub fn new(config: &GrammarConfig) -> Result<Self, AnalysisError> {
        let mut cjk_pairs: Vec<(String, String)> = LEGAL_CONFUSIONS_ZH
            .iter()
            .map(|(w, r)| (w.to_string(), r.to_string()))
            .collect();
        let mut latin_pairs: Vec<(String, String)> = LEGAL_CONFUSIONS_EN
            .iter()
            .map(|(w, r)| (w.to_string(), r.to_string()))
            .collect();

        for (wrong, right) in &config.extra_confusions {
            if wrong.is_empty() || wrong == right {
                continue;
            }
            if wrong.is_ascii() {
                latin_pairs.push((wrong.to_lowercase(), right.clone()));
            } else {
                cjk_pairs.push((wrong.clone(), right.clone()));
            }
        }

        let build_error =
            |e: regex::Error| AnalysisError::Config(format!("Invalid grammar lexicon: {}", e));
        Ok(Self {
            cjk: Lexicon::build(cjk_pairs, false).map_err(build_error)?,
            latin: Lexicon::build(latin_pairs, true).map_err(build_error)?,
        })
    }

    fn scan_lexicon(
        &self,
        lexicon: &Lexicon,
        text: &NormalizedText,
        cancel: &CancelToken,
        findings: &mut Vec<Finding>,
    ) -> Result<(), DetectorError> {
        for m in lexicon.pattern.find_iter(text.as_str()) {
            cancel.check()?;
            let Some(fix) = lexicon.correction_for(m.as_str()) else {
                continue;
            };
            findings.push(
                Finding::new(
                    DETECTOR_ID,
                    Category::Grammar,
                    text.char_span(m.range()),
                    Severity::Medium,
                    format!("Possible misspelling '{}'; did you mean '{}'?", m.as_str(), fix),
                )
                .with_confidence(0.9)
                .with_fix(fix),
            );
        }
        Ok(())
    }
}

impl Detector for GrammarDetector {
    fn id(&self) -> &str {
        DETECTOR_ID
    }

    fn category(&self) -> Category {
        Category::Grammar
    }

    fn description(&self) -> &str {
        "Misspellings, doubled words, article agreement and doubled punctuation"
    }

    fn scan(
        &self,
        text: &NormalizedText,
        cancel: &CancelToken,
    ) -> Result<Vec<Finding>, DetectorError> {
        let mut findings = Vec::new();

        for lexicon in [&self.cjk, &self.latin].into_iter().flatten() {
            self.scan_lexicon(lexicon, text, cancel, &mut findings)?;
        }
        check_doubled_words(text, cancel, &mut findings)?;
        check_article_agreement(text, cancel, &mut findings)?;
        check_repeated_punctuation(text, cancel, &mut findings)?;

        Ok(findings)
    }
}

/// "the the" -> "the"; the finding covers the second occurrence and the
/// whitespace before it.
fn check_doubled_words(
    text: &NormalizedText,
    cancel: &CancelToken,
    findings: &mut Vec<Finding>,
) -> Result<(), DetectorError> {
    let s = text.as_str();
    let mut previous: Option<regex::Match<'_>> = None;

    for word in WORD.find_iter(s) {
        cancel.check()?;
        if let Some(prev) = previous {
            let gap = &s[prev.end()..word.start()];
            let repeated = !gap.is_empty()
                && gap.chars().all(char::is_whitespace)
                && prev.as_str().eq_ignore_ascii_case(word.as_str())
                && !LEGITIMATE_REPEATS.contains(&word.as_str().to_lowercase().as_str());
            if repeated {
                findings.push(
                    Finding::new(
                        DETECTOR_ID,
                        Category::Grammar,
                        text.char_span(prev.end()..word.end()),
                        Severity::Low,
                        format!("Repeated word '{}'", word.as_str()),
                    )
                    .with_confidence(0.8)
                    .with_fix(""),
                );
            }
        }
        previous = Some(word);
    }
    Ok(())
}

/// "a agreement" / "an lease"
fn check_article_agreement(
    text: &NormalizedText,
    cancel: &CancelToken,
    findings: &mut Vec<Finding>,
) -> Result<(), DetectorError> {
    for cap in ARTICLE.captures_iter(text.as_str()) {
        cancel.check()?;
        let (Some(article), Some(next)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        let word = next.as_str();
        // acronyms and single letters ("a B", "an FBI") are read letter by letter
        if word.len() < 2 || word.chars().all(|c| c.is_ascii_uppercase()) {
            continue;
        }

        let lower = word.to_lowercase();
        let starts_with_vowel = lower.starts_with(['a', 'e', 'i', 'o', 'u']);
        let vowel_sound = if starts_with_vowel {
            !CONSONANT_SOUND_VOWEL_START.iter().any(|w| lower == *w)
        } else {
            VOWEL_SOUND_CONSONANT_START.iter().any(|w| lower == *w)
        };

        let expected = if vowel_sound { "an" } else { "a" };
        if article.as_str() != expected {
            findings.push(
                Finding::new(
                    DETECTOR_ID,
                    Category::Grammar,
                    text.char_span(article.range()),
                    Severity::Low,
                    format!("Use '{}' before '{}'", expected, word),
                )
                .with_confidence(0.6)
                .with_fix(expected),
            );
        }
    }
    Ok(())
}

/// "，，" / "。。"
fn check_repeated_punctuation(
    text: &NormalizedText,
    cancel: &CancelToken,
    findings: &mut Vec<Finding>,
) -> Result<(), DetectorError> {
    for m in REPEATED_PUNCTUATION.find_iter(text.as_str()) {
        cancel.check()?;
        let first = m.as_str().chars().next().map(String::from).unwrap_or_default();
        findings.push(
            Finding::new(
                DETECTOR_ID,
                Category::Grammar,
                text.char_span(m.range()),
                Severity::Low,
                format!("Repeated punctuation '{}'", m.as_str()),
            )
            .with_confidence(0.7)
            .with_fix(first),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Span;

    fn scan(text: &str) -> Vec<Finding> {
        GrammarDetector::new(&GrammarConfig::default())
            .unwrap()
            .scan(&NormalizedText::new(text), &CancelToken::new())
            .unwrap()
    }

    #[test]
    fn test_detects_chinese_legal_misspelling() {
        let findings = scan("行政机关实施行政管理都应当公开，这是程序正档原则的要求");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].span, Span::new(18, 22));
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("程序正当"));
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_detects_multiple_misspellings() {
        let findings = scan("当事人订立合同，可以采取要约、承若方式或者其他方式");
        assert!(findings
            .iter()
            .any(|f| f.suggested_fix.as_deref() == Some("承诺")));
    }

    #[test]
    fn test_english_misspelling_keeps_case() {
        let findings = scan("Tennant shall recieve notice.");
        let fixes: Vec<_> = findings
            .iter()
            .filter_map(|f| f.suggested_fix.as_deref())
            .collect();
        assert!(fixes.contains(&"Tenant"));
        assert!(fixes.contains(&"receive"));
    }

    #[test]
    fn test_doubled_word() {
        let findings = scan("Pay the the rent.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].span, Span::new(7, 11));
        assert_eq!(findings[0].suggested_fix.as_deref(), Some(""));
    }

    #[test]
    fn test_legitimate_repeat_is_ignored() {
        assert!(scan("He said that that clause was void.").is_empty());
    }

    #[test]
    fn test_article_agreement() {
        let findings = scan("This is a agreement and an lease.");
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("an"));
        assert_eq!(findings[1].suggested_fix.as_deref(), Some("a"));
    }

    #[test]
    fn test_article_exceptions() {
        assert!(scan("a university, an hour, a user, an FBI agent").is_empty());
    }

    #[test]
    fn test_repeated_punctuation() {
        let findings = scan("甲方签字，，乙方盖章。");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].span, Span::new(4, 6));
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("，"));
    }

    #[test]
    fn test_extra_confusions_from_config() {
        let mut config = GrammarConfig::default();
        config
            .extra_confusions
            .insert("仲栽庭".to_string(), "仲裁庭".to_string());
        let detector = GrammarDetector::new(&config).unwrap();
        let findings = detector
            .scan(&NormalizedText::new("提交仲栽庭"), &CancelToken::new())
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("仲裁庭"));
    }

    #[test]
    fn test_cancelled_scan_stops() {
        let token = CancelToken::new();
        token.cancel();
        let result = GrammarDetector::new(&GrammarConfig::default())
            .unwrap()
            .scan(&NormalizedText::new("承若 the the"), &token);
        assert_eq!(result, Err(DetectorError::Cancelled));
    }

    #[test]
    fn test_clean_text() {
        assert!(scan("The tenant shall pay rent on the first day of each month.").is_empty());
    }
}

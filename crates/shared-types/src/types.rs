use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open range of code-point positions in a normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when `0 <= start <= end <= text_len`.
    pub fn fits_within(&self, text_len: usize) -> bool {
        self.start <= self.end && self.end <= text_len
    }

    /// Overlap test used by fusion.
    ///
    /// Two non-empty spans overlap when they share at least one position
    /// (`a.start < b.end && b.start < a.end`). A zero-width span is a marker
    /// at a single point and overlaps anything whose closed range contains
    /// that point, so two markers at the same position overlap.
    pub fn intersects(&self, other: &Span) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (false, false) => self.start < other.end && other.start < self.end,
            (true, true) => self.start == other.start,
            (true, false) => other.start <= self.start && self.start <= other.end,
            (false, true) => self.start <= other.start && other.start <= self.end,
        }
    }

    /// Smallest span covering both.
    pub fn union(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Severity of a finding, ordered `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn rank(self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Kind of defect a detector reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Grammar,
    Citation,
    Contradiction,
}

impl Category {
    /// Label shown to clients in the `type` field.
    pub fn label(self) -> &'static str {
        match self {
            Category::Grammar => "grammar",
            Category::Citation => "citation",
            Category::Contradiction => "contradiction",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Document formats accepted at the ingestion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeKind {
    PlainText,
    Pdf,
    WordDocument,
}

impl MimeKind {
    /// Map a declared file extension (`txt`, `.PDF`, ...) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" => Some(MimeKind::PlainText),
            "pdf" => Some(MimeKind::Pdf),
            "docx" => Some(MimeKind::WordDocument),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MimeKind::PlainText => "txt",
            MimeKind::Pdf => "pdf",
            MimeKind::WordDocument => "docx",
        }
    }
}

/// One detector's candidate defect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub detector_id: String,
    pub category: Category,
    pub span: Span,
    pub severity: Severity,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl Finding {
    pub fn new(
        detector_id: impl Into<String>,
        category: Category,
        span: Span,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            detector_id: detector_id.into(),
            category,
            span,
            severity,
            confidence: 1.0,
            message: message.into(),
            suggested_fix: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}

/// Fused, client-facing error backed by one or more findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    #[serde(rename = "type")]
    pub category: Category,
    pub position: String,
    pub message: String,
    pub severity: Severity,
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributing_findings: Vec<Finding>,
}

/// Per-detector outcome of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorStatus {
    Ok,
    Failed,
    TimedOut,
}

impl DetectorStatus {
    pub fn is_ok(self) -> bool {
        self == DetectorStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_interval_overlap() {
        assert!(Span::new(10, 15).intersects(&Span::new(12, 20)));
        assert!(!Span::new(10, 15).intersects(&Span::new(15, 20)));
        assert!(!Span::new(15, 20).intersects(&Span::new(10, 15)));
    }

    #[test]
    fn test_zero_width_markers_use_closed_containment() {
        assert!(Span::point(5).intersects(&Span::point(5)));
        assert!(!Span::point(5).intersects(&Span::point(6)));
        assert!(Span::point(15).intersects(&Span::new(10, 15)));
        assert!(Span::new(10, 15).intersects(&Span::point(10)));
        assert!(!Span::new(10, 15).intersects(&Span::point(16)));
    }

    #[test]
    fn test_span_validity() {
        assert!(Span::new(0, 0).fits_within(0));
        assert!(Span::new(2, 4).fits_within(4));
        assert!(!Span::new(2, 5).fits_within(4));
        assert!(!Span::new(3, 2).fits_within(4));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(
            [Severity::Low, Severity::High, Severity::Medium]
                .into_iter()
                .max(),
            Some(Severity::High)
        );
    }

    #[test]
    fn test_mime_kind_from_extension() {
        assert_eq!(MimeKind::from_extension(".txt"), Some(MimeKind::PlainText));
        assert_eq!(MimeKind::from_extension("PDF"), Some(MimeKind::Pdf));
        assert_eq!(
            MimeKind::from_extension(".Docx"),
            Some(MimeKind::WordDocument)
        );
        assert_eq!(MimeKind::from_extension(".doc"), None);
        assert_eq!(MimeKind::from_extension(""), None);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let f = Finding::new("g", Category::Grammar, Span::new(0, 1), Severity::Low, "x");
        assert_eq!(f.clone().with_confidence(1.7).confidence, 1.0);
        assert_eq!(f.clone().with_confidence(-0.2).confidence, 0.0);
        assert_eq!(f.with_confidence(f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_defect_serializes_category_as_type() {
        let defect = Defect {
            category: Category::Citation,
            position: "line 1, column 6".to_string(),
            message: "unknown article".to_string(),
            severity: Severity::High,
            span: Span::new(5, 11),
            suggested_fix: None,
            contributing_findings: vec![],
        };
        let json = serde_json::to_value(&defect).unwrap();
        assert_eq!(json["type"], "citation");
        assert_eq!(json["severity"], "high");
        assert!(json.get("contributing_findings").is_none());
        assert!(json.get("suggested_fix").is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn span() -> impl Strategy<Value = Span> {
        (0usize..100, 0usize..20).prop_map(|(start, len)| Span::new(start, start + len))
    }

    proptest! {
        #[test]
        fn intersects_is_symmetric(a in span(), b in span()) {
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn union_covers_both(a in span(), b in span()) {
            let u = a.union(&b);
            prop_assert!(u.start <= a.start && a.end <= u.end);
            prop_assert!(u.start <= b.start && b.end <= u.end);
        }
    }
}

//! Fusion of detector findings into client-facing defects
//!
//! Findings are merged per category with an interval sweep. Categories never
//! merge with each other: a grammar error and a citation error at the same
//! place stay two defects.

use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;

use document_loader::OffsetMap;
use shared_types::{Category, Defect, Finding, Severity, Span};

/// Merge `findings` into defects ordered by `(span.start, descending severity)`.
///
/// `detector_order` is the registry order of detector ids; when several
/// findings in one group tie on confidence, the earliest registered detector
/// supplies the message. `offsets` renders each defect's position.
pub fn fuse(
    findings: Vec<Finding>,
    detector_order: &[String],
    offsets: &OffsetMap,
) -> Vec<Defect> {
    let mut by_category: BTreeMap<Category, Vec<Finding>> = BTreeMap::new();
    for finding in findings {
        by_category.entry(finding.category).or_default().push(finding);
    }

    let mut defects = Vec::new();
    for (category, mut group) in by_category {
        group.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(b.span.end.cmp(&a.span.end))
        });
        for merged in sweep(group) {
            defects.push(to_defect(category, merged, detector_order, offsets));
        }
    }

    // stable: equal keys keep category then sweep order
    defects.sort_by_key(|d| (d.span.start, Reverse(d.severity)));
    defects
}

/// One merged group: the union span and its findings in sweep order.
struct Group {
    span: Span,
    findings: Vec<Finding>,
}

fn sweep(sorted: Vec<Finding>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for finding in sorted {
        match groups.last_mut() {
            Some(current) if current.span.intersects(&finding.span) => {
                current.span = current.span.union(&finding.span);
                current.findings.push(finding);
            }
            _ => groups.push(Group {
                span: finding.span,
                findings: vec![finding],
            }),
        }
    }
    groups
}

fn to_defect(
    category: Category,
    group: Group,
    detector_order: &[String],
    offsets: &OffsetMap,
) -> Defect {
    let rank = |id: &str| {
        detector_order
            .iter()
            .position(|d| d == id)
            .unwrap_or(usize::MAX)
    };

    // max_by keeps the last of equal elements, so compare reversed to prefer
    // the earliest finding in sweep order
    let best = group
        .findings
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| rank(&b.detector_id).cmp(&rank(&a.detector_id)))
                .then_with(|| ib.cmp(ia))
        })
        .map(|(_, f)| f);

    let severity = group
        .findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Severity::Low);
    let message = best.map(|f| f.message.clone()).unwrap_or_default();
    // a fix only makes sense if it was written for the whole merged span
    let suggested_fix = best
        .filter(|f| f.span == group.span)
        .and_then(|f| f.suggested_fix.clone());

    Defect {
        category,
        position: offsets.describe(group.span),
        message,
        severity,
        span: group.span,
        suggested_fix,
        contributing_findings: group.findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn order() -> Vec<String> {
        vec![
            "grammar".to_string(),
            "citation".to_string(),
            "contradiction".to_string(),
        ]
    }

    fn finding(id: &str, category: Category, start: usize, end: usize, sev: Severity) -> Finding {
        Finding::new(id, category, Span::new(start, end), sev, format!("{} {}", id, start))
    }

    fn fuse_on(findings: Vec<Finding>) -> Vec<Defect> {
        let text = "x".repeat(64);
        fuse(findings, &order(), &OffsetMap::for_text(&text))
    }

    #[test]
    fn test_overlapping_same_category_merge() {
        let defects = fuse_on(vec![
            finding("grammar", Category::Grammar, 10, 15, Severity::Low),
            finding("grammar", Category::Grammar, 12, 20, Severity::Medium),
        ]);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].span, Span::new(10, 20));
        assert_eq!(defects[0].severity, Severity::Medium);
        assert_eq!(defects[0].contributing_findings.len(), 2);
        assert_eq!(defects[0].position, "line 1, column 11");
    }

    #[test]
    fn test_adjacent_spans_do_not_merge() {
        let defects = fuse_on(vec![
            finding("grammar", Category::Grammar, 10, 15, Severity::Low),
            finding("grammar", Category::Grammar, 15, 20, Severity::Low),
        ]);
        assert_eq!(defects.len(), 2);
    }

    #[test]
    fn test_cross_category_never_merges() {
        let defects = fuse_on(vec![
            finding("grammar", Category::Grammar, 5, 11, Severity::Low),
            finding("citation", Category::Citation, 5, 11, Severity::High),
        ]);
        assert_eq!(defects.len(), 2);
        // same start: higher severity first
        assert_eq!(defects[0].category, Category::Citation);
        assert_eq!(defects[1].category, Category::Grammar);
    }

    #[test]
    fn test_zero_width_findings_at_same_point_merge() {
        let defects = fuse_on(vec![
            finding("grammar", Category::Grammar, 7, 7, Severity::Low),
            finding("grammar", Category::Grammar, 7, 7, Severity::Medium),
            finding("grammar", Category::Grammar, 9, 9, Severity::Low),
        ]);
        assert_eq!(defects.len(), 2);
        assert_eq!(defects[0].span, Span::point(7));
        assert_eq!(defects[0].severity, Severity::Medium);
    }

    #[test]
    fn test_zero_width_marker_at_span_boundary_merges() {
        let defects = fuse_on(vec![
            finding("grammar", Category::Grammar, 3, 8, Severity::Low),
            finding("grammar", Category::Grammar, 8, 8, Severity::Low),
        ]);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].span, Span::new(3, 8));
    }

    #[test]
    fn test_transitive_merge_uses_union() {
        let defects = fuse_on(vec![
            finding("grammar", Category::Grammar, 0, 5, Severity::Low),
            finding("grammar", Category::Grammar, 4, 9, Severity::Low),
            finding("grammar", Category::Grammar, 8, 12, Severity::Low),
        ]);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].span, Span::new(0, 12));
    }

    #[test]
    fn test_message_from_highest_confidence() {
        let defects = fuse_on(vec![
            finding("grammar", Category::Grammar, 0, 5, Severity::Low).with_confidence(0.4),
            finding("grammar", Category::Grammar, 2, 5, Severity::Low).with_confidence(0.9),
        ]);
        assert_eq!(defects[0].message, "grammar 2");
    }

    #[test]
    fn test_message_tie_break_by_registration_order() {
        let defects = fuse_on(vec![
            finding("contradiction", Category::Grammar, 0, 5, Severity::Low),
            finding("grammar", Category::Grammar, 1, 5, Severity::Low),
        ]);
        assert_eq!(defects[0].message, "grammar 1");
    }

    #[test]
    fn test_message_tie_break_by_sweep_order() {
        let defects = fuse_on(vec![
            finding("grammar", Category::Grammar, 1, 5, Severity::Low),
            finding("grammar", Category::Grammar, 0, 5, Severity::Low),
        ]);
        assert_eq!(defects[0].message, "grammar 0");
    }

    #[test]
    fn test_fix_kept_only_when_it_covers_the_merged_span() {
        let single = fuse_on(vec![
            finding("grammar", Category::Grammar, 0, 4, Severity::Low).with_fix("abcd")
        ]);
        assert_eq!(single[0].suggested_fix.as_deref(), Some("abcd"));

        let merged = fuse_on(vec![
            finding("grammar", Category::Grammar, 0, 4, Severity::Low)
                .with_fix("abcd")
                .with_confidence(0.9),
            finding("grammar", Category::Grammar, 2, 6, Severity::Low).with_confidence(0.1),
        ]);
        assert_eq!(merged[0].suggested_fix, None);
    }

    #[test]
    fn test_final_order_by_start_then_severity() {
        let defects = fuse_on(vec![
            finding("contradiction", Category::Contradiction, 30, 40, Severity::Medium),
            finding("grammar", Category::Grammar, 2, 3, Severity::Low),
            finding("citation", Category::Citation, 30, 34, Severity::High),
        ]);
        let spans: Vec<(usize, Severity)> =
            defects.iter().map(|d| (d.span.start, d.severity)).collect();
        assert_eq!(
            spans,
            vec![(2, Severity::Low), (30, Severity::High), (30, Severity::Medium)]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(fuse_on(vec![]).is_empty());
    }
}

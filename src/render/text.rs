//! Plain text reports.

use std::fmt::Write;

use crate::layout::PageLayout;
use crate::model::GeometryDocument;

/// Line-by-line report of a page layout with spacing flags.
///
/// ```text
/// Page 1: 3 lines, median spacing 14.00
///    1  y=700.00          First line
///    2  y=686.00  +14.00  Second line
///    3  y=650.00  +36.00  ! Third line
/// ```
pub fn layout_report(layout: &PageLayout) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Page {}: {} lines, median spacing {:.2}",
        layout.page,
        layout.line_count(),
        layout.spacing.median
    );
    for line in &layout.lines {
        let spacing = line
            .spacing_above
            .map(|gap| format!("{:+.2}", gap))
            .unwrap_or_default();
        let flag = if line.mismatch { "! " } else { "" };
        let _ = writeln!(
            out,
            "{:>4}  y={:<8.2} {:>7}  {}{}",
            line.number,
            line.baseline,
            spacing,
            flag,
            line.text()
        );
    }
    out
}

/// Per-page element summary of a geometry document.
pub fn geometry_summary(document: &GeometryDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Schema:   {}", document.schema_version());
    let _ = writeln!(out, "Doc ID:   {}", document.doc_id());
    let _ = writeln!(
        out,
        "Pages:    {} ({} elements)",
        document.page_count(),
        document.element_count()
    );
    for page in document.pages() {
        let _ = writeln!(out, "  Page {} ({} elements)", page.number(), page.element_count());
        for element in &page.elements {
            let top = element
                .quads_for(Default::default())
                .iter()
                .map(|q| q.top_y())
                .fold(f64::NEG_INFINITY, f64::max);
            let _ = writeln!(
                out,
                "    {:<6} {:<24} quads={} top={:.2}",
                element.role,
                element.id,
                element.quad_count(),
                top
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, Page, PageTokens, Quad, Role, Word};

    #[test]
    fn test_layout_report_flags() {
        let mut tokens = PageTokens::new(1);
        tokens.words = vec![
            Word::new("one", 72.0, 300.0, 20.0, 10.0),
            Word::new("two", 72.0, 250.0, 20.0, 10.0),
            Word::new("three", 72.0, 150.0, 30.0, 10.0),
        ];
        let report = layout_report(&PageLayout::analyze(&tokens));
        assert!(report.starts_with("Page 1: 3 lines, median spacing 75.00"));
        assert!(report.contains("+50.00  ! two"));
        assert!(report.contains("+100.00  ! three"));
        assert!(!report.contains("! one"));
    }

    #[test]
    fn test_geometry_summary() {
        let quad = Quad::from_rect(72.0, 492.0, 540.0, 692.0);
        let doc = GeometryDocument::new(
            "abc",
            vec![Page::with_elements(0, vec![Element::region("fig-1", Role::Fig, "en", quad)])],
        )
        .unwrap();
        let summary = geometry_summary(&doc);
        assert!(summary.contains("Doc ID:   abc"));
        assert!(summary.contains("Page 1 (1 elements)"));
        assert!(summary.contains("fig-1"));
        assert!(summary.contains("top=692.00"));
    }
}

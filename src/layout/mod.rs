//! Line layout analysis over renderer-supplied tokens.
//!
//! A [`PageLayout`] is the derived view of one page: its words clustered into
//! baseline-aligned lines, each line split into column fragments, plus the spacing
//! report and font statistics. It is computed in one pass and never patched; a page
//! change throws it away.

mod lines;
mod spacing;
mod stats;

pub use lines::{Fragment, LineGroup, LineGrouper, LineOptions};
pub use spacing::{SpacingAnalyzer, SpacingOptions, SpacingReport};
pub use stats::{median, FontStats};

use serde::Serialize;

use crate::model::PageTokens;

/// Derived layout of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    /// 1-based page number
    pub page: u32,
    pub lines: Vec<LineGroup>,
    pub spacing: SpacingReport,
    pub font_stats: FontStats,
}

impl PageLayout {
    /// Analyze a page with default options.
    pub fn analyze(tokens: &PageTokens) -> Self {
        Self::analyze_with(tokens, &LineOptions::default(), &SpacingOptions::default())
    }

    /// Analyze a page with explicit options.
    pub fn analyze_with(
        tokens: &PageTokens,
        line_options: &LineOptions,
        spacing_options: &SpacingOptions,
    ) -> Self {
        let mut lines = LineGrouper::new(line_options.clone()).group(&tokens.words);
        let spacing = SpacingAnalyzer::new(spacing_options.clone()).analyze(&mut lines);
        Self {
            page: tokens.page,
            lines,
            spacing,
            font_stats: tokens.font_stats(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line by its 1-based number.
    pub fn line(&self, number: usize) -> Option<&LineGroup> {
        number.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    /// First line whose box contains the page-space `y`.
    pub fn line_at(&self, y: f64) -> Option<&LineGroup> {
        self.lines.iter().find(|l| l.contains_y(y))
    }

    /// Line with the baseline closest to `y`.
    pub fn nearest_line(&self, y: f64) -> Option<&LineGroup> {
        self.lines
            .iter()
            .min_by(|a, b| (a.baseline - y).abs().total_cmp(&(b.baseline - y).abs()))
    }

    /// Lines flagged by the spacing analysis.
    pub fn mismatched_lines(&self) -> impl Iterator<Item = &LineGroup> {
        self.lines.iter().filter(|l| l.mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Word;

    fn page() -> PageTokens {
        let mut tokens = PageTokens::new(2);
        tokens.words = vec![
            Word::new("First", 72.0, 700.0, 30.0, 10.0),
            Word::new("line", 106.0, 700.0, 20.0, 10.0),
            Word::new("Second", 72.0, 686.0, 36.0, 12.0),
            Word::new("Third", 72.0, 600.0, 30.0, 10.0),
        ];
        tokens
    }

    #[test]
    fn test_analyze_page() {
        let layout = PageLayout::analyze(&page());
        assert_eq!(layout.page, 2);
        assert_eq!(layout.line_count(), 3);
        assert_eq!(layout.line(1).map(|l| l.text()), Some("First line".to_string()));
        assert_eq!(layout.spacing.median, 50.0);
        assert_eq!(layout.font_stats.max, 12.0);
        assert!(layout.line(0).is_none());
    }

    #[test]
    fn test_line_lookup() {
        let layout = PageLayout::analyze(&page());
        assert_eq!(layout.line_at(705.0).map(|l| l.number), Some(1));
        assert!(layout.line_at(650.0).is_none());
        assert_eq!(layout.nearest_line(620.0).map(|l| l.number), Some(3));
        assert_eq!(layout.nearest_line(690.0).map(|l| l.number), Some(2));
    }
}

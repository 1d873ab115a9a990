//! Inter-line spacing statistics and anomaly flags.

use serde::Serialize;

use super::lines::LineGroup;
use super::stats::median;

/// Options for spacing analysis.
#[derive(Debug, Clone)]
pub struct SpacingOptions {
    /// Allowed deviation from the page median, in percent
    pub threshold_pct: f64,
}

impl SpacingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deviation threshold in percent.
    pub fn with_threshold_pct(mut self, pct: f64) -> Self {
        self.threshold_pct = pct;
        self
    }
}

impl Default for SpacingOptions {
    fn default() -> Self {
        Self { threshold_pct: 15.0 }
    }
}

/// Page-level spacing summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacingReport {
    /// Median of the positive baseline gaps; 0 when there are none
    pub median: f64,
    /// Numbers of the lines flagged as mismatched
    pub mismatched: Vec<usize>,
}

impl SpacingReport {
    pub fn has_mismatches(&self) -> bool {
        !self.mismatched.is_empty()
    }
}

/// Flags lines whose distance to the line above deviates from the page median.
///
/// Every line is judged on its own against one page-wide median. Two-sample pages
/// with alternating gaps therefore flag both lines.
#[derive(Debug, Clone, Default)]
pub struct SpacingAnalyzer {
    options: SpacingOptions,
}

impl SpacingAnalyzer {
    pub fn new(options: SpacingOptions) -> Self {
        Self { options }
    }

    /// Fill `spacing_above` and `mismatch` on lines ordered top to bottom.
    pub fn analyze(&self, lines: &mut [LineGroup]) -> SpacingReport {
        let mut previous: Option<f64> = None;
        for line in lines.iter_mut() {
            line.spacing_above = previous.map(|above| above - line.baseline);
            line.mismatch = false;
            previous = Some(line.baseline);
        }

        let gaps: Vec<f64> = lines
            .iter()
            .filter_map(|l| l.spacing_above)
            .filter(|gap| *gap > 0.0)
            .collect();
        let page_median = median(&gaps);
        let limit = self.options.threshold_pct / 100.0;

        let mut mismatched = Vec::new();
        for line in lines.iter_mut() {
            let gap = match line.spacing_above {
                Some(gap) if gap != 0.0 => gap,
                _ => continue,
            };
            let deviation = if page_median > 0.0 {
                (gap - page_median).abs() / page_median
            } else {
                0.0
            };
            if deviation > limit {
                line.mismatch = true;
                mismatched.push(line.number);
            }
        }

        if !mismatched.is_empty() {
            log::debug!(
                "{} of {} lines deviate from median spacing {:.2}",
                mismatched.len(),
                lines.len(),
                page_median
            );
        }

        SpacingReport {
            median: page_median,
            mismatched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LineGrouper;
    use crate::model::Word;

    fn lines_at(baselines: &[f64]) -> Vec<LineGroup> {
        let words: Vec<Word> = baselines
            .iter()
            .map(|y| Word::new("w", 72.0, *y, 10.0, 10.0))
            .collect();
        LineGrouper::default().group(&words)
    }

    #[test]
    fn test_two_sample_page_flags_both() {
        let mut lines = lines_at(&[300.0, 250.0, 150.0]);
        let report = SpacingAnalyzer::default().analyze(&mut lines);

        assert_eq!(report.median, 75.0);
        assert_eq!(lines[0].spacing_above, None);
        assert!(!lines[0].mismatch);
        assert_eq!(lines[1].spacing_above, Some(50.0));
        assert_eq!(lines[2].spacing_above, Some(100.0));
        assert!(lines[1].mismatch);
        assert!(lines[2].mismatch);
        assert_eq!(report.mismatched, vec![2, 3]);
    }

    #[test]
    fn test_uniform_spacing_has_no_mismatch() {
        let mut lines = lines_at(&[700.0, 686.0, 672.0, 658.0]);
        let report = SpacingAnalyzer::default().analyze(&mut lines);
        assert_eq!(report.median, 14.0);
        assert!(!report.has_mismatches());
    }

    #[test]
    fn test_threshold_is_strict() {
        // 12 vs median 14 is ~14.3%, within 15%
        let mut lines = lines_at(&[700.0, 686.0, 672.0, 660.0, 646.0]);
        let report = SpacingAnalyzer::default().analyze(&mut lines);
        assert!(!report.has_mismatches());

        let strict = SpacingAnalyzer::new(SpacingOptions::new().with_threshold_pct(10.0));
        let report = strict.analyze(&mut lines);
        assert_eq!(report.mismatched, vec![4]);
    }

    #[test]
    fn test_single_line() {
        let mut lines = lines_at(&[500.0]);
        let report = SpacingAnalyzer::default().analyze(&mut lines);
        assert_eq!(report.median, 0.0);
        assert!(report.mismatched.is_empty());
    }
}

//! Baseline clustering of positioned words into lines and column fragments.

use serde::Serialize;

use super::stats::median;
use crate::model::{Bounds, Word, ASCENT_RATIO, DESCENT_RATIO};

/// Options for line grouping.
#[derive(Debug, Clone)]
pub struct LineOptions {
    /// Maximum baseline distance (page units) for a word to join a line
    pub baseline_tolerance: f64,

    /// Smallest horizontal gap that can split a line into fragments
    pub min_column_gap: f64,

    /// Multiple of the median word gap above which a gap splits fragments
    pub column_gap_factor: f64,

    /// Fraction of the largest font size used above the baseline for line bounds
    pub ascent_ratio: f64,

    /// Fraction of the largest font size used below the baseline for line bounds
    pub descent_ratio: f64,
}

impl LineOptions {
    /// Create new line options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the baseline tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.baseline_tolerance = tolerance;
        self
    }

    /// Set the minimum column gap.
    pub fn with_min_column_gap(mut self, gap: f64) -> Self {
        self.min_column_gap = gap;
        self
    }

    /// Set the median-gap multiplier.
    pub fn with_column_gap_factor(mut self, factor: f64) -> Self {
        self.column_gap_factor = factor;
        self
    }
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            baseline_tolerance: 4.0,
            min_column_gap: 40.0,
            column_gap_factor: 2.5,
            ascent_ratio: ASCENT_RATIO,
            descent_ratio: DESCENT_RATIO,
        }
    }
}

/// A run of words within a line, separated from its neighbours by a column gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub words: Vec<Word>,
    /// Words joined by a single space
    pub text: String,
    pub left: f64,
    pub right: f64,
}

impl Fragment {
    fn from_words(words: Vec<Word>) -> Self {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let left = words.iter().map(|w| w.x).fold(f64::INFINITY, f64::min);
        let right = words.iter().map(Word::right).fold(f64::NEG_INFINITY, f64::max);
        Self {
            words,
            text,
            left,
            right,
        }
    }

    /// Inclusive horizontal containment.
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.left && x <= self.right
    }

    /// Horizontal centre.
    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// A line of words sharing a baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineGroup {
    /// 1-based position, top to bottom
    pub number: usize,
    /// Baseline Y (the first word's baseline)
    pub baseline: f64,
    /// Words sorted left to right
    pub words: Vec<Word>,
    /// Column fragments, left to right
    pub fragments: Vec<Fragment>,
    pub bounds: Bounds,
    pub max_font_size: f64,
    /// Baseline distance to the line above; `None` for the first line
    pub spacing_above: Option<f64>,
    /// Whether the spacing deviates from the page median beyond the threshold
    pub mismatch: bool,
}

impl LineGroup {
    /// Full line text: fragments joined by two spaces.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Inclusive vertical containment within the line box.
    pub fn contains_y(&self, y: f64) -> bool {
        y <= self.bounds.top && y >= self.bounds.bottom
    }

    /// Fragment whose horizontal span contains `x`.
    pub fn fragment_at(&self, x: f64) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.contains_x(x))
    }

    /// Fragment whose centre is closest to `x`.
    pub fn nearest_fragment(&self, x: f64) -> Option<&Fragment> {
        self.fragments
            .iter()
            .min_by(|a, b| (a.center_x() - x).abs().total_cmp(&(b.center_x() - x).abs()))
    }

    /// Number of words in the line.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

/// Clusters words into baseline-aligned lines.
#[derive(Debug, Clone, Default)]
pub struct LineGrouper {
    options: LineOptions,
}

impl LineGrouper {
    /// Create a grouper with the given options.
    pub fn new(options: LineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LineOptions {
        &self.options
    }

    /// Cluster words by baseline. Each word joins the first line whose baseline is
    /// within tolerance, otherwise it opens a new line. Returns `(baseline, words)`
    /// with lines ordered top to bottom and words left to right.
    pub fn cluster<'a, I>(&self, words: I) -> Vec<(f64, Vec<Word>)>
    where
        I: IntoIterator<Item = &'a Word>,
    {
        let tolerance = self.options.baseline_tolerance;
        let mut lines: Vec<(f64, Vec<Word>)> = Vec::new();

        for word in words {
            match lines
                .iter_mut()
                .find(|(baseline, _)| (baseline - word.y).abs() <= tolerance)
            {
                Some((_, members)) => members.push(word.clone()),
                None => lines.push((word.y, vec![word.clone()])),
            }
        }

        lines.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (_, members) in &mut lines {
            members.sort_by(|a, b| a.x.total_cmp(&b.x));
        }
        lines
    }

    /// Group a page's words into numbered lines with fragments and bounds.
    /// Spacing fields are left unset; see [`super::SpacingAnalyzer`].
    pub fn group(&self, words: &[Word]) -> Vec<LineGroup> {
        let clusters = self.cluster(words);
        log::debug!(
            "Grouped {} words into {} lines",
            words.len(),
            clusters.len()
        );

        clusters
            .into_iter()
            .enumerate()
            .map(|(i, (baseline, members))| self.build_line(i + 1, baseline, members))
            .collect()
    }

    fn build_line(&self, number: usize, baseline: f64, words: Vec<Word>) -> LineGroup {
        let fragments = self.split_fragments(&words);
        let max_font_size = words
            .iter()
            .map(|w| w.font_size)
            .fold(f64::NEG_INFINITY, f64::max);
        let bounds = Bounds {
            left: words.iter().map(|w| w.x).fold(f64::INFINITY, f64::min),
            right: words.iter().map(Word::right).fold(f64::NEG_INFINITY, f64::max),
            top: baseline + max_font_size * self.options.ascent_ratio,
            bottom: baseline - max_font_size * self.options.descent_ratio,
        };

        LineGroup {
            number,
            baseline,
            words,
            fragments,
            bounds,
            max_font_size,
            spacing_above: None,
            mismatch: false,
        }
    }

    /// Gap above which a line splits into a new fragment, for words sorted by x.
    ///
    /// `max(min_column_gap, median(positive gaps) * column_gap_factor)`; with fewer
    /// than two words or no positive gap the minimum applies.
    pub fn column_gap_threshold(&self, sorted: &[Word]) -> f64 {
        let min_gap = self.options.min_column_gap;
        if sorted.len() < 2 {
            return min_gap;
        }
        let gaps: Vec<f64> = sorted
            .windows(2)
            .map(|pair| pair[1].x - pair[0].right())
            .filter(|gap| *gap > 0.0)
            .collect();
        if gaps.is_empty() {
            return min_gap;
        }
        min_gap.max(median(&gaps) * self.options.column_gap_factor)
    }

    /// Split words sorted by x into fragments at gaps wider than the threshold.
    pub fn split_fragments(&self, sorted: &[Word]) -> Vec<Fragment> {
        let threshold = self.column_gap_threshold(sorted);
        let mut fragments = Vec::new();
        let mut current: Vec<Word> = Vec::new();
        let mut last_right: Option<f64> = None;

        for word in sorted {
            if let Some(right) = last_right {
                if word.x - right > threshold && !current.is_empty() {
                    fragments.push(Fragment::from_words(std::mem::take(&mut current)));
                }
            }
            current.push(word.clone());
            last_right = Some(word.right());
        }
        if !current.is_empty() {
            fragments.push(Fragment::from_words(current));
        }
        fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f64, y: f64, width: f64) -> Word {
        Word::new(text, x, y, width, 10.0)
    }

    #[test]
    fn test_baseline_clustering() {
        let words = vec![
            word("a", 0.0, 100.0, 5.0),
            word("b", 10.0, 100.5, 5.0),
            word("c", 0.0, 200.0, 5.0),
        ];
        let lines = LineGrouper::default().group(&words);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].baseline, 200.0);
        assert_eq!(lines[1].baseline, 100.0);
        assert_eq!(lines[1].word_count(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[1].number, 2);
    }

    #[test]
    fn test_first_fit_uses_first_word_baseline() {
        // 100 -> 103.5 joins (3.5), 107 is 7 away from the line's baseline
        let words = vec![
            word("a", 0.0, 100.0, 5.0),
            word("b", 10.0, 103.5, 5.0),
            word("c", 20.0, 107.0, 5.0),
        ];
        let lines = LineGrouper::default().group(&words);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].baseline, 107.0);
    }

    #[test]
    fn test_words_sorted_left_to_right() {
        let words = vec![
            word("world", 50.0, 100.0, 20.0),
            word("hello", 10.0, 100.0, 20.0),
        ];
        let lines = LineGrouper::default().group(&words);
        assert_eq!(lines[0].text(), "hello world");
    }

    #[test]
    fn test_column_gap_threshold_example() {
        let words = vec![
            word("a", 0.0, 100.0, 10.0),
            word("b", 15.0, 100.0, 10.0),
            word("c", 100.0, 100.0, 10.0),
        ];
        let grouper = LineGrouper::default();
        assert_eq!(grouper.column_gap_threshold(&words), 100.0);

        let lines = grouper.group(&words);
        assert_eq!(lines[0].fragments.len(), 1);
        assert_eq!(lines[0].fragments[0].text, "a b c");
    }

    #[test]
    fn test_column_split() {
        let words = vec![
            word("l1", 72.0, 500.0, 20.0),
            word("l2", 95.0, 500.0, 20.0),
            word("l3", 118.0, 500.0, 20.0),
            word("r1", 320.0, 500.0, 20.0),
            word("r2", 343.0, 500.0, 20.0),
        ];
        let lines = LineGrouper::default().group(&words);
        let line = &lines[0];
        assert_eq!(line.fragments.len(), 2);
        assert_eq!(line.fragments[0].text, "l1 l2 l3");
        assert_eq!(line.fragments[1].text, "r1 r2");
        assert_eq!(line.text(), "l1 l2 l3  r1 r2");
        assert_eq!(line.fragment_at(330.0).map(|f| f.text.as_str()), Some("r1 r2"));
        assert_eq!(line.nearest_fragment(200.0).map(|f| f.left), Some(72.0));
    }

    #[test]
    fn test_threshold_defaults() {
        let grouper = LineGrouper::default();
        assert_eq!(grouper.column_gap_threshold(&[word("a", 0.0, 0.0, 5.0)]), 40.0);
        // Overlapping words produce no positive gaps
        let overlapping = vec![word("a", 0.0, 0.0, 10.0), word("b", 5.0, 0.0, 10.0)];
        assert_eq!(grouper.column_gap_threshold(&overlapping), 40.0);
    }

    #[test]
    fn test_line_bounds() {
        let words = vec![
            Word::new("big", 10.0, 700.0, 30.0, 20.0),
            Word::new("small", 50.0, 700.0, 25.0, 10.0),
        ];
        let lines = LineGrouper::default().group(&words);
        let b = lines[0].bounds;
        assert_eq!(b.left, 10.0);
        assert_eq!(b.right, 75.0);
        assert!((b.top - 716.0).abs() < 1e-9);
        assert!((b.bottom - 696.0).abs() < 1e-9);
        assert_eq!(lines[0].max_font_size, 20.0);
        assert!(lines[0].contains_y(710.0));
        assert!(!lines[0].contains_y(720.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(LineGrouper::default().group(&[]).is_empty());
    }
}

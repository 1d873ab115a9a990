//! Small statistics helpers shared by the layout analyzers.

use serde::{Deserialize, Serialize};

use crate::model::Word;

/// Median of a sample; 0 for an empty sample. Even-sized samples average the two
/// middle values.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Font size statistics for a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FontStats {
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl FontStats {
    /// Compute from a page's words; all zero when there are none.
    pub fn from_words(words: &[Word]) -> Self {
        if words.is_empty() {
            return Self::default();
        }
        let sizes: Vec<f64> = words.iter().map(|w| w.font_size).collect();
        Self {
            median: median(&sizes),
            min: sizes.iter().copied().fold(f64::INFINITY, f64::min),
            max: sizes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

//! Text selection by rectangle.

use serde::Serialize;

use crate::layout::{LineGrouper, LineOptions};
use crate::model::{Bounds, Word};

/// Text captured by a rectangular selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Words joined by a space within a line, lines joined by newlines
    pub text: String,
    pub line_count: usize,
    pub word_count: usize,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }
}

/// Collect the words whose glyph boxes intersect `rect`, in reading order.
pub fn select_text(words: &[Word], rect: &Bounds) -> Selection {
    select_text_with(words, rect, &LineOptions::default())
}

/// [`select_text`] with explicit line-clustering options.
pub fn select_text_with(words: &[Word], rect: &Bounds, options: &LineOptions) -> Selection {
    let hits = words.iter().filter(|w| w.bounds().intersects(rect));
    let lines = LineGrouper::new(options.clone()).cluster(hits);

    let word_count = lines.iter().map(|(_, members)| members.len()).sum();
    let text = lines
        .iter()
        .map(|(_, members)| {
            members
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    Selection {
        text,
        line_count: lines.len(),
        word_count,
    }
}

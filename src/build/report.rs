//! Non-fatal build diagnostics.

use serde::Serialize;
use thiserror::Error;

use super::marks::MarkKind;

/// A recoverable problem found while building geometry.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BuildWarning {
    /// A record failed validation and was skipped.
    #[error("{source_name}:{line}: malformed mark ({reason})")]
    #[serde(rename_all = "camelCase")]
    MalformedMark {
        source_name: String,
        line: usize,
        reason: String,
    },

    /// Only one half of a start/end pair was seen.
    #[error("'{id}' has no {missing} mark; region dropped")]
    UnpairedFloat { id: String, missing: MarkKind },

    /// Start and end landed on different pages.
    #[error("'{id}' spans pages {first_page} and {other_page}; region dropped")]
    #[serde(rename_all = "camelCase")]
    CrossPageFloat {
        id: String,
        first_page: u32,
        other_page: u32,
    },

    /// The page is no wider than the two margins, so the region would lie off the page.
    #[error("'{id}' on page {page} is {page_width}pt wide, inside the margins; region dropped")]
    #[serde(rename_all = "camelCase")]
    NarrowPage {
        id: String,
        page: u32,
        page_width: f64,
    },

    /// Sources had data but none produced an element.
    #[error("no elements could be resolved (tried: {})", .tried.join(", "))]
    EmptyGeometry { tried: Vec<String> },
}

/// Diagnostics gathered during one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    /// Sources consulted, in order
    pub tried: Vec<String>,
    /// Valid marks read across the sources consulted
    pub marks_read: usize,
    /// Single-point anchors seen (not turned into regions)
    pub anchors: usize,
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one variant, by predicate.
    pub fn count_where(&self, pred: impl Fn(&BuildWarning) -> bool) -> usize {
        self.warnings.iter().filter(|w| pred(w)).count()
    }
}

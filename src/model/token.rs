//! Positioned tokens supplied by an external page renderer.
//!
//! The core never extracts these from a PDF itself. A renderer hands over text runs
//! (or ready-made words) and image placements for the active page; everything
//! downstream (line grouping, spacing analysis, hit-testing) consumes them.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Bounds, Point};

/// Fraction of the font size above the baseline covered by glyphs.
pub const ASCENT_RATIO: f64 = 0.8;
/// Fraction of the font size below the baseline covered by glyphs.
pub const DESCENT_RATIO: f64 = 0.2;

/// A word positioned on its baseline, in page space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// The word text
    pub text: String,
    /// Left edge
    pub x: f64,
    /// Baseline Y
    pub y: f64,
    /// Advance width
    pub width: f64,
    /// Glyph box height (usually the font size)
    pub height: f64,
    /// Font size in points
    pub font_size: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, font_size: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height: font_size,
            font_size,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Approximate glyph box from the baseline and height.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            left: self.x,
            right: self.right(),
            top: self.y + self.height * ASCENT_RATIO,
            bottom: self.y - self.height * DESCENT_RATIO,
        }
    }

    /// Index of the character under `x`, clamped to the word.
    pub fn char_index_at(&self, x: f64) -> usize {
        let count = self.text.chars().count();
        if count == 0 || self.width <= 0.0 {
            return 0;
        }
        let char_width = self.width / count as f64;
        let index = ((x - self.x) / char_width).floor();
        if index <= 0.0 {
            0
        } else {
            (index as usize).min(count - 1)
        }
    }
}

/// An image placement on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRegion {
    /// 1-based image counter within the page
    pub number: u32,
    /// Placement bounds in page space
    pub bounds: Bounds,
}

impl ImageRegion {
    pub fn new(number: u32, bounds: Bounds) -> Self {
        Self { number, bounds }
    }

    /// Bounds of the unit square mapped through a `[a, b, c, d, e, f]` transform.
    pub fn from_transform(number: u32, ctm: [f64; 6]) -> Self {
        let [a, b, c, d, e, f] = ctm;
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let mapped = corners.map(|(x, y)| Point::new(a * x + c * y + e, b * x + d * y + f));
        let mut bounds = Bounds {
            left: f64::INFINITY,
            right: f64::NEG_INFINITY,
            top: f64::NEG_INFINITY,
            bottom: f64::INFINITY,
        };
        for p in mapped {
            bounds.left = bounds.left.min(p.x);
            bounds.right = bounds.right.max(p.x);
            bounds.top = bounds.top.max(p.y);
            bounds.bottom = bounds.bottom.min(p.y);
        }
        Self { number, bounds }
    }
}

/// A raw text item as a renderer reports it: a string drawn with a text matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    /// `[a, b, c, d, e, f]` text matrix
    pub transform: [f64; 6],
    /// Advance width of the whole run, when the renderer knows it
    #[serde(default)]
    pub width: Option<f64>,
}

impl TextRun {
    /// Horizontal font size from the matrix.
    pub fn font_size(&self) -> f64 {
        let [a, b, ..] = self.transform;
        a.hypot(b)
    }

    /// Split into whitespace-separated words, spreading the advance evenly per char.
    pub fn split_words(&self) -> Vec<Word> {
        let char_count = self.text.chars().count();
        if char_count == 0 {
            return Vec::new();
        }
        let font_size = self.font_size();
        let run_width = match self.width {
            Some(w) if w > 0.0 => w,
            _ => font_size * 0.6,
        };
        let char_width = run_width / char_count as f64;
        let [.., e, f] = self.transform;

        word_pattern()
            .find_iter(&self.text)
            .map(|m| {
                let start = self.text[..m.start()].chars().count();
                let len = m.as_str().chars().count();
                Word {
                    text: m.as_str().to_string(),
                    x: e + char_width * start as f64,
                    y: f,
                    width: char_width * len as f64,
                    height: font_size,
                    font_size,
                }
            })
            .collect()
    }
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\S+").expect("word pattern is valid"))
}

/// All tokens of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTokens {
    /// 1-based page number
    pub page: u32,
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub images: Vec<ImageRegion>,
}

impl PageTokens {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// Build from renderer text runs and image transforms.
    pub fn from_runs(page: u32, runs: &[TextRun], image_transforms: &[[f64; 6]]) -> Self {
        let words = runs.iter().flat_map(TextRun::split_words).collect();
        let images = image_transforms
            .iter()
            .enumerate()
            .map(|(i, ctm)| ImageRegion::from_transform(i as u32 + 1, *ctm))
            .collect();
        Self {
            page,
            words,
            images,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.images.is_empty()
    }

    /// Median, minimum and maximum font size of the page's words.
    pub fn font_stats(&self) -> crate::layout::FontStats {
        crate::layout::FontStats::from_words(&self.words)
    }
}

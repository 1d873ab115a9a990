//! Point queries over words, images and structural elements.

use serde::Serialize;

use crate::model::{
    is_degenerate_polygon, point_in_polygon, Element, ImageRegion, Page, PageTokens, Point,
    QuadPreference, Word,
};
use crate::transform::Viewport;

/// Options for hit-testing.
#[derive(Debug, Clone, Default)]
pub struct HitOptions {
    /// Quad granularity used for element hits
    pub quad_preference: QuadPreference,
}

impl HitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer paragraph quads over line quads when both exist.
    pub fn with_paragraph_quads(mut self, enabled: bool) -> Self {
        self.quad_preference = if enabled {
            QuadPreference::Paragraph
        } else {
            QuadPreference::Line
        };
        self
    }
}

/// A word under the query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordHit<'a> {
    pub word: &'a Word,
    /// Character under the point, clamped to the word
    pub char_index: usize,
}

/// Everything that matched a single point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HitSet<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<WordHit<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a ImageRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<&'a Element>,
}

/// The winning target of a combined query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Hit<'a> {
    Word(WordHit<'a>),
    Image(&'a ImageRegion),
    Element(&'a Element),
}

impl<'a> HitSet<'a> {
    pub fn is_empty(&self) -> bool {
        self.word.is_none() && self.image.is_none() && self.element.is_none()
    }

    /// Highest-priority hit: word, then image, then element.
    pub fn primary(&self) -> Option<Hit<'a>> {
        if let Some(word) = &self.word {
            return Some(Hit::Word(word.clone()));
        }
        if let Some(image) = self.image {
            return Some(Hit::Image(image));
        }
        self.element.map(Hit::Element)
    }
}

/// Point-in-region queries for one page.
#[derive(Debug, Clone, Default)]
pub struct HitTester {
    options: HitOptions,
}

impl HitTester {
    pub fn new(options: HitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HitOptions {
        &self.options
    }

    /// First word whose glyph box contains the page-space point.
    pub fn find_word_at<'a>(&self, words: &'a [Word], point: Point) -> Option<WordHit<'a>> {
        words
            .iter()
            .find(|w| w.bounds().contains(point))
            .map(|word| WordHit {
                word,
                char_index: word.char_index_at(point.x),
            })
    }

    /// First image whose bounds contain the page-space point.
    pub fn find_image_at<'a>(
        &self,
        images: &'a [ImageRegion],
        point: Point,
    ) -> Option<&'a ImageRegion> {
        images.iter().find(|img| img.bounds.contains(point))
    }

    /// First element on the page with a selected quad containing the page-space point.
    pub fn find_element_at<'a>(
        &self,
        point: Point,
        page: &'a Page,
        preference: QuadPreference,
    ) -> Option<&'a Element> {
        page.element_at(point, preference)
    }

    /// Element query for a device-space point. Quad vertices are mapped into device
    /// space and tested there.
    pub fn find_element_at_device<'a>(
        &self,
        device_point: Point,
        page: &'a Page,
        viewport: &Viewport,
    ) -> Option<&'a Element> {
        let preference = self.options.quad_preference;
        page.elements.iter().find(|element| {
            element.quads_for(preference).iter().any(|quad| {
                let vertices = viewport.quad_to_device(quad);
                !is_degenerate_polygon(&vertices) && point_in_polygon(device_point, &vertices)
            })
        })
    }

    /// Run every query for a page-space point.
    pub fn hits_at<'a>(
        &self,
        point: Point,
        tokens: &'a PageTokens,
        page: Option<&'a Page>,
    ) -> HitSet<'a> {
        HitSet {
            word: self.find_word_at(&tokens.words, point),
            image: self.find_image_at(&tokens.images, point),
            element: page.and_then(|p| self.find_element_at(point, p, self.options.quad_preference)),
        }
    }

    /// Run every query for a device-space point.
    pub fn hits_at_device<'a>(
        &self,
        device_point: Point,
        viewport: &Viewport,
        tokens: &'a PageTokens,
        page: Option<&'a Page>,
    ) -> HitSet<'a> {
        let point = viewport.to_pdf(device_point);
        HitSet {
            word: self.find_word_at(&tokens.words, point),
            image: self.find_image_at(&tokens.images, point),
            element: page.and_then(|p| self.find_element_at_device(device_point, p, viewport)),
        }
    }
}

//! Viewer-side context for one document and its active page.
//!
//! [`ViewerSession`] owns everything a viewer keeps between interactions: the shared
//! geometry, the viewport, the active page's tokens and their derived layout. The
//! layout is cached per page index and rebuilt wholesale when the page changes.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fingerprint::{check_staleness, Staleness};
use crate::layout::{LineGroup, LineOptions, PageLayout, SpacingOptions};
use crate::model::{GeometryDocument, Page, PageTokens, Point, QuadPreference};
use crate::query::{Hit, HitOptions, HitSet, HitTester};
use crate::transform::Viewport;

/// Supplies positioned tokens for a page. Implemented by whatever renders pages.
pub trait TokenProvider {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Tokens of a 1-based page.
    fn page_tokens(&self, page: u32) -> Result<PageTokens>;
}

/// Token provider backed by a JSON dump of every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenDump {
    #[serde(default)]
    pub pages: Vec<PageTokens>,
}

impl TokenDump {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Tokens of a 1-based page, if present in the dump.
    pub fn page(&self, page: u32) -> Option<&PageTokens> {
        self.pages.iter().find(|p| p.page == page)
    }
}

impl TokenProvider for TokenDump {
    fn page_count(&self) -> u32 {
        self.pages.iter().map(|p| p.page).max().unwrap_or(0)
    }

    fn page_tokens(&self, page: u32) -> Result<PageTokens> {
        if page == 0 || page > self.page_count() {
            return Err(Error::PageOutOfRange(page, self.page_count()));
        }
        Ok(self
            .page(page)
            .cloned()
            .unwrap_or_else(|| PageTokens::new(page)))
    }
}

/// Layout of the most recently analyzed page.
#[derive(Debug, Clone, Default)]
pub struct PageLayoutCache {
    entry: Option<(u32, Arc<PageLayout>)>,
    line_options: LineOptions,
    spacing_options: SpacingOptions,
}

impl PageLayoutCache {
    pub fn new(line_options: LineOptions, spacing_options: SpacingOptions) -> Self {
        Self {
            entry: None,
            line_options,
            spacing_options,
        }
    }

    /// Cached layout for the tokens' page, computing it on a miss.
    pub fn get_or_build(&mut self, tokens: &PageTokens) -> Arc<PageLayout> {
        if let Some((page, layout)) = &self.entry {
            if *page == tokens.page {
                return Arc::clone(layout);
            }
        }
        let layout = Arc::new(PageLayout::analyze_with(
            tokens,
            &self.line_options,
            &self.spacing_options,
        ));
        self.entry = Some((tokens.page, Arc::clone(&layout)));
        layout
    }

    /// Page the cache currently holds.
    pub fn cached_page(&self) -> Option<u32> {
        self.entry.as_ref().map(|(page, _)| *page)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Single-slot scheduler: one request in flight, the latest pending request wins.
#[derive(Debug, Clone)]
pub struct RenderQueue<T> {
    in_flight: Option<T>,
    pending: Option<T>,
}

impl<T> Default for RenderQueue<T> {
    fn default() -> Self {
        Self {
            in_flight: None,
            pending: None,
        }
    }
}

impl<T: Clone> RenderQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a request. Returns it back when it may start now; otherwise it
    /// replaces any earlier pending request.
    pub fn request(&mut self, request: T) -> Option<T> {
        if self.in_flight.is_some() {
            self.pending = Some(request);
            return None;
        }
        self.in_flight = Some(request.clone());
        Some(request)
    }

    /// Mark the in-flight request done and start the pending one, if any.
    pub fn finish(&mut self) -> Option<T> {
        self.in_flight = self.pending.take();
        self.in_flight.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&T> {
        self.in_flight.as_ref()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }
}

/// What kind of target a click resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Word,
    Image,
    Element,
}

/// A resolved click: the winning hit plus the text line it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub kind: TargetKind,
    /// 1-based page number
    pub page: u32,
    /// Page-space anchor (the click, or the element's first vertex)
    pub pdf: Point,
    /// Device-space click position
    pub device: Point,
    /// Word text, `Image #n`, or element id
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_index: Option<usize>,
    pub line_number: Option<usize>,
    /// Text of the matching fragment, or of the whole line
    pub line_text: String,
}

/// Per-document viewer context.
#[derive(Debug, Clone)]
pub struct ViewerSession {
    document: Option<Arc<GeometryDocument>>,
    viewport: Viewport,
    page: u32,
    tokens: PageTokens,
    cache: PageLayoutCache,
    hit_tester: HitTester,
}

impl ViewerSession {
    /// Session at the given render scale, on page 1 with no tokens.
    pub fn new(scale: f64) -> Result<Self> {
        Ok(Self {
            document: None,
            viewport: Viewport::new(scale, 0.0)?,
            page: 1,
            tokens: PageTokens::new(1),
            cache: PageLayoutCache::default(),
            hit_tester: HitTester::default(),
        })
    }

    pub fn with_document(mut self, document: Arc<GeometryDocument>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_hit_options(mut self, options: HitOptions) -> Self {
        self.hit_tester = HitTester::new(options);
        self
    }

    pub fn with_layout_options(mut self, lines: LineOptions, spacing: SpacingOptions) -> Self {
        self.cache = PageLayoutCache::new(lines, spacing);
        self
    }

    pub fn set_document(&mut self, document: Arc<GeometryDocument>) {
        self.document = Some(document);
    }

    pub fn document(&self) -> Option<&Arc<GeometryDocument>> {
        self.document.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Active 1-based page.
    pub fn current_page(&self) -> u32 {
        self.page
    }

    pub fn tokens(&self) -> &PageTokens {
        &self.tokens
    }

    /// Change the render scale. Page-space layout is unaffected.
    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        self.viewport = Viewport::new(scale, self.viewport.page_height())?;
        Ok(())
    }

    /// Make a page active with tokens a renderer produced for it. The cached layout
    /// is dropped since the tokens are replaced.
    pub fn show_page(&mut self, tokens: PageTokens, page_height: f64) -> Result<()> {
        if tokens.page == 0 {
            return Err(Error::PageOutOfRange(0, 0));
        }
        self.viewport = Viewport::new(self.viewport.scale(), page_height)?;
        self.cache.invalidate();
        self.page = tokens.page;
        self.tokens = tokens;
        log::debug!(
            "Showing page {} ({} words, {} images)",
            self.page,
            self.tokens.words.len(),
            self.tokens.images.len()
        );
        Ok(())
    }

    /// Fetch a page's tokens from a provider and make it active.
    pub fn open_page(
        &mut self,
        provider: &dyn TokenProvider,
        page: u32,
        page_height: f64,
    ) -> Result<()> {
        let count = provider.page_count();
        if page == 0 || page > count {
            return Err(Error::PageOutOfRange(page, count));
        }
        let tokens = provider.page_tokens(page)?;
        self.show_page(tokens, page_height)
    }

    /// Layout of the active page, from cache when possible.
    pub fn layout(&mut self) -> Arc<PageLayout> {
        self.cache.get_or_build(&self.tokens)
    }

    /// Geometry of the active page, if the document has any.
    pub fn geometry_page(&self) -> Option<&Page> {
        self.document.as_ref()?.page(self.page - 1)
    }

    /// Every hit under a device-space point.
    pub fn hits_at_device(&self, device_point: Point) -> HitSet<'_> {
        self.hit_tester.hits_at_device(
            device_point,
            &self.viewport,
            &self.tokens,
            self.geometry_page(),
        )
    }

    /// Resolve a click to its highest-priority target and the line it sits on.
    pub fn resolve_target(&mut self, device_point: Point) -> Option<Target> {
        let layout = self.cache.get_or_build(&self.tokens);
        let pdf_point = self.viewport.to_pdf(device_point);
        let preference = self.hit_tester.options().quad_preference;
        let hit = self.hits_at_device(device_point).primary()?;

        let target = match hit {
            Hit::Word(word_hit) => {
                let line = layout.nearest_line(word_hit.word.y);
                let fragment = line.and_then(|l| l.fragment_at(word_hit.word.x));
                Target {
                    kind: TargetKind::Word,
                    page: self.page,
                    pdf: pdf_point,
                    device: device_point,
                    reference: word_hit.word.text.clone(),
                    element_id: None,
                    char_index: Some(word_hit.char_index),
                    line_number: line.map(|l| l.number),
                    line_text: line_text(line, fragment.map(|f| f.text.as_str())),
                }
            }
            Hit::Image(image) => {
                let line = layout.nearest_line(pdf_point.y);
                let fragment = line.and_then(|l| l.nearest_fragment(image.bounds.center_x()));
                Target {
                    kind: TargetKind::Image,
                    page: self.page,
                    pdf: pdf_point,
                    device: device_point,
                    reference: format!("Image #{}", image.number),
                    element_id: None,
                    char_index: None,
                    line_number: line.map(|l| l.number),
                    line_text: line_text(line, fragment.map(|f| f.text.as_str())),
                }
            }
            Hit::Element(element) => {
                let anchor = element
                    .quads_for(preference)
                    .first()
                    .map(|q| q.vertices()[0])
                    .unwrap_or(pdf_point);
                let line = layout.nearest_line(anchor.y);
                let fragment = line.and_then(|l| l.fragment_at(anchor.x));
                let reference = if element.id.is_empty() {
                    element.role.to_string()
                } else {
                    element.id.clone()
                };
                Target {
                    kind: TargetKind::Element,
                    page: self.page,
                    pdf: anchor,
                    device: device_point,
                    reference,
                    element_id: Some(element.id.clone()),
                    char_index: None,
                    line_number: line.map(|l| l.number),
                    line_text: line_text(line, fragment.map(|f| f.text.as_str())),
                }
            }
        };
        Some(target)
    }

    /// Compare the loaded geometry against compiled bytes. Stale geometry stays loaded.
    pub fn check_staleness(&self, compiled: &[u8]) -> Option<Staleness> {
        self.document
            .as_ref()
            .map(|doc| check_staleness(doc, compiled))
    }

    /// Quad preference in effect for element hits.
    pub fn quad_preference(&self) -> QuadPreference {
        self.hit_tester.options().quad_preference
    }
}

fn line_text(line: Option<&LineGroup>, fragment: Option<&str>) -> String {
    match (fragment, line) {
        (Some(text), _) => text.to_string(),
        (None, Some(line)) => line.text(),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, Element, ImageRegion, Quad, Role, Word};

    fn tokens(page: u32) -> PageTokens {
        let mut tokens = PageTokens::new(page);
        tokens.words = vec![
            Word::new("Left", 72.0, 700.0, 30.0, 10.0),
            Word::new("column", 106.0, 700.0, 40.0, 10.0),
            Word::new("text", 150.0, 700.0, 20.0, 10.0),
            Word::new("Right", 320.0, 700.0, 30.0, 10.0),
            Word::new("Below", 72.0, 686.0, 30.0, 10.0),
        ];
        tokens.images = vec![ImageRegion::new(1, Bounds::new(300.0, 400.0, 600.0, 500.0))];
        tokens
    }

    fn document() -> Arc<GeometryDocument> {
        let element = Element::region(
            "fig-1",
            Role::Fig,
            "en",
            Quad::from_rect(72.0, 400.0, 540.0, 680.0),
        );
        Arc::new(GeometryDocument::new("id", vec![Page::with_elements(0, vec![element])]).unwrap())
    }

    #[test]
    fn test_render_queue_last_wins() {
        let mut queue = RenderQueue::new();
        assert_eq!(queue.request(1), Some(1));
        assert_eq!(queue.request(2), None);
        assert_eq!(queue.request(3), None);
        assert_eq!(queue.pending(), Some(&3));
        assert_eq!(queue.finish(), Some(3));
        assert_eq!(queue.finish(), None);
        assert!(!queue.is_busy());
    }

    #[test]
    fn test_layout_cache_per_page() {
        let mut cache = PageLayoutCache::default();
        let first = cache.get_or_build(&tokens(1));
        let again = cache.get_or_build(&tokens(1));
        assert!(Arc::ptr_eq(&first, &again));

        let other = cache.get_or_build(&tokens(2));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(cache.cached_page(), Some(2));
    }

    #[test]
    fn test_page_change_invalidates() {
        let mut session = ViewerSession::new(1.0).unwrap();
        session.show_page(tokens(1), 792.0).unwrap();
        let first = session.layout();
        session.show_page(tokens(2), 792.0).unwrap();
        let second = session.layout();
        assert_eq!(first.page, 1);
        assert_eq!(second.page, 2);
    }

    #[test]
    fn test_resolve_word_with_fragment() {
        let mut session = ViewerSession::new(2.0).unwrap().with_document(document());
        session.show_page(tokens(1), 792.0).unwrap();

        let device = session.viewport().to_device(Point::new(325.0, 702.0));
        let target = session.resolve_target(device).unwrap();
        assert_eq!(target.kind, TargetKind::Word);
        assert_eq!(target.reference, "Right");
        assert_eq!(target.line_number, Some(1));
        assert_eq!(target.line_text, "Right");
    }

    #[test]
    fn test_resolve_image_and_element() {
        let mut session = ViewerSession::new(1.5).unwrap().with_document(document());
        session.show_page(tokens(1), 792.0).unwrap();

        let device = session.viewport().to_device(Point::new(350.0, 550.0));
        let target = session.resolve_target(device).unwrap();
        assert_eq!(target.kind, TargetKind::Image);
        assert_eq!(target.reference, "Image #1");
        assert_eq!(target.line_number, Some(2));

        let device = session.viewport().to_device(Point::new(100.0, 500.0));
        let target = session.resolve_target(device).unwrap();
        assert_eq!(target.kind, TargetKind::Element);
        assert_eq!(target.reference, "fig-1");
        assert_eq!(target.pdf, Point::new(72.0, 400.0));
        assert_eq!(target.line_number, Some(2));
        assert_eq!(target.line_text, "Below");
    }

    #[test]
    fn test_token_dump_provider() {
        let dump = TokenDump::from_json(
            r#"{"pages":[{"page":1,"words":[{"text":"a","x":1,"y":2,"width":3,"height":4,"fontSize":4}]},{"page":3}]}"#,
        )
        .unwrap();
        assert_eq!(dump.page_count(), 3);
        assert_eq!(dump.page_tokens(1).unwrap().words.len(), 1);
        assert!(dump.page_tokens(2).unwrap().is_empty());
        assert!(matches!(dump.page_tokens(4), Err(Error::PageOutOfRange(4, 3))));

        let mut session = ViewerSession::new(1.0).unwrap();
        session.open_page(&dump, 1, 792.0).unwrap();
        assert_eq!(session.current_page(), 1);
        assert!(session.open_page(&dump, 0, 792.0).is_err());
    }

    #[test]
    fn test_staleness_is_not_fatal() {
        let session = ViewerSession::new(1.0).unwrap().with_document(document());
        let status = session.check_staleness(b"other bytes").unwrap();
        assert!(status.is_stale());
        assert!(session.document().is_some());
    }
}

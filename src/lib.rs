//! # pdfgeom
//!
//! Page geometry for typeset PDFs.
//!
//! The library turns position events emitted while a document is typeset into a
//! versioned geometry file (quads for figures, tables and paragraphs on each page),
//! and answers viewer-side questions against it: what is under the pointer, which
//! words form a line, where the vertical spacing between lines is irregular.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfgeom::{build_geometry, Job};
//!
//! fn main() -> pdfgeom::Result<()> {
//!     // Reads out/paper-texpos.ndjson or out/paper.log, fingerprints out/paper.pdf
//!     let job = Job::new("paper", "out");
//!     let build = build_geometry(&job)?;
//!     println!("{} elements", build.document.element_count());
//!
//!     pdfgeom::write_geometry(job.geometry_path(), &build.document)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Geometry build**: position stream, compiler log and structural fallbacks
//! - **Hit-testing**: words, images and element quads, in page or device space
//! - **Line analysis**: baseline clustering, column fragments, spacing outliers
//! - **Staleness**: SHA-256 fingerprints tie geometry to one compiled PDF
//! - **Incremental rebuilds**: per-element digests and dirty page detection

pub mod build;
pub mod error;
pub mod fingerprint;
pub mod incremental;
pub mod layout;
pub mod model;
pub mod query;
pub mod registry;
pub mod render;
pub mod session;
pub mod transform;

// Re-export commonly used types
pub use build::{
    write_geometry, BuildOptions, BuildReport, BuildWarning, ErrorMode, GeometryBuild,
    GeometryBuilder, GeometrySource, GroupingMode, Job, Mark, StructuralExtractor,
};
pub use error::{Error, Result};
pub use fingerprint::{check_staleness, doc_id, Staleness};
pub use incremental::{ChangeSet, ChangeTracker, PageMap};
pub use layout::{LineGroup, LineOptions, PageLayout, SpacingOptions, SpacingReport};
pub use model::{
    Bounds, Element, GeometryDocument, ImageRegion, Page, PageTokens, Point, Quad,
    QuadPreference, Role, Word,
};
pub use query::{Hit, HitOptions, HitSet, HitTester, Selection};
pub use registry::IdQueues;
pub use render::JsonFormat;
pub use session::{Target, TargetKind, TokenDump, TokenProvider, ViewerSession};
pub use transform::Viewport;

use std::path::Path;

/// Load a geometry file.
///
/// # Example
///
/// ```no_run
/// use pdfgeom::load_geometry;
///
/// let doc = load_geometry("out/paper-geometry.json").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn load_geometry<P: AsRef<Path>>(path: P) -> Result<GeometryDocument> {
    GeometryDocument::load(path)
}

/// Build geometry for a job with default options and the default source chain.
pub fn build_geometry(job: &Job) -> Result<GeometryBuild> {
    GeometryBuilder::default().build(job)
}

/// Build geometry with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfgeom::{build_geometry_with_options, BuildOptions, Job};
///
/// let options = BuildOptions::new().with_language("de").strict();
/// let build = build_geometry_with_options(&Job::new("paper", "out"), options).unwrap();
/// assert!(!build.report.has_warnings());
/// ```
pub fn build_geometry_with_options(job: &Job, options: BuildOptions) -> Result<GeometryBuild> {
    GeometryBuilder::new(options).build(job)
}

/// Group a page's words into lines and flag irregular spacing.
pub fn analyze_page(tokens: &PageTokens) -> PageLayout {
    PageLayout::analyze(tokens)
}

/// Everything under a page-space point on one page.
///
/// `page` is the geometry page to test element quads against, if any.
pub fn hits_at<'a>(point: Point, tokens: &'a PageTokens, page: Option<&'a Page>) -> HitSet<'a> {
    HitTester::default().hits_at(point, tokens, page)
}

//! Geometry model types.
//!
//! This module defines the page-space representation shared by the geometry builder
//! and every consumer: quads, elements, pages and the versioned geometry document,
//! plus the positioned tokens an external renderer supplies for the active page.

mod document;
mod element;
mod page;
mod quad;
mod token;

pub use document::{GeometryDocument, SCHEMA_VERSION};
pub use element::{Element, QuadPreference, Role};
pub use page::Page;
pub use quad::{Bounds, Point, Quad};
pub use token::{ImageRegion, PageTokens, TextRun, Word, ASCENT_RATIO, DESCENT_RATIO};

pub(crate) use quad::{is_degenerate_polygon, point_in_polygon};

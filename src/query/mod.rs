//! Spatial queries against a page: point hit-testing and rectangle selection.

mod hit;
mod selection;

pub use hit::{Hit, HitOptions, HitSet, HitTester, WordHit};
pub use selection::{select_text, select_text_with, Selection};

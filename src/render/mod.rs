//! Output rendering: JSON for machines, text reports for people.

mod json;
mod text;

pub use json::{to_json, JsonFormat};
pub use text::{geometry_summary, layout_report};

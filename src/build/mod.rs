//! Geometry construction from typesetting position events.
//!
//! Sources are tried in order until one yields at least one element:
//!
//! 1. the per-run position stream (`<job>-texpos.ndjson`)
//! 2. `GEOM: ` lines in the compiler log (`<job>.log`)
//! 3. an optional structural extractor reading the compiled PDF
//!
//! Marks from the first two are paired by id into page regions. Per-record problems
//! become [`BuildWarning`]s (or abort the build in strict mode); a chain where no
//! source has any data fails with [`crate::Error::SourceUnavailable`].

mod builder;
mod marks;
mod options;
mod pairing;
mod report;
mod source;

pub use builder::{write_geometry, GeometryBuild, GeometryBuilder};
pub use marks::{log_payloads, points, sp_to_pt, Mark, MarkKind, LOG_TAG, SCALED_POINTS_PER_POINT};
pub use options::{BuildOptions, ErrorMode, GroupingMode};
pub use pairing::{pair_marks, PairedRegion, Pairing};
pub use report::{BuildReport, BuildWarning};
pub use source::{
    CompilerLogSource, GeometrySource, Job, MarkBatch, PrecomputedExtractor, SourceData,
    StructuralExtractor, StructuralHints, StructuralSource, TexposStreamSource,
};

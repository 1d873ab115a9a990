//! Error types for pdfgeom library.

use std::io;
use thiserror::Error;

use crate::build::BuildWarning;

/// Result type alias for pdfgeom operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or loading page geometry.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structured element source could not be parsed.
    #[error("XML error: {0}")]
    Xml(String),

    /// The geometry file does not follow the `pdfGeometryV1` schema.
    #[error("Invalid geometry schema: {0}")]
    InvalidSchema(String),

    /// An element carries neither line quads nor a paragraph quad.
    #[error("Element '{0}' has no quads")]
    InvalidElement(String),

    /// Viewport scale or page height is unusable.
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    /// No source in the resolution chain produced any geometry data.
    #[error("No geometry source available (tried: {0})")]
    SourceUnavailable(String),

    /// A per-record problem raised while building in strict mode.
    #[error("Strict build aborted: {0}")]
    Strict(BuildWarning),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidElement("fig-1".to_string());
        assert_eq!(err.to_string(), "Element 'fig-1' has no quads");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_build_error_display() {
        let err = Error::SourceUnavailable("texpos, log".to_string());
        assert!(err.to_string().ends_with("texpos, log"));

        let err = Error::Strict(BuildWarning::EmptyGeometry {
            tried: vec!["texpos".to_string()],
        });
        assert_eq!(
            err.to_string(),
            "Strict build aborted: no elements could be resolved (tried: texpos)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}

//! Content fingerprints correlating compiled output with its geometry.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::model::GeometryDocument;

/// Lowercase hex SHA-256 of the given bytes.
pub fn doc_id(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Fingerprint of a file's contents.
pub fn doc_id_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(doc_id(&bytes))
}

/// Whether a geometry document still matches the compiled output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Stale { expected: String, actual: String },
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale { .. })
    }
}

/// Compare the document's `docId` with the fingerprint of `compiled`.
///
/// A mismatch is only logged; the geometry stays usable.
pub fn check_staleness(document: &GeometryDocument, compiled: &[u8]) -> Staleness {
    let actual = doc_id(compiled);
    if actual.eq_ignore_ascii_case(document.doc_id()) {
        Staleness::Fresh
    } else {
        log::warn!(
            "Geometry was built for {} but the document fingerprint is {}",
            short(document.doc_id()),
            short(&actual)
        );
        Staleness::Stale {
            expected: document.doc_id().to_string(),
            actual,
        }
    }
}

fn short(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_known_value() {
        assert_eq!(
            doc_id(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(doc_id(b"abc"), doc_id(b"abc"));
        assert_ne!(doc_id(b"abc"), doc_id(b"abd"));
    }

    #[test]
    fn test_staleness() {
        let bytes = b"%PDF-1.5 fake";
        let doc = GeometryDocument::empty(doc_id(bytes));
        assert_eq!(check_staleness(&doc, bytes), Staleness::Fresh);

        let status = check_staleness(&doc, b"%PDF-1.5 changed");
        assert!(status.is_stale());
    }

    #[test]
    fn test_doc_id_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(doc_id_file(&path).unwrap(), doc_id(b"abc"));
        assert!(doc_id_file(dir.path().join("missing.pdf")).is_err());
    }
}

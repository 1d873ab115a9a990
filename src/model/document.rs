//! Document-level geometry.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Element, Page};
use crate::error::{Error, Result};

/// Schema tag wrapping every geometry file.
pub const SCHEMA_VERSION: &str = "pdfGeometryV1";

/// Versioned geometry for a whole compiled document.
///
/// Immutable once built. Pages are kept sorted by index; share it behind an
/// `Arc` when several consumers need it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Envelope", into = "Envelope")]
pub struct GeometryDocument {
    doc_id: String,
    pages: Vec<Page>,
}

impl GeometryDocument {
    /// Create a document, sorting pages and validating the schema invariants.
    pub fn new(doc_id: impl Into<String>, mut pages: Vec<Page>) -> Result<Self> {
        pages.sort_by_key(|p| p.index);

        let mut seen_pages = HashSet::new();
        for page in &pages {
            if !seen_pages.insert(page.index) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate page index {}",
                    page.index
                )));
            }
            let mut seen_ids = HashSet::new();
            for element in &page.elements {
                element.validate()?;
                if !seen_ids.insert(element.id.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate element id '{}' on page {}",
                        element.id, page.index
                    )));
                }
            }
        }

        Ok(Self {
            doc_id: doc_id.into(),
            pages,
        })
    }

    /// Document with no pages.
    pub fn empty(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            pages: Vec::new(),
        }
    }

    /// Same document under another fingerprint.
    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = doc_id.into();
        self
    }

    /// Parse a geometry file from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a geometry file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Schema version tag.
    pub fn schema_version(&self) -> &'static str {
        SCHEMA_VERSION
    }

    /// Content fingerprint of the compiled output.
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Pages, ascending by index.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page by 0-based index. Pages without elements may be absent.
    pub fn page(&self, index: u32) -> Option<&Page> {
        self.pages
            .binary_search_by_key(&index, |p| p.index)
            .ok()
            .map(|i| &self.pages[i])
    }

    /// Number of pages carrying geometry.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of elements across pages.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(Page::element_count).sum()
    }

    /// Check if the document has no elements at all.
    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Find an element by id, returning its page index too.
    pub fn find_element(&self, id: &str) -> Option<(u32, &Element)> {
        self.pages
            .iter()
            .find_map(|page| page.element(id).map(|e| (page.index, e)))
    }

    /// All elements in page order.
    pub fn elements(&self) -> impl Iterator<Item = (u32, &Element)> {
        self.pages
            .iter()
            .flat_map(|page| page.elements.iter().map(move |e| (page.index, e)))
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "pdfGeometryV1")]
    body: DocumentBody,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentBody {
    doc_id: String,
    #[serde(default)]
    pages: Vec<Page>,
}

impl TryFrom<Envelope> for GeometryDocument {
    type Error = Error;

    fn try_from(envelope: Envelope) -> Result<Self> {
        GeometryDocument::new(envelope.body.doc_id, envelope.body.pages)
    }
}

impl From<GeometryDocument> for Envelope {
    fn from(doc: GeometryDocument) -> Self {
        Envelope {
            body: DocumentBody {
                doc_id: doc.doc_id,
                pages: doc.pages,
            },
        }
    }
}

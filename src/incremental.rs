//! Incremental change detection for element sources.
//!
//! Every element carrying an `id` attribute in the structured source is hashed. The
//! digests are compared with a persisted hash database to find changed elements, and
//! a page map (page number to element ids) turns those into the pages that need
//! rebuilding.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fingerprint::doc_id;
use crate::model::GeometryDocument;

/// Element ids per 1-based page number.
pub type PageMap = BTreeMap<u32, Vec<String>>;

/// Hex SHA-256 of an element's source text.
pub fn hash_content(text: &str) -> String {
    doc_id(text.as_bytes())
}

/// Raw markup of every element with an `id` attribute, keyed by id.
///
/// Nested elements are captured independently, so a parent's digest covers its
/// children. A repeated id keeps the last occurrence.
pub fn extract_elements(xml: &str) -> Result<BTreeMap<String, String>> {
    // Reader positions are counted after a leading BOM
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<Option<(String, usize)>> = Vec::new();
    let mut elements = BTreeMap::new();

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => open.push(element_id(&e)?.map(|id| (id, start))),
            Ok(Event::Empty(e)) => {
                if let Some(id) = element_id(&e)? {
                    let end = reader.buffer_position() as usize;
                    elements.insert(id, markup(xml, start, end)?);
                }
            }
            Ok(Event::End(_)) => {
                if let Some(Some((id, from))) = open.pop() {
                    let end = reader.buffer_position() as usize;
                    elements.insert(id, markup(xml, from, end)?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!(
                    "at byte {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            Ok(_) => {}
        }
    }

    Ok(elements)
}

fn markup(xml: &str, start: usize, end: usize) -> Result<String> {
    xml.get(start..end).map(str::to_string).ok_or_else(|| {
        Error::Xml(format!(
            "element span {}..{} is not on a char boundary",
            start, end
        ))
    })
}

fn element_id(start: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        if attr.key.as_ref() == b"id" {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(e.to_string()))?;
            let value = value.trim();
            return Ok((!value.is_empty()).then(|| value.to_string()));
        }
    }
    Ok(None)
}

/// Persisted element digests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HashDatabase {
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hashes: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDatabase {
    Current(HashDatabase),
    /// Bare `{id: digest}` map without metadata
    Flat(BTreeMap<String, String>),
}

impl HashDatabase {
    /// Load a database; a missing file is an empty database.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(match serde_json::from_str::<StoredDatabase>(&text)? {
            StoredDatabase::Current(db) => db,
            StoredDatabase::Flat(hashes) => Self {
                updated_at: None,
                hashes,
            },
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Outcome of a change check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// New or modified element ids
    pub changed: Vec<String>,
    /// Ids present last time but gone now
    pub removed: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compare element sources against previous digests.
pub fn diff(previous: &HashDatabase, elements: &BTreeMap<String, String>) -> (ChangeSet, HashDatabase) {
    let mut next = HashDatabase {
        updated_at: Some(Utc::now()),
        hashes: BTreeMap::new(),
    };
    let mut changes = ChangeSet::default();

    for (id, content) in elements {
        let digest = hash_content(content);
        if previous.hashes.get(id) != Some(&digest) {
            changes.changed.push(id.clone());
        }
        next.hashes.insert(id.clone(), digest);
    }
    changes.removed = previous
        .hashes
        .keys()
        .filter(|id| !elements.contains_key(*id))
        .cloned()
        .collect();

    (changes, next)
}

/// Pages containing any of the changed ids, ascending.
pub fn dirty_pages(changed: &[String], page_map: &PageMap) -> Vec<u32> {
    let changed: BTreeSet<&str> = changed.iter().map(String::as_str).collect();
    page_map
        .iter()
        .filter(|(_, ids)| ids.iter().any(|id| changed.contains(id.as_str())))
        .map(|(page, _)| *page)
        .collect()
}

/// Page map derived from built geometry.
pub fn page_map_from_geometry(document: &GeometryDocument) -> PageMap {
    document
        .pages()
        .iter()
        .map(|page| {
            let ids = page.elements.iter().map(|e| e.id.clone()).collect();
            (page.number(), ids)
        })
        .collect()
}

/// Load a page map file (`{"1": ["id", ...], ...}`).
pub fn load_page_map<P: AsRef<Path>>(path: P) -> Result<PageMap> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Tracks element digests in a database file between runs.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    db_path: PathBuf,
}

impl ChangeTracker {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Compare against the stored digests and persist the new ones.
    pub fn detect_changes(&self, elements: &BTreeMap<String, String>) -> Result<ChangeSet> {
        let previous = HashDatabase::load(&self.db_path)?;
        let (changes, next) = diff(&previous, elements);
        next.save(&self.db_path)?;
        log::info!(
            "{} changed, {} removed out of {} elements",
            changes.changed.len(),
            changes.removed.len(),
            elements.len()
        );
        Ok(changes)
    }

    /// Extract elements from an XML source file, then [`Self::detect_changes`].
    pub fn detect_changes_in_xml<P: AsRef<Path>>(&self, xml_path: P) -> Result<ChangeSet> {
        let xml = fs::read_to_string(xml_path)?;
        let elements = extract_elements(&xml)?;
        self.detect_changes(&elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, Page, Quad, Role};

    const XML: &str = r#"<?xml version="1.0"?>
<document>
  <section id="sec-1"><title>Intro</title><p id="p-1">Hello &amp; welcome</p></section>
  <figure id="fig-1"/>
  <p>no id</p>
</document>"#;

    #[test]
    fn test_extract_elements() {
        let elements = extract_elements(XML).unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements["p-1"], r#"<p id="p-1">Hello &amp; welcome</p>"#);
        assert_eq!(elements["fig-1"], r#"<figure id="fig-1"/>"#);
        assert!(elements["sec-1"].starts_with(r#"<section id="sec-1">"#));
        assert!(elements["sec-1"].ends_with("</section>"));
    }

    #[test]
    fn test_bom_and_multibyte_prefix() {
        let elements = extract_elements("\u{feff}<doc><p id=\"a\">x</p></doc>").unwrap();
        assert_eq!(elements["a"], r#"<p id="a">x</p>"#);

        let elements = extract_elements("\u{feff}<d>éé<p id=\"a\">x</p></d>").unwrap();
        assert_eq!(elements["a"], r#"<p id="a">x</p>"#);
        assert_eq!(
            extract_elements("\u{feff}<d id=\"d\">é</d>").unwrap()["d"],
            "<d id=\"d\">é</d>"
        );
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(extract_elements("<a id=\"x\"></b>"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_diff() {
        let mut elements = BTreeMap::new();
        elements.insert("a".to_string(), "one".to_string());
        elements.insert("b".to_string(), "two".to_string());

        let (first, db) = diff(&HashDatabase::default(), &elements);
        assert_eq!(first.changed, vec!["a", "b"]);
        assert!(db.updated_at.is_some());

        elements.insert("b".to_string(), "two!".to_string());
        elements.remove("a");
        elements.insert("c".to_string(), "three".to_string());
        let (second, _) = diff(&db, &elements);
        assert_eq!(second.changed, vec!["b", "c"]);
        assert_eq!(second.removed, vec!["a"]);
    }

    #[test]
    fn test_tracker_persists() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ChangeTracker::new(dir.path().join("build").join("page_hashes.json"));

        let mut elements = BTreeMap::new();
        elements.insert("p-1".to_string(), "<p>x</p>".to_string());
        assert_eq!(tracker.detect_changes(&elements).unwrap().changed.len(), 1);
        assert!(tracker.detect_changes(&elements).unwrap().is_empty());
    }

    #[test]
    fn test_flat_database_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.json");
        let digest = hash_content("x");
        fs::write(&path, format!(r#"{{"p-1":"{}"}}"#, digest)).unwrap();

        let db = HashDatabase::load(&path).unwrap();
        assert_eq!(db.hashes.get("p-1"), Some(&digest));
        assert!(db.updated_at.is_none());
    }

    #[test]
    fn test_dirty_pages() {
        let mut map = PageMap::new();
        map.insert(1, vec!["a".to_string()]);
        map.insert(2, vec!["b".to_string(), "c".to_string()]);
        map.insert(3, vec!["d".to_string()]);
        let changed = vec!["c".to_string(), "d".to_string()];
        assert_eq!(dirty_pages(&changed, &map), vec![2, 3]);
        assert!(dirty_pages(&[], &map).is_empty());
    }

    #[test]
    fn test_page_map_from_geometry() {
        let quad = Quad::from_rect(72.0, 100.0, 540.0, 200.0);
        let doc = GeometryDocument::new(
            "id",
            vec![Page::with_elements(
                1,
                vec![Element::region("fig-1", Role::Fig, "en", quad)],
            )],
        )
        .unwrap();
        let map = page_map_from_geometry(&doc);
        assert_eq!(map.get(&2), Some(&vec!["fig-1".to_string()]));
    }
}

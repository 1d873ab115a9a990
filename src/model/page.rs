//! Page-level types.

use serde::{Deserialize, Serialize};

use super::{Element, Point, QuadPreference, Role};

/// Geometry for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page index (0-based)
    pub index: u32,

    /// Elements on the page, in insertion order
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Page {
    /// Create an empty page.
    pub fn new(index: u32) -> Self {
        Self {
            index,
            elements: Vec::new(),
        }
    }

    /// Create a page with the given elements.
    pub fn with_elements(index: u32, elements: Vec<Element>) -> Self {
        Self { index, elements }
    }

    /// Add an element to the page.
    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// 1-based page number.
    pub fn number(&self) -> u32 {
        self.index + 1
    }

    /// Check if the page is empty (no elements).
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get the number of elements on the page.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Find an element by id.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Elements with the given role.
    pub fn elements_with_role<'a>(&'a self, role: &'a Role) -> impl Iterator<Item = &'a Element> {
        self.elements.iter().filter(move |e| &e.role == role)
    }

    /// First element (in insertion order) with a selected quad containing `point`.
    pub fn element_at(&self, point: Point, preference: QuadPreference) -> Option<&Element> {
        self.elements.iter().find(|element| {
            element
                .quads_for(preference)
                .iter()
                .any(|quad| quad.contains(point))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Quad;

    #[test]
    fn test_page_new() {
        let page = Page::new(2);
        assert_eq!(page.index, 2);
        assert_eq!(page.number(), 3);
        assert!(page.is_empty());
    }

    #[test]
    fn test_element_at_insertion_order() {
        let outer = Element::region("outer", Role::P, "en", Quad::from_rect(0.0, 0.0, 100.0, 100.0));
        let inner = Element::region("inner", Role::Fig, "en", Quad::from_rect(10.0, 10.0, 20.0, 20.0));
        let page = Page::with_elements(0, vec![outer, inner]);

        let hit = page.element_at(Point::new(15.0, 15.0), QuadPreference::Line);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("outer"));
        assert!(page.element_at(Point::new(150.0, 15.0), QuadPreference::Line).is_none());
        assert_eq!(page.elements_with_role(&Role::Fig).count(), 1);
        assert!(page.element("inner").is_some());
    }
}

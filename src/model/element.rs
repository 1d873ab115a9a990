//! Structural elements and their roles.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Quad;
use crate::error::{Error, Result};

/// Structural role of an element.
///
/// Unknown role strings are preserved in [`Role::Other`] so a geometry file
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Title,
    H1,
    H2,
    H3,
    P,
    Fig,
    Table,
    Other(String),
}

impl Role {
    /// Parse a role name. Never fails.
    pub fn parse(name: &str) -> Self {
        match name {
            "Title" => Role::Title,
            "H1" => Role::H1,
            "H2" => Role::H2,
            "H3" => Role::H3,
            "P" => Role::P,
            "FIG" => Role::Fig,
            "TABLE" => Role::Table,
            other => Role::Other(other.to_string()),
        }
    }

    /// Canonical name as written in geometry files.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Title => "Title",
            Role::H1 => "H1",
            Role::H2 => "H2",
            Role::H3 => "H3",
            Role::P => "P",
            Role::Fig => "FIG",
            Role::Table => "TABLE",
            Role::Other(name) => name,
        }
    }

    /// Whether this role is a float (a region detached from the paragraph flow).
    pub fn is_float(&self) -> bool {
        matches!(self, Role::Fig | Role::Table)
    }

    /// Whether this role is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Role::Title | Role::H1 | Role::H2 | Role::H3)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Role::parse(&name)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which quad granularity a hit test should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuadPreference {
    /// Line-level quads.
    #[default]
    Line,
    /// The merged paragraph quad.
    Paragraph,
}

/// A structural element placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Identifier, unique within its page
    pub id: String,

    /// Structural role
    pub role: Role,

    /// Language tag (e.g., "en")
    #[serde(default)]
    pub lang: String,

    /// Line-level quads, in reading order
    #[serde(default)]
    pub quads: Vec<Quad>,

    /// Single merged quad covering the whole element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_quad: Option<Quad>,
}

impl Element {
    /// Create an element, checking that it carries at least one quad.
    pub fn new(
        id: impl Into<String>,
        role: Role,
        lang: impl Into<String>,
        quads: Vec<Quad>,
        paragraph_quad: Option<Quad>,
    ) -> Result<Self> {
        let element = Self {
            id: id.into(),
            role,
            lang: lang.into(),
            quads,
            paragraph_quad,
        };
        element.validate()?;
        Ok(element)
    }

    /// Element covered by a single region used both as line and paragraph quad.
    pub fn region(id: impl Into<String>, role: Role, lang: impl Into<String>, quad: Quad) -> Self {
        Self {
            id: id.into(),
            role,
            lang: lang.into(),
            quads: vec![quad],
            paragraph_quad: Some(quad),
        }
    }

    /// Check the element invariant.
    pub fn validate(&self) -> Result<()> {
        if self.quads.is_empty() && self.paragraph_quad.is_none() {
            return Err(Error::InvalidElement(self.id.clone()));
        }
        Ok(())
    }

    /// Quads to use for a given preference.
    ///
    /// Paragraph preference uses the paragraph quad when present; otherwise the line
    /// quads are used, falling back to the paragraph quad when there are none.
    pub fn quads_for(&self, preference: QuadPreference) -> Vec<Quad> {
        if preference == QuadPreference::Paragraph {
            if let Some(quad) = self.paragraph_quad {
                return vec![quad];
            }
        }
        if !self.quads.is_empty() {
            return self.quads.clone();
        }
        self.paragraph_quad.into_iter().collect()
    }

    /// Total number of quads carried, counting the paragraph quad.
    pub fn quad_count(&self) -> usize {
        self.quads.len() + usize::from(self.paragraph_quad.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Quad {
        Quad::from_rect(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_role_round_trip() {
        for name in ["Title", "H1", "H2", "H3", "P", "FIG", "TABLE", "LIST"] {
            let role = Role::parse(name);
            assert_eq!(role.as_str(), name);
        }
        assert_eq!(Role::parse("FIG"), Role::Fig);
        assert!(Role::Fig.is_float());
        assert!(Role::H2.is_heading());
        assert!(!Role::P.is_float());
    }

    #[test]
    fn test_element_requires_quads() {
        let result = Element::new("p-1", Role::P, "en", vec![], None);
        assert!(matches!(result, Err(Error::InvalidElement(id)) if id == "p-1"));

        assert!(Element::new("p-1", Role::P, "en", vec![rect()], None).is_ok());
        assert!(Element::new("p-1", Role::P, "en", vec![], Some(rect())).is_ok());
    }

    #[test]
    fn test_quad_preference() {
        let line = Quad::from_rect(0.0, 0.0, 10.0, 2.0);
        let para = Quad::from_rect(0.0, 0.0, 10.0, 20.0);

        let both = Element::new("p", Role::P, "en", vec![line], Some(para)).unwrap();
        assert_eq!(both.quads_for(QuadPreference::Paragraph), vec![para]);
        assert_eq!(both.quads_for(QuadPreference::Line), vec![line]);

        let lines_only = Element::new("p", Role::P, "en", vec![line], None).unwrap();
        assert_eq!(lines_only.quads_for(QuadPreference::Paragraph), vec![line]);

        let para_only = Element::new("p", Role::P, "en", vec![], Some(para)).unwrap();
        assert_eq!(para_only.quads_for(QuadPreference::Line), vec![para]);
    }

    #[test]
    fn test_element_serde_shape() {
        let el = Element::region("fig-1", Role::Fig, "en", rect());
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["role"], "FIG");
        assert!(json.get("paragraphQuad").is_some());
        assert_eq!(json["quads"].as_array().unwrap().len(), 1);

        let lines_only = Element::new("p", Role::P, "en", vec![rect()], None).unwrap();
        let json = serde_json::to_value(&lines_only).unwrap();
        assert!(json.get("paragraphQuad").is_none());
    }
}

//! Element-id registry extracted from the typesetting source.
//!
//! The markup tags every structural element with an id. Collecting those ids per role,
//! in source order, gives a structural extractor a queue to draw names from when it
//! can only see the compiled output.

use std::collections::{BTreeMap, VecDeque};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::Role;

struct Patterns {
    title: Regex,
    para: Regex,
    section: Regex,
    target: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        title: Regex::new(r"\\title\{[^}]*\}\{([^}]*)\}").expect("title pattern is valid"),
        para: Regex::new(r"\\paraid\{([^}]*)\}").expect("paraid pattern is valid"),
        section: Regex::new(r"\\section\{[^}]*\}\s*\\label\{([^}]*)\}")
            .expect("section pattern is valid"),
        target: Regex::new(r"\\hypertarget\{([^}]*)\}\{\}").expect("hypertarget pattern is valid"),
    })
}

/// Per-role queues of element ids, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdQueues {
    queues: BTreeMap<String, VecDeque<String>>,
}

impl IdQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect ids from markup. Returns `None` when nothing was found.
    ///
    /// Recognized: `\title{..}{ID}` (Title), `\paraid{ID}` (P),
    /// `\section{..}\label{ID}` (H1) and `\hypertarget{ID}{}` anchors prefixed `fig-`
    /// (FIG) or `tbl-` (TABLE). Closing anchors ending in `-end` are skipped.
    pub fn extract(source: &str) -> Option<Self> {
        let p = patterns();
        let mut queues = Self::new();

        for caps in p.title.captures_iter(source) {
            queues.push(&Role::Title, &caps[1]);
        }
        for caps in p.para.captures_iter(source) {
            queues.push(&Role::P, &caps[1]);
        }
        for caps in p.section.captures_iter(source) {
            queues.push(&Role::H1, &caps[1]);
        }
        for caps in p.target.captures_iter(source) {
            let id = &caps[1];
            if id.ends_with("-end") {
                continue;
            }
            if id.starts_with("fig-") {
                queues.push(&Role::Fig, id);
            } else if id.starts_with("tbl-") {
                queues.push(&Role::Table, id);
            }
        }

        if queues.is_empty() {
            None
        } else {
            log::debug!("Extracted {} element ids", queues.len());
            Some(queues)
        }
    }

    /// Append an id for a role; blank ids are ignored.
    pub fn push(&mut self, role: &Role, id: &str) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        self.queues
            .entry(role.as_str().to_string())
            .or_default()
            .push_back(id.to_string());
    }

    /// Take the next unused id for a role.
    pub fn next_id(&mut self, role: &Role) -> Option<String> {
        self.queues.get_mut(role.as_str())?.pop_front()
    }

    /// Remaining ids for a role.
    pub fn ids(&self, role: &Role) -> Vec<&str> {
        self.queues
            .get(role.as_str())
            .map(|q| q.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Roles with at least one queued id.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.queues
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(name, _)| Role::parse(name))
    }

    /// Total ids across all roles.
    pub fn len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r"
\title{On Quads}{title-1}
\section{Intro} \label{sec-intro}
\paraid{p-1} Some text. \paraid{ p-2 }
\hypertarget{fig-1}{}\includegraphics{a.png}\hypertarget{fig-1-end}{}
\hypertarget{tbl-1}{}\begin{tabular}{c}\end{tabular}\hypertarget{tbl-1-end}{}
\hypertarget{eq-1}{}
";

    #[test]
    fn test_extract_queues() {
        let queues = IdQueues::extract(SOURCE).unwrap();
        assert_eq!(queues.ids(&Role::Title), vec!["title-1"]);
        assert_eq!(queues.ids(&Role::H1), vec!["sec-intro"]);
        assert_eq!(queues.ids(&Role::P), vec!["p-1", "p-2"]);
        assert_eq!(queues.ids(&Role::Fig), vec!["fig-1"]);
        assert_eq!(queues.ids(&Role::Table), vec!["tbl-1"]);
        assert_eq!(queues.len(), 6);
    }

    #[test]
    fn test_queue_order() {
        let mut queues = IdQueues::extract(SOURCE).unwrap();
        assert_eq!(queues.next_id(&Role::P).as_deref(), Some("p-1"));
        assert_eq!(queues.next_id(&Role::P).as_deref(), Some("p-2"));
        assert_eq!(queues.next_id(&Role::P), None);
        assert!(!queues.roles().any(|r| r == Role::P));
    }

    #[test]
    fn test_nothing_found() {
        assert!(IdQueues::extract("plain text, no markup").is_none());
        assert!(IdQueues::extract(r"\hypertarget{eq-1}{}").is_none());
    }

    #[test]
    fn test_serializes_as_map() {
        let mut queues = IdQueues::new();
        queues.push(&Role::Fig, "fig-9");
        let json = serde_json::to_string(&queues).unwrap();
        assert_eq!(json, r#"{"FIG":["fig-9"]}"#);
    }
}

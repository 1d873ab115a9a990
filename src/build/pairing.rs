//! Start/end pairing of marks into page regions.

use std::collections::HashMap;

use super::marks::{Mark, MarkKind};
use super::report::BuildWarning;
use crate::model::{Quad, Role};

/// A completed start/end pair on a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedRegion {
    pub id: String,
    pub role: Role,
    /// 0-based page index
    pub page_index: u32,
    /// Start position from the top of the page, in points
    pub y_start: f64,
    /// End position from the top of the page, in points
    pub y_end: f64,
    pub page_width: f64,
    pub page_height: f64,
}

impl PairedRegion {
    /// Page-space rectangle between the margins, spanning the paired positions.
    ///
    /// Vertices run `(left, H-max)`, `(right, H-max)`, `(right, H-min)`, `(left, H-min)`
    /// where `min`/`max` are the two positions measured from the top.
    pub fn to_quad(&self, margin_left: f64, margin_right: f64) -> Quad {
        let left = margin_left;
        let right = self.page_width - margin_right;
        let lower = self.page_height - self.y_start.max(self.y_end);
        let upper = self.page_height - self.y_start.min(self.y_end);
        Quad::new([left, lower, right, lower, right, upper, left, upper])
    }
}

/// Result of pairing a mark stream.
#[derive(Debug, Clone, Default)]
pub struct Pairing {
    /// Complete regions in first-seen order
    pub regions: Vec<PairedRegion>,
    /// Single-point anchors skipped by pairing
    pub anchors: usize,
    pub warnings: Vec<BuildWarning>,
}

struct Pending {
    id: String,
    role: Role,
    page_index: u32,
    start: Option<f64>,
    end: Option<f64>,
    page_width: f64,
    page_height: f64,
    stray_page: Option<u32>,
}

/// Pair `<ROLE>-start` / `<ROLE>-end` marks by id.
///
/// The first record of an id fixes its role, page and page size. Records for the
/// same id on another page are ignored; if that leaves the pair incomplete it is
/// reported as a cross-page float. A repeated start or end replaces the earlier one.
pub fn pair_marks(marks: &[Mark]) -> Pairing {
    let mut pending: Vec<Pending> = Vec::new();
    let mut by_id: HashMap<&str, usize> = HashMap::new();
    let mut anchors = 0;

    for mark in marks {
        let (base, kind) = mark.split_role();
        if kind == MarkKind::Anchor {
            anchors += 1;
            continue;
        }

        let slot = *by_id.entry(mark.id.as_str()).or_insert_with(|| {
            pending.push(Pending {
                id: mark.id.clone(),
                role: Role::parse(base),
                page_index: mark.page_index(),
                start: None,
                end: None,
                page_width: mark.page_width,
                page_height: mark.page_height,
                stray_page: None,
            });
            pending.len() - 1
        });
        let entry = &mut pending[slot];

        if entry.page_index != mark.page_index() {
            log::debug!(
                "Ignoring {} mark for '{}' on page {} (pair started on page {})",
                kind,
                mark.id,
                mark.page,
                entry.page_index + 1
            );
            entry.stray_page.get_or_insert(mark.page);
            continue;
        }

        let target = match kind {
            MarkKind::Start => &mut entry.start,
            _ => &mut entry.end,
        };
        if target.is_some() {
            log::debug!("Repeated {} mark for '{}'; keeping the later one", kind, mark.id);
        }
        *target = Some(mark.y_from_top);
    }

    let mut regions = Vec::new();
    let mut warnings = Vec::new();
    for p in pending {
        match (p.start, p.end) {
            (Some(y_start), Some(y_end)) => regions.push(PairedRegion {
                id: p.id,
                role: p.role,
                page_index: p.page_index,
                y_start,
                y_end,
                page_width: p.page_width,
                page_height: p.page_height,
            }),
            (start, _) => {
                let warning = match p.stray_page {
                    Some(other_page) => BuildWarning::CrossPageFloat {
                        id: p.id,
                        first_page: p.page_index + 1,
                        other_page,
                    },
                    None => BuildWarning::UnpairedFloat {
                        id: p.id,
                        missing: if start.is_some() {
                            MarkKind::End
                        } else {
                            MarkKind::Start
                        },
                    },
                };
                log::warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    Pairing {
        regions,
        anchors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(id: &str, role: &str, page: u32, y: f64) -> Mark {
        Mark {
            id: id.to_string(),
            role: role.to_string(),
            page,
            x: 72.0,
            y_from_top: y,
            page_width: 612.0,
            page_height: 792.0,
        }
    }

    #[test]
    fn test_pair_quad() {
        let pairing = pair_marks(&[
            mark("fig-1", "FIG-start", 1, 100.0),
            mark("fig-1", "FIG-end", 1, 300.0),
        ]);
        assert!(pairing.warnings.is_empty());
        assert_eq!(pairing.regions.len(), 1);

        let region = &pairing.regions[0];
        assert_eq!(region.role, Role::Fig);
        assert_eq!(region.page_index, 0);

        let quad = region.to_quad(72.0, 72.0);
        assert_eq!(quad.top_y(), 692.0);
        assert_eq!(quad.bottom_y(), 492.0);
        assert_eq!(
            quad.coords(),
            &[72.0, 492.0, 540.0, 492.0, 540.0, 692.0, 72.0, 692.0]
        );
    }

    #[test]
    fn test_unpaired_and_anchors() {
        let pairing = pair_marks(&[
            mark("sec-1", "H1", 1, 50.0),
            mark("tbl-1", "TABLE-end", 1, 300.0),
            mark("p-1", "P-start", 1, 400.0),
        ]);
        assert!(pairing.regions.is_empty());
        assert_eq!(pairing.anchors, 1);
        assert_eq!(
            pairing.warnings,
            vec![
                BuildWarning::UnpairedFloat {
                    id: "tbl-1".to_string(),
                    missing: MarkKind::Start
                },
                BuildWarning::UnpairedFloat {
                    id: "p-1".to_string(),
                    missing: MarkKind::End
                },
            ]
        );
    }

    #[test]
    fn test_cross_page_dropped() {
        let pairing = pair_marks(&[
            mark("fig-2", "FIG-start", 1, 700.0),
            mark("fig-2", "FIG-end", 2, 80.0),
        ]);
        assert!(pairing.regions.is_empty());
        assert_eq!(
            pairing.warnings,
            vec![BuildWarning::CrossPageFloat {
                id: "fig-2".to_string(),
                first_page: 1,
                other_page: 2
            }]
        );
    }

    #[test]
    fn test_stray_record_after_complete_pair() {
        let pairing = pair_marks(&[
            mark("fig-3", "FIG-start", 3, 100.0),
            mark("fig-3", "FIG-end", 3, 200.0),
            mark("fig-3", "FIG-end", 4, 50.0),
        ]);
        assert_eq!(pairing.regions.len(), 1);
        assert_eq!(pairing.regions[0].y_end, 200.0);
        assert!(pairing.warnings.is_empty());
    }

    #[test]
    fn test_repeated_mark_overwrites_and_order_is_first_seen() {
        let pairing = pair_marks(&[
            mark("b", "P-start", 1, 100.0),
            mark("a", "P-start", 1, 300.0),
            mark("b", "P-start", 1, 120.0),
            mark("a", "P-end", 1, 350.0),
            mark("b", "P-end", 1, 150.0),
        ]);
        let ids: Vec<_> = pairing.regions.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(pairing.regions[0].y_start, 120.0);
    }
}

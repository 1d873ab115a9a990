//! Position-event records ("marks") emitted by the typesetting run.
//!
//! Each record is one JSON object, either a line of the `<job>-texpos.ndjson` stream
//! or the payload of a `GEOM: ` line in the compiler log:
//!
//! ```text
//! {"id":"fig-1","role":"FIG-start","page":1,"xsp":4718592,"ysp":6553600,"pw":"612.0pt","ph":"792.0pt"}
//! ```
//!
//! Coordinates are TeX scaled points (65536 per point) measured from the top-left of
//! the page; page dimensions carry a `pt` suffix.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// Scaled points per typographic point.
pub const SCALED_POINTS_PER_POINT: f64 = 65536.0;

/// Prefix of mark lines embedded in a compiler log.
pub const LOG_TAG: &str = "GEOM: ";

/// Convert scaled points to points.
pub fn sp_to_pt(sp: f64) -> f64 {
    sp / SCALED_POINTS_PER_POINT
}

/// Which half of a paired region a mark is, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Start,
    End,
    /// Single-point anchor, not part of a pair
    Anchor,
}

impl MarkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkKind::Start => "start",
            MarkKind::End => "end",
            MarkKind::Anchor => "anchor",
        }
    }
}

impl std::fmt::Display for MarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated mark with coordinates converted to points.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub id: String,
    /// Role as written, e.g. `FIG-start`
    pub role: String,
    /// 1-based page number
    pub page: u32,
    /// Horizontal position from the left edge, in points
    pub x: f64,
    /// Vertical position from the top edge, in points
    pub y_from_top: f64,
    pub page_width: f64,
    pub page_height: f64,
}

#[derive(Deserialize)]
struct RawMark {
    id: String,
    role: String,
    #[serde(default)]
    page: Option<u32>,
    xsp: Value,
    ysp: Value,
    pw: Value,
    ph: Value,
}

impl Mark {
    /// Parse one JSON record. Returns a human-readable reason on failure.
    pub fn parse(json: &str) -> std::result::Result<Self, String> {
        let raw: RawMark = serde_json::from_str(json).map_err(|e| e.to_string())?;
        if raw.id.trim().is_empty() {
            return Err("empty id".to_string());
        }
        let page = raw.page.unwrap_or(1);
        if page == 0 {
            return Err("page numbers start at 1".to_string());
        }

        let xsp = number(&raw.xsp).ok_or_else(|| format!("bad xsp {}", raw.xsp))?;
        let ysp = number(&raw.ysp).ok_or_else(|| format!("bad ysp {}", raw.ysp))?;
        let pw = points(&raw.pw).ok_or_else(|| format!("bad pw {}", raw.pw))?;
        let ph = points(&raw.ph).ok_or_else(|| format!("bad ph {}", raw.ph))?;
        if pw <= 0.0 || ph <= 0.0 {
            return Err(format!("non-positive page size {}x{}", pw, ph));
        }

        Ok(Self {
            id: raw.id.trim().to_string(),
            role: raw.role,
            page,
            x: sp_to_pt(xsp),
            y_from_top: sp_to_pt(ysp),
            page_width: pw,
            page_height: ph,
        })
    }

    /// 0-based page index.
    pub fn page_index(&self) -> u32 {
        self.page - 1
    }

    /// Split the role into its base name and pair half: `FIG-start` is
    /// `("FIG", Start)`, a plain `H1` is `("H1", Anchor)`.
    pub fn split_role(&self) -> (&str, MarkKind) {
        match role_pattern().captures(&self.role) {
            Some(caps) => {
                let base = caps.name("base").map_or("", |m| m.as_str());
                let kind = match caps.name("kind").map(|m| m.as_str()) {
                    Some("start") => MarkKind::Start,
                    _ => MarkKind::End,
                };
                (base, kind)
            }
            None => (self.role.as_str(), MarkKind::Anchor),
        }
    }

    pub fn kind(&self) -> MarkKind {
        self.split_role().1
    }
}

/// Scaled-point value: a JSON number or a numeric string.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Dimension in points: `"612.0pt"`, `"612"` or a bare number.
pub fn points(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let caps = dimension_pattern().captures(s)?;
            caps.get(1)?.as_str().parse::<f64>().ok()
        }
        _ => None,
    }
}

/// Mark payloads of the `GEOM: ` lines in a compiler log.
pub fn log_payloads(log: &str) -> impl Iterator<Item = (usize, &str)> {
    log.lines()
        .enumerate()
        .filter_map(|(i, line)| line.strip_prefix(LOG_TAG).map(|rest| (i + 1, rest)))
}

fn role_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<base>[A-Za-z][A-Za-z0-9]*)-(?P<kind>start|end)$")
            .expect("role pattern is valid")
    })
}

fn dimension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([-+]?(?:\d+\.?\d*|\.\d+))\s*(?:pt)?\s*$")
            .expect("dimension pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mark() {
        let mark = Mark::parse(
            r#"{"id":"fig-1","role":"FIG-start","page":2,"xsp":4718592,"ysp":"6553600","pw":"612.0pt","ph":"792.0pt"}"#,
        )
        .unwrap();
        assert_eq!(mark.id, "fig-1");
        assert_eq!(mark.page, 2);
        assert_eq!(mark.page_index(), 1);
        assert_eq!(mark.x, 72.0);
        assert_eq!(mark.y_from_top, 100.0);
        assert_eq!(mark.page_width, 612.0);
        assert_eq!(mark.page_height, 792.0);
        assert_eq!(mark.split_role(), ("FIG", MarkKind::Start));
    }

    #[test]
    fn test_page_defaults_to_first() {
        let mark =
            Mark::parse(r#"{"id":"p1","role":"P-end","xsp":0,"ysp":0,"pw":612,"ph":792}"#).unwrap();
        assert_eq!(mark.page, 1);
        assert_eq!(mark.kind(), MarkKind::End);
    }

    #[test]
    fn test_malformed_marks() {
        assert!(Mark::parse("not json").is_err());
        assert!(Mark::parse(r#"{"id":"a","role":"P-start","xsp":0,"ysp":0,"pw":"wide","ph":"792pt"}"#).is_err());
        assert!(Mark::parse(r#"{"id":"a","role":"P-start","xsp":"x","ysp":0,"pw":"612pt","ph":"792pt"}"#).is_err());
        assert!(Mark::parse(r#"{"id":"","role":"P-start","xsp":0,"ysp":0,"pw":"612pt","ph":"792pt"}"#).is_err());
        assert!(Mark::parse(r#"{"id":"a","role":"P-start","page":0,"xsp":0,"ysp":0,"pw":"612pt","ph":"792pt"}"#).is_err());
    }

    #[test]
    fn test_non_positive_page_size() {
        let err = Mark::parse(r#"{"id":"a","role":"FIG-start","xsp":0,"ysp":0,"pw":"-612pt","ph":"0pt"}"#)
            .unwrap_err();
        assert_eq!(err, "non-positive page size -612x0");
        assert!(Mark::parse(r#"{"id":"a","role":"P-start","xsp":0,"ysp":0,"pw":612,"ph":-1}"#).is_err());
        assert!(Mark::parse(r#"{"id":"a","role":"P-start","xsp":0,"ysp":0,"pw":"+612pt","ph":"792pt"}"#).is_ok());
    }

    #[test]
    fn test_roles() {
        let mut mark =
            Mark::parse(r#"{"id":"s","role":"H1","xsp":0,"ysp":0,"pw":"612pt","ph":"792pt"}"#).unwrap();
        assert_eq!(mark.split_role(), ("H1", MarkKind::Anchor));
        mark.role = "TABLE-end".to_string();
        assert_eq!(mark.split_role(), ("TABLE", MarkKind::End));
        mark.role = "-start".to_string();
        assert_eq!(mark.kind(), MarkKind::Anchor);
    }

    #[test]
    fn test_points() {
        assert_eq!(points(&Value::from("612.5pt")), Some(612.5));
        assert_eq!(points(&Value::from(" 792 ")), Some(792.0));
        assert_eq!(points(&Value::from(400)), Some(400.0));
        assert_eq!(points(&Value::from("12em")), None);
        assert_eq!(points(&Value::Null), None);
    }

    #[test]
    fn test_log_payloads() {
        let log = "This is pdfTeX\nGEOM: {\"a\":1}\n GEOM: indented\nGEOM: {\"b\":2}\n";
        let payloads: Vec<_> = log_payloads(log).collect();
        assert_eq!(payloads, vec![(2, "{\"a\":1}"), (4, "{\"b\":2}")]);
    }
}

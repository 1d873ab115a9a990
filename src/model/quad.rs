//! Quads, points and axis-aligned bounds in page space.

use serde::{Deserialize, Serialize};

/// Area below which a quad is treated as degenerate.
const AREA_EPSILON: f64 = 1e-9;

/// A point. Whether it lives in page space or device space depends on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in page space (Y-up, so `top >= bottom`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    /// Create bounds, normalizing swapped edges.
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left: left.min(right),
            right: left.max(right),
            top: top.max(bottom),
            bottom: top.min(bottom),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Horizontal centre.
    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right
            && point.y >= self.bottom
            && point.y <= self.top
    }

    /// Whether two rectangles overlap or touch.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.top < other.bottom
            || self.bottom > other.top)
    }
}

/// A four-vertex polygon in page-space points.
///
/// Serialized as the flat array `[x1, y1, x2, y2, x3, y3, x4, y4]`. Construction never
/// fails; degenerate quads are filtered out at query time instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 8]", into = "[f64; 8]")]
pub struct Quad {
    coords: [f64; 8],
}

impl Quad {
    /// Create a quad from its eight scalars.
    pub fn new(coords: [f64; 8]) -> Self {
        Self { coords }
    }

    /// Create a quad from four vertices in order.
    pub fn from_points(points: [Point; 4]) -> Self {
        let mut coords = [0.0; 8];
        for (i, p) in points.iter().enumerate() {
            coords[i * 2] = p.x;
            coords[i * 2 + 1] = p.y;
        }
        Self { coords }
    }

    /// Axis-aligned quad, vertices ordered bottom-left, bottom-right, top-right, top-left.
    pub fn from_rect(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self::new([left, bottom, right, bottom, right, top, left, top])
    }

    /// Raw scalars.
    pub fn coords(&self) -> &[f64; 8] {
        &self.coords
    }

    /// The four vertices in order.
    pub fn vertices(&self) -> [Point; 4] {
        let c = &self.coords;
        [
            Point::new(c[0], c[1]),
            Point::new(c[2], c[3]),
            Point::new(c[4], c[5]),
            Point::new(c[6], c[7]),
        ]
    }

    /// Polygon area (absolute value of the shoelace sum).
    pub fn area(&self) -> f64 {
        polygon_area(&self.vertices())
    }

    /// True when the quad cannot take part in hit-testing: non-finite coordinates,
    /// fewer than four distinct vertices, or zero area.
    pub fn is_degenerate(&self) -> bool {
        is_degenerate_polygon(&self.vertices())
    }

    /// Bounding rectangle of the vertices.
    pub fn bounds(&self) -> Bounds {
        let v = self.vertices();
        let mut b = Bounds {
            left: f64::INFINITY,
            right: f64::NEG_INFINITY,
            top: f64::NEG_INFINITY,
            bottom: f64::INFINITY,
        };
        for p in v {
            b.left = b.left.min(p.x);
            b.right = b.right.max(p.x);
            b.top = b.top.max(p.y);
            b.bottom = b.bottom.min(p.y);
        }
        b
    }

    /// Y of the highest vertex.
    pub fn top_y(&self) -> f64 {
        self.bounds().top
    }

    /// Y of the lowest vertex.
    pub fn bottom_y(&self) -> f64 {
        self.bounds().bottom
    }

    /// Ray-casting containment test in page space. Degenerate quads never contain
    /// anything.
    pub fn contains(&self, point: Point) -> bool {
        let vertices = self.vertices();
        if is_degenerate_polygon(&vertices) {
            return false;
        }
        point_in_polygon(point, &vertices)
    }
}

impl From<[f64; 8]> for Quad {
    fn from(coords: [f64; 8]) -> Self {
        Self::new(coords)
    }
}

impl From<Quad> for [f64; 8] {
    fn from(quad: Quad) -> Self {
        quad.coords
    }
}

/// Absolute shoelace area of a closed polygon.
pub(crate) fn polygon_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    (sum / 2.0).abs()
}

pub(crate) fn is_degenerate_polygon(vertices: &[Point; 4]) -> bool {
    if vertices.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return true;
    }
    let mut distinct: Vec<Point> = Vec::with_capacity(4);
    for p in vertices {
        if !distinct.iter().any(|d| d == p) {
            distinct.push(*p);
        }
    }
    distinct.len() < 4 || polygon_area(vertices) <= AREA_EPSILON
}

/// Even-odd ray casting. The polygon is implicitly closed.
pub(crate) fn point_in_polygon(point: Point, vertices: &[Point]) -> bool {
    let n = vertices.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (vertices[i], vertices[j]);
        let crosses = (vi.y > point.y) != (vj.y > point.y)
            && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

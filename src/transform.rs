//! Mapping between page space and device space.
//!
//! Page space is measured in points with the origin at the bottom-left corner and Y
//! pointing up. Device space is measured in pixels with the origin at the top-left
//! corner and Y pointing down, scaled by the viewport scale. The two mappings are exact
//! inverses; nothing is rounded here.

use crate::error::{Error, Result};
use crate::model::{Bounds, Point, Quad};

/// Map a page-space point to device space.
pub fn pdf_to_device(point: Point, scale: f64, page_height: f64) -> Point {
    Point::new(point.x * scale, (page_height - point.y) * scale)
}

/// Map a device-space point back to page space.
pub fn device_to_pdf(point: Point, scale: f64, page_height: f64) -> Point {
    Point::new(point.x / scale, page_height - point.y / scale)
}

/// Rectangle in device space (Y-down, so `top <= bottom`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl DeviceRect {
    /// Rectangle spanned by two corner points in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Scale and page height for one rendered page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f64,
    page_height: f64,
}

impl Viewport {
    /// Create a viewport. The scale must be positive and both values finite.
    pub fn new(scale: f64, page_height: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidViewport(format!("scale {}", scale)));
        }
        if !page_height.is_finite() || page_height < 0.0 {
            return Err(Error::InvalidViewport(format!("page height {}", page_height)));
        }
        Ok(Self { scale, page_height })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    /// Device-space height of the page.
    pub fn device_height(&self) -> f64 {
        self.page_height * self.scale
    }

    pub fn to_device(&self, point: Point) -> Point {
        pdf_to_device(point, self.scale, self.page_height)
    }

    pub fn to_pdf(&self, point: Point) -> Point {
        device_to_pdf(point, self.scale, self.page_height)
    }

    /// Quad vertices in device space.
    pub fn quad_to_device(&self, quad: &Quad) -> [Point; 4] {
        quad.vertices().map(|v| self.to_device(v))
    }

    /// Page-space bounds as a device rectangle.
    pub fn bounds_to_device(&self, bounds: &Bounds) -> DeviceRect {
        let top_left = self.to_device(Point::new(bounds.left, bounds.top));
        let bottom_right = self.to_device(Point::new(bounds.right, bounds.bottom));
        DeviceRect::from_corners(top_left, bottom_right)
    }

    /// Device rectangle (e.g. a drag selection) as page-space bounds.
    pub fn device_rect_to_pdf(&self, rect: &DeviceRect) -> Bounds {
        let top_left = self.to_pdf(Point::new(rect.left, rect.top));
        let bottom_right = self.to_pdf(Point::new(rect.right, rect.bottom));
        Bounds::new(top_left.x, bottom_right.x, top_left.y, bottom_right.y)
    }
}

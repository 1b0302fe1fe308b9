//! Axis-aligned rectangle in map coordinates

use crate::core::types::DVec2;

/// Axis-aligned map-space rectangle. f64 because projected map coordinates
/// (e.g. UTM eastings) exceed f32 precision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(
            (self.xmin + self.xmax) * 0.5,
            (self.ymin + self.ymax) * 0.5,
        )
    }

    /// A valid extent has strictly positive width and height.
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
            && self.xmin.is_finite() && self.ymin.is_finite()
            && self.xmax.is_finite() && self.ymax.is_finite()
    }

    /// Square in map units within a relative tolerance.
    pub fn is_square(&self) -> bool {
        let side = self.width().max(self.height());
        (self.width() - self.height()).abs() <= side * 1e-9
    }

    pub fn contains_point(&self, pt: DVec2) -> bool {
        pt.x >= self.xmin && pt.x <= self.xmax && pt.y >= self.ymin && pt.y <= self.ymax
    }

    /// Containment with a small relative tolerance, so an extent equal to a
    /// tile boundary still counts as contained.
    pub fn contains(&self, other: &Extent) -> bool {
        let eps = self.width().max(self.height()).abs() * 1e-9;
        other.xmin >= self.xmin - eps && other.xmax <= self.xmax + eps
            && other.ymin >= self.ymin - eps && other.ymax <= self.ymax + eps
    }
}

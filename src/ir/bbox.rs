//! Integer pixel bounding boxes in XYXY format.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax),
/// in integer pixel coordinates.
///
/// Like the annotation files it comes from, this type does NOT enforce
/// `min < max`. Geometry helpers treat inverted or empty boxes as having
/// zero area instead of panicking.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl BBox {
    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Returns the width of the bounding box, clamped at zero.
    #[inline]
    pub fn width(&self) -> i64 {
        self.xmax.saturating_sub(self.xmin).max(0)
    }

    /// Returns the height of the bounding box, clamped at zero.
    #[inline]
    pub fn height(&self) -> i64 {
        self.ymax.saturating_sub(self.ymin).max(0)
    }

    /// Returns the area of the bounding box (zero for degenerate boxes).
    ///
    /// Widened to `i128` so that no pair of `i64` extents can overflow.
    #[inline]
    pub fn area(&self) -> i128 {
        i128::from(self.width()) * i128::from(self.height())
    }

    /// Returns true if the box is properly ordered (min < max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin < self.xmax && self.ymin < self.ymax
    }

    /// Returns the center point of the box.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.xmin as f64 + self.xmax as f64) / 2.0,
            (self.ymin as f64 + self.ymax as f64) / 2.0,
        )
    }

    /// Returns true if `(x, y)` lies within `[xmin, xmax] x [ymin, ymax]`.
    #[inline]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        (self.xmin as f64) <= x
            && x <= self.xmax as f64
            && (self.ymin as f64) <= y
            && y <= self.ymax as f64
    }

    /// Euclidean distance between the centers of two boxes.
    pub fn center_distance(&self, other: &BBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }

    /// Area of the overlap between two boxes.
    pub fn intersection_area(&self, other: &BBox) -> i128 {
        let x_overlap = self
            .xmax
            .min(other.xmax)
            .saturating_sub(self.xmin.max(other.xmin))
            .max(0);
        let y_overlap = self
            .ymax
            .min(other.ymax)
            .saturating_sub(self.ymin.max(other.ymin))
            .max(0);
        i128::from(x_overlap) * i128::from(y_overlap)
    }

    /// Intersection over union of two boxes.
    ///
    /// Returns `0.0` when the union is empty (both boxes degenerate).
    pub fn iou(&self, other: &BBox) -> f64 {
        let intersection = self.intersection_area(other) as f64;
        // two areas near i128::MAX would overflow an integer sum
        let union = self.area() as f64 + other.area() as f64 - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        (intersection / union).clamp(0.0, 1.0)
    }
}

impl std::fmt::Debug for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BBox({}, {}, {}, {})",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

impl std::fmt::Display for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

/// Round a score to two decimal places, the precision IoU values are
/// reported with.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

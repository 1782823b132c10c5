//! Axis-aligned bounding boxes in relative coordinates.

use serde::{Deserialize, Serialize};

use super::point::RelativePoint;

/// An axis-aligned bounding box given by its top-left and bottom-right
/// corners.
///
/// The constructor does NOT enforce `top_left <= bottom_right`; malformed
/// boxes are representable so that validation can report them.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: RelativePoint,
    pub bottom_right: RelativePoint,
}

impl BoundingBox {
    /// Creates a new bounding box from its corners.
    #[inline]
    pub fn new(top_left: RelativePoint, bottom_right: RelativePoint) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Creates a new bounding box from explicit corner coordinates.
    #[inline]
    pub fn from_coords(tlx: f64, tly: f64, brx: f64, bry: f64) -> Self {
        Self::new(RelativePoint::new(tlx, tly), RelativePoint::new(brx, bry))
    }

    /// Creates a box from its top-left corner and its extent.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_coords(x, y, x + width, y + height)
    }

    /// Returns `(x, y, width, height)`.
    #[inline]
    pub fn to_xywh(&self) -> (f64, f64, f64, f64) {
        (
            self.top_left.x,
            self.top_left.y,
            self.width(),
            self.height(),
        )
    }

    /// May be negative if the box is malformed.
    #[inline]
    pub fn width(&self) -> f64 {
        self.bottom_right.x - self.top_left.x
    }

    /// May be negative if the box is malformed.
    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom_right.y - self.top_left.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns true if all coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.top_left.is_finite() && self.bottom_right.is_finite()
    }

    /// Returns true if the corners are properly ordered on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.top_left.x <= self.bottom_right.x && self.top_left.y <= self.bottom_right.y
    }

    /// Returns true if both corners lie inside the frame.
    #[inline]
    pub fn is_in_frame(&self) -> bool {
        self.top_left.is_in_frame() && self.bottom_right.is_in_frame()
    }
}

impl std::fmt::Debug for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundingBox")
            .field("top_left", &self.top_left)
            .field("bottom_right", &self.bottom_right)
            .finish()
    }
}

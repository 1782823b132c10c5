//! Spatial primitives attached to event detections.
//!
//! Bounding boxes live in relative coordinates, where `(0, 0)` is the
//! top-left corner of the frame and `(1, 1)` the bottom-right corner.
//! Like the rest of the label model, construction is permissive: a box may
//! be malformed (unordered or non-finite) and validation reports it.

mod bbox;
mod mask;
mod point;

pub use bbox::BoundingBox;
pub use mask::Mask;
pub use point::RelativePoint;

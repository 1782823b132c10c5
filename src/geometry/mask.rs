//! Dense 2-D masks stored in row-major order.

use serde::{Deserialize, Serialize};

/// A segmentation mask for a detection, relative to its bounding box.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    pub height: usize,
    pub width: usize,
    pub data: Vec<u8>,
}

impl Mask {
    pub fn new(height: usize, width: usize, data: Vec<u8>) -> Self {
        Self {
            height,
            width,
            data,
        }
    }

    /// Creates an all-zero mask of the given shape.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self::new(height, width, vec![0; height * width])
    }

    /// Returns the value at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row >= self.height || col >= self.width {
            return None;
        }
        row.checked_mul(self.width)
            .and_then(|i| i.checked_add(col))
            .and_then(|i| self.data.get(i))
            .copied()
    }

    /// Returns true if `data` holds exactly `height * width` values.
    pub fn is_consistent(&self) -> bool {
        self.height.checked_mul(self.width) == Some(self.data.len())
    }
}

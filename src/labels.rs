//! Capabilities shared by the label types.
//!
//! Objects and events are composed from these small traits rather than a
//! class hierarchy: each concrete type implements only the capabilities it
//! actually has.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::frames::FrameRanges;

/// Common behavior of every label type.
pub trait Labels {
    /// Whether the instance carries no labels of any kind.
    fn is_empty(&self) -> bool;
}

/// Labels that exist over a set of frames.
///
/// The support is either frozen (explicitly supplied) or computed from the
/// contained data every time it is requested.
pub trait HasLabelsSupport {
    /// The explicitly frozen support, if any.
    fn frozen_support(&self) -> Option<&FrameRanges>;

    /// Computes the support from the contained data.
    fn compute_support(&self) -> FrameRanges;

    fn is_support_frozen(&self) -> bool {
        self.frozen_support().is_some()
    }

    /// Returns the frozen support, or computes it.
    fn support(&self) -> FrameRanges {
        match self.frozen_support() {
            Some(support) => support.clone(),
            None => self.compute_support(),
        }
    }
}

/// Projects time-spanning labels onto individual frames.
pub trait FrameRenderer {
    type Frame;

    /// Renders a single frame, or `None` if the frame is not covered.
    fn render_frame(&self, frame_number: u64) -> Option<Self::Frame>;

    /// Renders every covered frame.
    fn render_all_frames(&self) -> BTreeMap<u64, Self::Frame>;
}

/// Labels that can produce a copy of themselves with every label pushed
/// down to the frame level.
pub trait HasFramewiseView {
    fn render_framewise_labels(&self) -> Self;
}

/// Stable sort by an optional key; elements without a key always go last,
/// in both directions.
pub(crate) fn sort_none_last<T, K: PartialOrd>(
    items: &mut [T],
    key: impl Fn(&T) -> Option<K>,
    reverse: bool,
) {
    items.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if reverse {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_none_last_both_directions() {
        let mut values = vec![Some(0.9), None, Some(0.3)];
        sort_none_last(&mut values, |v| *v, false);
        assert_eq!(values, vec![Some(0.3), Some(0.9), None]);

        sort_none_last(&mut values, |v| *v, true);
        assert_eq!(values, vec![Some(0.9), Some(0.3), None]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut values = vec![(1, "a"), (0, "b"), (1, "c"), (0, "d")];
        sort_none_last(&mut values, |v| Some(v.0), false);
        assert_eq!(values, vec![(0, "b"), (0, "d"), (1, "a"), (1, "c")]);
    }
}

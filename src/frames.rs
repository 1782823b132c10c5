//! Frame-range sets describing the temporal support of video labels.

use serde::{Deserialize, Serialize};

/// A sorted set of inclusive frame intervals.
///
/// Intervals are kept sorted, disjoint and non-adjacent, so `[1, 3]` and
/// `[4, 6]` collapse into `[1, 6]`. Serialized as a list of `[first, last]`
/// pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[u64; 2]>", into = "Vec<[u64; 2]>")]
pub struct FrameRanges {
    ranges: Vec<(u64, u64)>,
}

impl FrameRanges {
    /// Creates an empty set of frame ranges.
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Creates a single contiguous range covering `first..=last`.
    ///
    /// The endpoints are reordered if given backwards.
    pub fn build_simple(first: u64, last: u64) -> Self {
        Self {
            ranges: vec![(first.min(last), first.max(last))],
        }
    }

    /// Creates the minimal set of ranges covering the given frame numbers.
    pub fn from_iterable(frames: impl IntoIterator<Item = u64>) -> Self {
        let mut out = Self::new();
        out.ranges = frames.into_iter().map(|f| (f, f)).collect();
        out.normalize();
        out
    }

    /// Returns true if no frame is covered.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the number of frames covered, saturating at `u64::MAX`.
    pub fn num_frames(&self) -> u64 {
        self.ranges
            .iter()
            .fold(0u64, |n, (a, b)| n.saturating_add((b - a).saturating_add(1)))
    }

    /// Returns the covered intervals in ascending order.
    pub fn ranges(&self) -> &[(u64, u64)] {
        &self.ranges
    }

    /// Returns the first covered frame, if any.
    pub fn first(&self) -> Option<u64> {
        self.ranges.first().map(|r| r.0)
    }

    /// Returns the last covered frame, if any.
    pub fn last(&self) -> Option<u64> {
        self.ranges.last().map(|r| r.1)
    }

    /// Returns true if `frame_number` is covered.
    pub fn contains(&self, frame_number: u64) -> bool {
        let idx = self.ranges.partition_point(|r| r.1 < frame_number);
        self.ranges
            .get(idx)
            .is_some_and(|&(first, _)| first <= frame_number)
    }

    /// Iterates over every covered frame number in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.ranges.iter().flat_map(|&(a, b)| a..=b)
    }

    /// Adds the inclusive range `first..=last`.
    pub fn add_range(&mut self, first: u64, last: u64) {
        self.ranges.push((first.min(last), first.max(last)));
        self.normalize();
    }

    /// Unions `other` into this set.
    pub fn merge(&mut self, other: &FrameRanges) {
        self.ranges.extend_from_slice(&other.ranges);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.ranges.sort_unstable();
        let mut merged: Vec<(u64, u64)> = Vec::with_capacity(self.ranges.len());
        for &(first, last) in &self.ranges {
            match merged.last_mut() {
                Some(prev) if first <= prev.1.saturating_add(1) => {
                    prev.1 = prev.1.max(last);
                }
                _ => merged.push((first, last)),
            }
        }
        self.ranges = merged;
    }
}

impl TryFrom<Vec<[u64; 2]>> for FrameRanges {
    type Error = String;

    fn try_from(pairs: Vec<[u64; 2]>) -> Result<Self, Self::Error> {
        let mut out = Self::new();
        for [first, last] in pairs {
            if first > last {
                return Err(format!("invalid frame range [{}, {}]", first, last));
            }
            out.ranges.push((first, last));
        }
        out.normalize();
        Ok(out)
    }
}

impl From<FrameRanges> for Vec<[u64; 2]> {
    fn from(ranges: FrameRanges) -> Self {
        ranges.ranges.into_iter().map(|(a, b)| [a, b]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_iterable_coalesces_adjacent_frames() {
        let ranges = FrameRanges::from_iterable([5, 1, 2, 3, 7, 6, 10]);
        assert_eq!(ranges.ranges(), &[(1, 3), (5, 7), (10, 10)]);
        assert_eq!(ranges.num_frames(), 7);
    }

    #[test]
    fn test_contains() {
        let ranges = FrameRanges::from_iterable([1, 2, 3, 8]);
        assert!(ranges.contains(1));
        assert!(ranges.contains(3));
        assert!(!ranges.contains(4));
        assert!(ranges.contains(8));
        assert!(!ranges.contains(9));
        assert!(!FrameRanges::new().contains(0));
    }

    #[test]
    fn test_merge_and_iter() {
        let mut ranges = FrameRanges::build_simple(1, 3);
        ranges.merge(&FrameRanges::build_simple(3, 5));
        ranges.merge(&FrameRanges::from_iterable([9]));
        assert_eq!(ranges.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 9]);
        assert_eq!(ranges.first(), Some(1));
        assert_eq!(ranges.last(), Some(9));
    }

    #[test]
    fn test_serde_rejects_backwards_range() {
        let err = serde_json::from_str::<FrameRanges>("[[5, 2]]");
        assert!(err.is_err());

        let ranges: FrameRanges = serde_json::from_str("[[4, 6], [1, 3]]").unwrap();
        assert_eq!(ranges.ranges(), &[(1, 6)]);
        assert_eq!(serde_json::to_string(&ranges).unwrap(), "[[1,6]]");
    }

    #[test]
    fn test_num_frames_saturates_on_full_range() {
        let full: FrameRanges = serde_json::from_str(&format!("[[0, {}]]", u64::MAX)).unwrap();
        assert_eq!(full.num_frames(), u64::MAX);

        let ranges = FrameRanges::from_iterable([0, 1, u64::MAX]);
        assert_eq!(ranges.num_frames(), 3);
    }
}

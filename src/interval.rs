//! Closed time intervals in epoch milliseconds

use serde::Serialize;

/// A `(start, end)` window with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Build an interval, swapping the bounds if given backwards
    pub fn new(start: u64, end: u64) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end - self.start
    }
}

/// Merge overlapping or touching intervals.
///
/// Input order does not matter; the output is sorted by start and pairwise
/// disjoint with gaps between neighbours, so merging it again is a no-op.
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_unstable();

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        match merged.last_mut() {
            Some(current) if next.start <= current.end => {
                current.end = current.end.max(next.end);
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Total length of a set of intervals, in milliseconds
pub fn total_duration_ms(intervals: &[Interval]) -> u64 {
    intervals.iter().map(Interval::duration_ms).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_bounds() {
        assert_eq!(Interval::new(10, 5), Interval { start: 5, end: 10 });
    }

    #[test]
    fn test_merge_overlapping() {
        let merged = merge_intervals(vec![
            Interval::new(10, 20),
            Interval::new(0, 5),
            Interval::new(15, 30),
        ]);
        assert_eq!(merged, vec![Interval::new(0, 5), Interval::new(10, 30)]);
    }

    #[test]
    fn test_merge_touching() {
        let merged = merge_intervals(vec![Interval::new(0, 10), Interval::new(10, 20)]);
        assert_eq!(merged, vec![Interval::new(0, 20)]);
    }

    #[test]
    fn test_merge_contained() {
        let merged = merge_intervals(vec![Interval::new(0, 100), Interval::new(10, 20)]);
        assert_eq!(merged, vec![Interval::new(0, 100)]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_intervals(Vec::new()).is_empty());
    }

    #[test]
    fn test_total_duration() {
        let merged = merge_intervals(vec![Interval::new(0, 10), Interval::new(5, 15)]);
        assert_eq!(total_duration_ms(&merged), 15);
    }
}

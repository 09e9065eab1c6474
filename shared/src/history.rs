use std::collections::VecDeque;

use crate::{PointStream, StrokePoint};

pub const HISTORY_LIMIT: usize = 30;

/// Bounded stack of point stream snapshots, one per completed stroke.
#[derive(Clone, Debug)]
pub struct History {
    snapshots: VecDeque<PointStream>,
    limit: usize,
}

/// What the caller should do with its active stream after an undo.
#[derive(Clone, Debug, PartialEq)]
pub enum Undo {
    /// Nothing was recorded; leave everything as it is.
    Nothing,
    /// Replace the active stream with this snapshot and redraw.
    Restore(PointStream),
    /// The last snapshot was undone; clear the stream and the surface.
    Cleared,
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(limit + 1),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, points: &[StrokePoint]) {
        self.snapshots.push_back(points.to_vec());
        while self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
        }
    }

    pub fn undo(&mut self) -> Undo {
        if self.snapshots.pop_back().is_none() {
            return Undo::Nothing;
        }
        match self.snapshots.back() {
            Some(top) => Undo::Restore(top.clone()),
            None => Undo::Cleared,
        }
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &PointStream> {
        self.snapshots.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(index: i32) -> PointStream {
        vec![StrokePoint::sample(index, index, 1.0), StrokePoint::Boundary]
    }

    #[test]
    fn keeps_only_the_most_recent_snapshots() {
        let mut history = History::new();
        for index in 0..40 {
            history.push(&stroke(index));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        let firsts: Vec<_> = history.snapshots().map(|points| points[0].clone()).collect();
        let expected: Vec<_> = (10..40).map(|index| StrokePoint::sample(index, index, 1.0)).collect();
        assert_eq!(firsts, expected);
    }

    #[test]
    fn undo_restores_previous_snapshot() {
        let mut history = History::new();
        history.push(&stroke(1));
        history.push(&stroke(2));
        assert_eq!(history.undo(), Undo::Restore(stroke(1)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn undo_of_last_snapshot_clears_then_does_nothing() {
        let mut history = History::new();
        history.push(&stroke(1));
        assert_eq!(history.undo(), Undo::Cleared);
        assert!(history.is_empty());
        assert_eq!(history.undo(), Undo::Nothing);
    }

    #[test]
    fn snapshots_are_copies() {
        let mut history = History::new();
        let mut points = stroke(1);
        history.push(&points);
        points.push(StrokePoint::sample(9, 9, 1.0));
        assert_eq!(history.snapshots().next(), Some(&stroke(1)));
    }
}

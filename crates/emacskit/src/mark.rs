//! # Mark ring
//!
//! ## Overview
//!
//! Each editing surface remembers an active [Mark], one position per cursor, along with a ring of
//! recently deactivated marks. Marks are moved along with the text whenever the document changes,
//! and a mark whose positions have all been deleted is forgotten.
//!
//! The mark is transient: any document change deactivates it.
use crate::surface::{Assoc, ChangeSet, MapMode};

/// A remembered set of positions, one per cursor.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Mark(Vec<usize>);

impl Mark {
    /// Create a mark from cursor positions.
    pub fn new(positions: Vec<usize>) -> Self {
        Mark(positions)
    }

    /// The marked positions.
    pub fn positions(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Whether this mark has no positions left.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Map this mark through a document change.
    ///
    /// Positions inside deleted text are dropped, and if none remain, [None] is returned.
    pub fn map(&self, changes: &ChangeSet) -> Option<Mark> {
        let positions: Vec<usize> = self
            .0
            .iter()
            .filter_map(|&pos| changes.map_pos(pos, Assoc::After, MapMode::TrackDel))
            .collect();

        if positions.is_empty() {
            None
        } else {
            Some(Mark(positions))
        }
    }
}

impl From<Vec<usize>> for Mark {
    fn from(positions: Vec<usize>) -> Self {
        Mark(positions)
    }
}

fn push_unique(ring: &mut Vec<Mark>, mark: Mark) {
    if ring.last() == Some(&mark) {
        return;
    }

    ring.push(mark);
}

/// The active mark and mark ring for a single editing surface.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MarkState {
    active: Option<Mark>,
    ring: Vec<Mark>,
}

impl MarkState {
    /// Create an empty mark state.
    pub fn new() -> Self {
        MarkState::default()
    }

    /// The active mark.
    pub fn current(&self) -> Option<&Mark> {
        self.active.as_ref()
    }

    /// The ring of deactivated marks, oldest first.
    pub fn ring(&self) -> &[Mark] {
        self.ring.as_slice()
    }

    /// Replace the active mark. Pass [None] to deactivate it.
    pub fn set(&mut self, mark: Option<Mark>) {
        self.active = mark;
    }

    /// Move the active mark onto the ring, and then either activate `mark` or push it onto the
    /// ring as well.
    ///
    /// Passing [None] just deactivates the current mark.
    pub fn push(&mut self, mark: Option<Mark>, activate: bool) {
        if let Some(prev) = self.active.take() {
            push_unique(&mut self.ring, prev);
        }

        match mark {
            Some(mark) if !activate => push_unique(&mut self.ring, mark),
            mark => self.active = mark,
        }
    }

    /// Deactivate and return the active mark, or pop the most recent mark off the ring.
    pub fn pop(&mut self) -> Option<Mark> {
        if let Some(mark) = self.active.take() {
            return Some(mark);
        }

        self.ring.pop()
    }

    /// Return the active mark, or the most recent mark on the ring.
    pub fn peek_last(&self) -> Option<&Mark> {
        self.active.as_ref().or_else(|| self.ring.last())
    }

    /// The most recent mark on the ring, ignoring the active mark.
    pub fn ring_top(&self) -> Option<&Mark> {
        self.ring.last()
    }

    /// Replace the most recent mark on the ring.
    pub fn replace_ring_top(&mut self, mark: Mark) {
        match self.ring.last_mut() {
            Some(top) => *top = mark,
            None => self.ring.push(mark),
        }
    }

    /// Remove the most recent mark from the ring.
    pub fn drop_ring_top(&mut self) -> Option<Mark> {
        self.ring.pop()
    }

    /// Place a mark at the oldest end of the ring.
    pub fn push_oldest(&mut self, mark: Mark) {
        self.ring.insert(0, mark);
    }

    /// Move every remembered mark through a document change.
    pub fn remap(&mut self, changes: &ChangeSet) {
        self.active = self.active.as_ref().and_then(|m| m.map(changes));
        self.ring = self.ring.iter().filter_map(|m| m.map(changes)).collect();
    }

    /// Handle a document change: deactivate the mark, and remap the ring.
    pub fn on_edit(&mut self, changes: &ChangeSet) {
        self.active = None;
        self.remap(changes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Change;

    macro_rules! mark {
        ( $( $p: expr ),* ) => {
            Mark::new(vec![ $( $p, )* ])
        };
    }

    #[test]
    fn test_push_activate() {
        let mut marks = MarkState::new();

        marks.push(Some(mark![3]), true);
        assert_eq!(marks.current(), Some(&mark![3]));
        assert!(marks.ring().is_empty());

        marks.push(Some(mark![5]), true);
        assert_eq!(marks.current(), Some(&mark![5]));
        assert_eq!(marks.ring(), &[mark![3]]);

        // Pushing nothing deactivates.
        marks.push(None, false);
        assert_eq!(marks.current(), None);
        assert_eq!(marks.ring(), &[mark![3], mark![5]]);
    }

    #[test]
    fn test_push_without_activate() {
        let mut marks = MarkState::new();

        marks.push(Some(mark![1, 4]), false);
        assert_eq!(marks.current(), None);
        assert_eq!(marks.ring(), &[mark![1, 4]]);
    }

    #[test]
    fn test_push_dedup() {
        let mut marks = MarkState::new();

        marks.push(Some(mark![7]), false);
        marks.push(Some(mark![7]), false);
        assert_eq!(marks.ring(), &[mark![7]]);

        marks.set(Some(mark![7]));
        marks.push(None, false);
        assert_eq!(marks.ring(), &[mark![7]]);

        marks.push(Some(mark![8]), false);
        marks.push(Some(mark![7]), false);
        assert_eq!(marks.ring(), &[mark![7], mark![8], mark![7]]);
    }

    #[test]
    fn test_pop_and_peek() {
        let mut marks = MarkState::new();

        marks.push(Some(mark![1]), false);
        marks.push(Some(mark![2]), false);
        marks.set(Some(mark![3]));

        assert_eq!(marks.peek_last(), Some(&mark![3]));
        assert_eq!(marks.pop(), Some(mark![3]));
        assert_eq!(marks.current(), None);
        assert_eq!(marks.peek_last(), Some(&mark![2]));
        assert_eq!(marks.pop(), Some(mark![2]));
        assert_eq!(marks.pop(), Some(mark![1]));
        assert_eq!(marks.pop(), None);
        assert_eq!(marks.peek_last(), None);
    }

    #[test]
    fn test_ring_edits() {
        let mut marks = MarkState::new();

        marks.push(Some(mark![1]), false);
        marks.push(Some(mark![2]), false);

        marks.replace_ring_top(mark![9]);
        assert_eq!(marks.ring(), &[mark![1], mark![9]]);

        marks.push_oldest(mark![0]);
        assert_eq!(marks.ring(), &[mark![0], mark![1], mark![9]]);

        assert_eq!(marks.drop_ring_top(), Some(mark![9]));
        assert_eq!(marks.ring_top(), Some(&mark![1]));
    }

    #[test]
    fn test_remap_deleted() {
        let mut marks = MarkState::new();
        let del = ChangeSet::new(vec![Change::new(5, 15, "")]);

        marks.push(Some(mark![10]), false);
        marks.push(Some(mark![2, 12, 20]), false);
        marks.on_edit(&del);

        assert_eq!(marks.ring(), &[mark![2, 10]]);
    }

    #[test]
    fn test_edit_deactivates() {
        let mut marks = MarkState::new();
        let ins = ChangeSet::new(vec![Change::new(0, 0, "ab")]);

        marks.set(Some(mark![4]));
        marks.push(Some(mark![0, 3]), false);
        marks.on_edit(&ins);

        assert_eq!(marks.current(), None);
        assert_eq!(marks.ring(), &[mark![6], mark![2, 5]]);
    }

    #[test]
    fn test_remap_active() {
        let mut marks = MarkState::new();

        marks.set(Some(mark![6]));
        marks.remap(&ChangeSet::new(vec![Change::new(5, 7, "")]));
        assert_eq!(marks.current(), None);

        marks.set(Some(mark![8]));
        marks.remap(&ChangeSet::new(vec![Change::new(5, 7, "")]));
        assert_eq!(marks.current(), Some(&mark![6]));
    }
}

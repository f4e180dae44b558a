//! # Editing surfaces
//!
//! ## Overview
//!
//! The commands in this crate don't own any text. Instead they operate on a host-provided
//! [Surface], which exposes an immutable-per-edit document along with a multi-cursor
//! [Selection], and which reports every document change back as a [ChangeSet] so that saved marks
//! can be moved along with the text.
//!
//! Motions and other "physical" operations, such as moving the cursor up a line, are supplied by
//! the host and invoked by name through [Primitive].
//!
//! For hosts that don't bring their own buffer, [RopeSurface] implements everything on top of a
//! [ropey::Rope].
mod rope;

pub use self::rope::RopeSurface;

/// A single selection range. The anchor stays put while the head moves.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SelectionRange {
    /// The fixed end of the range.
    pub anchor: usize,

    /// The moving end of the range, where the cursor is drawn.
    pub head: usize,
}

impl SelectionRange {
    /// Create a new range.
    pub fn new(anchor: usize, head: usize) -> Self {
        SelectionRange { anchor, head }
    }

    /// Create an empty range at a position.
    pub fn cursor(pos: usize) -> Self {
        SelectionRange { anchor: pos, head: pos }
    }

    /// The start of the range.
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// The end of the range.
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Whether the range covers no text.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// The set of selection ranges on a surface, one per cursor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Selection {
    /// The selected ranges.
    pub ranges: Vec<SelectionRange>,

    /// Index of the primary range.
    pub main: usize,
}

impl Selection {
    /// Create a selection. The main index is clamped into range.
    pub fn new(ranges: Vec<SelectionRange>, main: usize) -> Self {
        let ranges = if ranges.is_empty() { vec![SelectionRange::default()] } else { ranges };
        let main = main.min(ranges.len() - 1);

        Selection { ranges, main }
    }

    /// A selection with a single range.
    pub fn single(range: SelectionRange) -> Self {
        Selection { ranges: vec![range], main: 0 }
    }

    /// A selection of empty ranges at the given positions.
    pub fn cursors(positions: &[usize], main: usize) -> Self {
        let ranges = positions.iter().copied().map(SelectionRange::cursor).collect();

        Selection::new(ranges, main)
    }

    /// Whether none of the ranges cover any text.
    pub fn is_empty(&self) -> bool {
        self.ranges.iter().all(SelectionRange::is_empty)
    }

    /// The head of every range.
    pub fn heads(&self) -> Vec<usize> {
        self.ranges.iter().map(|r| r.head).collect()
    }

    /// The primary range.
    pub fn main_range(&self) -> SelectionRange {
        self.ranges[self.main]
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::single(SelectionRange::default())
    }
}

/// A line in the document. `to` points at the end of the line's text, before the line break.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Line {
    /// Position of the line's first character.
    pub from: usize,

    /// Position after the line's last character.
    pub to: usize,

    /// The line's text, without its line break.
    pub text: String,
}

/// Replace the text between two positions.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Change {
    /// Start of the replaced range.
    pub from: usize,

    /// End of the replaced range.
    pub to: usize,

    /// Text to insert in place of the range.
    pub insert: String,
}

impl Change {
    /// Create a new change.
    pub fn new(from: usize, to: usize, insert: impl Into<String>) -> Self {
        Change { from, to, insert: insert.into() }
    }

    /// Length of the inserted text, in characters.
    pub fn insert_len(&self) -> usize {
        self.insert.chars().count()
    }
}

/// Which side of an insertion a position sticks to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Assoc {
    /// Stay before text inserted at the position.
    Before,

    /// Move after text inserted at the position.
    After,
}

/// How positions inside deleted text are mapped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MapMode {
    /// Positions inside a deletion move to its edge.
    Simple,

    /// Positions inside a deletion are dropped.
    TrackDel,
}

/// A description of the changes made by a single document edit.
///
/// Changes are sorted, don't overlap, and are expressed in the coordinates of the document before
/// the edit.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Create a change set. The changes are sorted by their starting position, and changes
    /// whose ranges overlap are merged into one.
    pub fn new(mut changes: Vec<Change>) -> Self {
        changes.sort_by_key(|c| (c.from, c.to));

        let mut merged: Vec<Change> = Vec::with_capacity(changes.len());

        for change in changes {
            match merged.last_mut() {
                Some(prev) if change.from < prev.to => {
                    prev.to = prev.to.max(change.to);
                    prev.insert.push_str(&change.insert);
                },
                _ => merged.push(change),
            }
        }

        ChangeSet { changes: merged }
    }

    /// The changes in this set.
    pub fn changes(&self) -> &[Change] {
        self.changes.as_slice()
    }

    /// Whether this set changes nothing.
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(|c| c.from == c.to && c.insert.is_empty())
    }

    /// Map a position in the old document to its position in the new one.
    ///
    /// With [MapMode::TrackDel], a position strictly inside a deleted range maps to [None].
    pub fn map_pos(&self, pos: usize, assoc: Assoc, mode: MapMode) -> Option<usize> {
        let mut shift: isize = 0;

        for change in self.changes.iter() {
            if pos < change.from {
                break;
            }

            let ins = change.insert_len();
            let del = change.to - change.from;

            if pos > change.to {
                shift += ins as isize - del as isize;
                continue;
            }

            if mode == MapMode::TrackDel && change.from < pos && pos < change.to {
                return None;
            }

            let start = (change.from as isize + shift) as usize;
            let after = if del > 0 && pos == change.to {
                true
            } else if del > 0 && pos == change.from {
                false
            } else {
                assoc == Assoc::After
            };

            return Some(if after { start + ins } else { start });
        }

        Some((pos as isize + shift) as usize)
    }
}

/// Operations supplied by the host's editing library, invoked by name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Primitive {
    /// Move each cursor up a line.
    CursorLineUp,
    /// Move each cursor down a line.
    CursorLineDown,
    /// Move each cursor back a character.
    CursorCharBackward,
    /// Move each cursor forward a character.
    CursorCharForward,
    /// Move each cursor to the start of the previous word group.
    CursorGroupLeft,
    /// Move each cursor past the end of the next word group.
    CursorGroupRight,
    /// Move each cursor to the start of its line.
    CursorLineStart,
    /// Move each cursor to the end of its line.
    CursorLineEnd,
    /// Move the cursor to the start of the document.
    CursorDocStart,
    /// Move the cursor to the end of the document.
    CursorDocEnd,
    /// Move each cursor up a page.
    CursorPageUp,
    /// Move each cursor down a page.
    CursorPageDown,

    /// Extend each range up a line.
    SelectLineUp,
    /// Extend each range down a line.
    SelectLineDown,
    /// Extend each range back a character.
    SelectCharBackward,
    /// Extend each range forward a character.
    SelectCharForward,
    /// Extend each range to the start of the previous word group.
    SelectGroupLeft,
    /// Extend each range past the end of the next word group.
    SelectGroupRight,
    /// Extend each range backward by a word group.
    SelectGroupBackward,
    /// Extend each range forward by a word group.
    SelectGroupForward,
    /// Extend each range to the start of its line.
    SelectLineStart,
    /// Extend each range to the end of its line.
    SelectLineEnd,
    /// Extend the main range to the start of the document.
    SelectDocStart,
    /// Extend the main range to the end of the document.
    SelectDocEnd,
    /// Extend each range up a page.
    SelectPageUp,
    /// Extend each range down a page.
    SelectPageDown,
    /// Select the whole document.
    SelectAll,

    /// Delete the selection, or the character before each cursor.
    DeleteCharBackward,
    /// Delete the selection, or the character after each cursor.
    DeleteCharForward,
    /// Split the line at each cursor, leaving the cursor in place.
    SplitLine,
    /// Comment or uncomment the selected lines.
    ToggleComment,
    /// Undo the last change.
    Undo,
    /// Redo the last undone change.
    Redo,
    /// Reduce the selection to its main range, or collapse a lone range.
    SimplifySelection,

    /// Open the host's search panel.
    OpenSearchPanel,
    /// Jump to the next search match.
    FindNext,
    /// Jump to the previous search match.
    FindPrevious,
    /// Open the host's replace panel.
    Replace,
    /// Start completion at the main cursor.
    StartCompletion,
    /// Scroll the main cursor into view.
    ScrollIntoView,
    /// Cycle the main cursor line between the center, top and bottom of the view.
    Recenter,
}

impl Primitive {
    /// Whether running this primitive should push the active mark onto the mark ring first.
    pub fn breaks_mark(&self) -> bool {
        matches!(self, Primitive::SplitLine | Primitive::ToggleComment)
    }
}

/// Application-level capabilities that live outside of an editing surface.
pub trait HostCommands {
    /// Run a host command by its identifier, such as `"app:go-back"`.
    ///
    /// Returns whether the command exists.
    fn execute_command(&mut self, id: &str) -> bool;

    /// Focus the host's command line, pre-filled with some text.
    fn show_command_line(&mut self, text: &str);
}

/// A text editing surface provided by the host.
///
/// Positions are character offsets into the document.
pub trait Surface {
    /// The length of the document.
    fn doc_len(&self) -> usize;

    /// The text between two positions.
    fn slice_text(&self, from: usize, to: usize) -> String;

    /// The line containing a position.
    fn line_at(&self, pos: usize) -> Line;

    /// The current selection.
    fn selection(&self) -> Selection;

    /// Replace the current selection.
    fn set_selection(&mut self, selection: Selection);

    /// Apply a set of non-overlapping replacements, given in current document coordinates, as a
    /// single edit. The selection is mapped through the edit.
    fn replace_ranges(&mut self, changes: Vec<Change>);

    /// Run a host primitive. Returns `false` if the primitive didn't apply.
    fn run_primitive(&mut self, primitive: Primitive) -> bool;

    /// Return the document changes made since the last call, oldest first.
    fn take_changes(&mut self) -> Vec<ChangeSet>;

    /// Whether an input method composition is in progress.
    fn is_composing(&self) -> bool {
        false
    }

    /// Whether a completion popup is currently open.
    fn completion_active(&self) -> bool {
        false
    }

    /// Access to application-level commands, if the host offers them.
    fn host(&mut self) -> Option<&mut dyn HostCommands> {
        None
    }
}

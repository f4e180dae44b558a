use ropey::Rope;

use crate::config::EmacsConfig;

use super::{
    Assoc,
    Change,
    ChangeSet,
    HostCommands,
    Line,
    MapMode,
    Primitive,
    Selection,
    SelectionRange,
    Surface,
};

const DEFAULT_PAGE_LINES: usize = 20;

#[derive(Clone)]
struct Snapshot {
    rope: Rope,
    selection: Selection,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A [Surface] backed by a [Rope], with snapshot-based undo.
pub struct RopeSurface {
    rope: Rope,
    selection: Selection,
    changes: Vec<ChangeSet>,

    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,

    page_lines: usize,
    composing: bool,
    completion: bool,
    host: Option<Box<dyn HostCommands>>,
}

impl RopeSurface {
    /// Create a surface containing some text, with the cursor at the start.
    pub fn new(text: &str) -> Self {
        RopeSurface {
            rope: Rope::from_str(text),
            selection: Selection::default(),
            changes: vec![],

            undo: vec![],
            redo: vec![],

            page_lines: DEFAULT_PAGE_LINES,
            composing: false,
            completion: false,
            host: None,
        }
    }

    /// Create a surface whose page motions follow a configuration.
    pub fn with_config(text: &str, config: &EmacsConfig) -> Self {
        RopeSurface::new(text).page_lines(config.page_lines)
    }

    /// Set how many lines a page motion moves.
    pub fn page_lines(mut self, lines: usize) -> Self {
        self.page_lines = lines.max(1);
        self
    }

    /// Attach application-level commands.
    pub fn set_host(&mut self, host: Box<dyn HostCommands>) {
        self.host = Some(host);
    }

    /// Mark whether an input method composition is in progress.
    pub fn set_composing(&mut self, composing: bool) {
        self.composing = composing;
    }

    /// Mark whether a completion popup is open.
    pub fn set_completion_active(&mut self, active: bool) {
        self.completion = active;
    }

    /// The full document text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot { rope: self.rope.clone(), selection: self.selection.clone() }
    }

    fn clamp(&self, pos: usize) -> usize {
        pos.min(self.rope.len_chars())
    }

    fn line_bounds(&self, idx: usize) -> (usize, usize) {
        let start = self.rope.line_to_char(idx);
        let line = self.rope.line(idx);
        let mut len = line.len_chars();

        if len > 0 && line.char(len - 1) == '\n' {
            len -= 1;

            if len > 0 && line.char(len - 1) == '\r' {
                len -= 1;
            }
        }

        (start, start + len)
    }

    fn apply(&mut self, cs: ChangeSet) {
        for change in cs.changes().iter().rev() {
            let from = self.clamp(change.from);
            let to = self.clamp(change.to);

            self.rope.remove(from..to);
            self.rope.insert(from, change.insert.as_str());
        }

        let map = |pos| cs.map_pos(pos, Assoc::Before, MapMode::Simple).unwrap_or(pos);
        let ranges = self
            .selection
            .ranges
            .iter()
            .map(|r| SelectionRange::new(map(r.anchor), map(r.head)))
            .collect();

        self.selection = Selection::new(ranges, self.selection.main);
        self.changes.push(cs);
    }

    fn restore(&mut self, snapshot: Snapshot) {
        let old: Vec<char> = self.rope.chars().collect();
        let new: Vec<char> = snapshot.rope.chars().collect();

        let prefix = old.iter().zip(new.iter()).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let insert: String = new[prefix..new.len() - suffix].iter().collect();
        let change = Change::new(prefix, old.len() - suffix, insert);

        let cs = ChangeSet::new(vec![change]);

        self.rope = snapshot.rope;
        self.selection = snapshot.selection;

        if !cs.is_empty() {
            self.changes.push(cs);
        }
    }

    fn line_up(&self, pos: usize) -> usize {
        let idx = self.rope.char_to_line(pos);

        if idx == 0 {
            return 0;
        }

        let (start, _) = self.line_bounds(idx);
        let (tstart, tend) = self.line_bounds(idx - 1);

        (tstart + (pos - start)).min(tend)
    }

    fn line_down(&self, pos: usize) -> usize {
        let idx = self.rope.char_to_line(pos);

        if idx + 1 >= self.rope.len_lines() {
            return self.rope.len_chars();
        }

        let (start, _) = self.line_bounds(idx);
        let (tstart, tend) = self.line_bounds(idx + 1);

        (tstart + (pos - start)).min(tend)
    }

    fn page_up(&self, pos: usize) -> usize {
        (0..self.page_lines).fold(pos, |p, _| self.line_up(p))
    }

    fn page_down(&self, pos: usize) -> usize {
        (0..self.page_lines).fold(pos, |p, _| self.line_down(p))
    }

    fn group_right(&self, pos: usize) -> usize {
        let len = self.rope.len_chars();
        let mut pos = pos;

        while pos < len && self.rope.char(pos).is_whitespace() {
            pos += 1;
        }

        if pos < len {
            let word = is_word_char(self.rope.char(pos));

            while pos < len {
                let c = self.rope.char(pos);

                if c.is_whitespace() || is_word_char(c) != word {
                    break;
                }

                pos += 1;
            }
        }

        return pos;
    }

    fn group_left(&self, pos: usize) -> usize {
        let mut pos = pos;

        while pos > 0 && self.rope.char(pos - 1).is_whitespace() {
            pos -= 1;
        }

        if pos > 0 {
            let word = is_word_char(self.rope.char(pos - 1));

            while pos > 0 {
                let c = self.rope.char(pos - 1);

                if c.is_whitespace() || is_word_char(c) != word {
                    break;
                }

                pos -= 1;
            }
        }

        return pos;
    }

    fn line_start(&self, pos: usize) -> usize {
        self.line_bounds(self.rope.char_to_line(pos)).0
    }

    fn line_end(&self, pos: usize) -> usize {
        self.line_bounds(self.rope.char_to_line(pos)).1
    }

    fn motion(&self, primitive: Primitive, pos: usize) -> usize {
        match primitive {
            Primitive::CursorLineUp | Primitive::SelectLineUp => self.line_up(pos),
            Primitive::CursorLineDown | Primitive::SelectLineDown => self.line_down(pos),
            Primitive::CursorCharBackward | Primitive::SelectCharBackward => pos.saturating_sub(1),
            Primitive::CursorCharForward | Primitive::SelectCharForward => {
                (pos + 1).min(self.rope.len_chars())
            },
            Primitive::CursorGroupLeft |
            Primitive::SelectGroupLeft |
            Primitive::SelectGroupBackward => self.group_left(pos),
            Primitive::CursorGroupRight |
            Primitive::SelectGroupRight |
            Primitive::SelectGroupForward => self.group_right(pos),
            Primitive::CursorLineStart | Primitive::SelectLineStart => self.line_start(pos),
            Primitive::CursorLineEnd | Primitive::SelectLineEnd => self.line_end(pos),
            Primitive::CursorPageUp | Primitive::SelectPageUp => self.page_up(pos),
            Primitive::CursorPageDown | Primitive::SelectPageDown => self.page_down(pos),
            _ => pos,
        }
    }

    fn move_heads(&mut self, primitive: Primitive, extend: bool) -> bool {
        let ranges = self
            .selection
            .ranges
            .iter()
            .map(|r| {
                let head = self.motion(primitive, r.head);
                let anchor = if extend { r.anchor } else { head };

                SelectionRange::new(anchor, head)
            })
            .collect();

        self.selection = Selection::new(ranges, self.selection.main);

        return true;
    }

    fn delete_chars(&mut self, forward: bool) -> bool {
        let len = self.rope.len_chars();
        let mut changes: Vec<Change> = vec![];

        for r in self.selection.ranges.iter() {
            let change = if !r.is_empty() {
                Change::new(r.from(), r.to(), "")
            } else if forward && r.head < len {
                Change::new(r.head, r.head + 1, "")
            } else if !forward && r.head > 0 {
                Change::new(r.head - 1, r.head, "")
            } else {
                continue;
            };

            changes.push(change);
        }

        changes.sort_by_key(|c| c.from);
        changes.dedup_by(|b, a| b.from < a.to);

        if changes.is_empty() {
            return false;
        }

        self.replace_ranges(changes);

        return true;
    }

    fn simplify_selection(&mut self) -> bool {
        if self.selection.ranges.len() > 1 {
            self.selection = Selection::single(self.selection.main_range());
            return true;
        }

        let range = self.selection.main_range();

        if range.is_empty() {
            return false;
        }

        self.selection = Selection::single(SelectionRange::cursor(range.head));

        return true;
    }
}

impl Default for RopeSurface {
    fn default() -> Self {
        RopeSurface::new("")
    }
}

impl From<&str> for RopeSurface {
    fn from(text: &str) -> Self {
        RopeSurface::new(text)
    }
}

impl Surface for RopeSurface {
    fn doc_len(&self) -> usize {
        self.rope.len_chars()
    }

    fn slice_text(&self, from: usize, to: usize) -> String {
        let from = self.clamp(from);
        let to = self.clamp(to).max(from);

        self.rope.slice(from..to).to_string()
    }

    fn line_at(&self, pos: usize) -> Line {
        let idx = self.rope.char_to_line(self.clamp(pos));
        let (from, to) = self.line_bounds(idx);
        let text = self.rope.slice(from..to).to_string();

        Line { from, to, text }
    }

    fn selection(&self) -> Selection {
        self.selection.clone()
    }

    fn set_selection(&mut self, selection: Selection) {
        let ranges = selection
            .ranges
            .iter()
            .map(|r| SelectionRange::new(self.clamp(r.anchor), self.clamp(r.head)))
            .collect();

        self.selection = Selection::new(ranges, selection.main);
    }

    fn replace_ranges(&mut self, changes: Vec<Change>) {
        let cs = ChangeSet::new(changes);

        if cs.is_empty() {
            return;
        }

        self.undo.push(self.snapshot());
        self.redo.clear();
        self.apply(cs);
    }

    fn run_primitive(&mut self, primitive: Primitive) -> bool {
        match primitive {
            Primitive::CursorLineUp |
            Primitive::CursorLineDown |
            Primitive::CursorCharBackward |
            Primitive::CursorCharForward |
            Primitive::CursorGroupLeft |
            Primitive::CursorGroupRight |
            Primitive::CursorLineStart |
            Primitive::CursorLineEnd |
            Primitive::CursorPageUp |
            Primitive::CursorPageDown => self.move_heads(primitive, false),

            Primitive::SelectLineUp |
            Primitive::SelectLineDown |
            Primitive::SelectCharBackward |
            Primitive::SelectCharForward |
            Primitive::SelectGroupLeft |
            Primitive::SelectGroupRight |
            Primitive::SelectGroupBackward |
            Primitive::SelectGroupForward |
            Primitive::SelectLineStart |
            Primitive::SelectLineEnd |
            Primitive::SelectPageUp |
            Primitive::SelectPageDown => self.move_heads(primitive, true),

            Primitive::CursorDocStart => {
                self.selection = Selection::single(SelectionRange::cursor(0));
                true
            },
            Primitive::CursorDocEnd => {
                let len = self.rope.len_chars();
                self.selection = Selection::single(SelectionRange::cursor(len));
                true
            },
            Primitive::SelectDocStart => {
                let anchor = self.selection.main_range().anchor;
                self.selection = Selection::single(SelectionRange::new(anchor, 0));
                true
            },
            Primitive::SelectDocEnd => {
                let anchor = self.selection.main_range().anchor;
                let len = self.rope.len_chars();
                self.selection = Selection::single(SelectionRange::new(anchor, len));
                true
            },
            Primitive::SelectAll => {
                let len = self.rope.len_chars();
                self.selection = Selection::single(SelectionRange::new(0, len));
                true
            },

            Primitive::DeleteCharBackward => self.delete_chars(false),
            Primitive::DeleteCharForward => self.delete_chars(true),
            Primitive::SplitLine => {
                let changes = self
                    .selection
                    .ranges
                    .iter()
                    .map(|r| Change::new(r.from(), r.to(), "\n"))
                    .collect();

                self.replace_ranges(changes);
                true
            },
            Primitive::Undo => {
                match self.undo.pop() {
                    Some(snapshot) => {
                        self.redo.push(self.snapshot());
                        self.restore(snapshot);
                        true
                    },
                    None => false,
                }
            },
            Primitive::Redo => {
                match self.redo.pop() {
                    Some(snapshot) => {
                        self.undo.push(self.snapshot());
                        self.restore(snapshot);
                        true
                    },
                    None => false,
                }
            },
            Primitive::SimplifySelection => self.simplify_selection(),

            // These need a view or language support, which a bare rope doesn't have.
            Primitive::ToggleComment |
            Primitive::OpenSearchPanel |
            Primitive::FindNext |
            Primitive::FindPrevious |
            Primitive::Replace |
            Primitive::StartCompletion |
            Primitive::ScrollIntoView |
            Primitive::Recenter => false,
        }
    }

    fn take_changes(&mut self) -> Vec<ChangeSet> {
        std::mem::take(&mut self.changes)
    }

    fn is_composing(&self) -> bool {
        self.composing
    }

    fn completion_active(&self) -> bool {
        self.completion
    }

    fn host(&mut self) -> Option<&mut dyn HostCommands> {
        match self.host {
            Some(ref mut host) => {
                let host: &mut dyn HostCommands = host.as_mut();
                Some(host)
            },
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(text: &str, pos: usize) -> RopeSurface {
        let mut s = RopeSurface::new(text);
        s.set_selection(Selection::cursors(&[pos], 0));
        s
    }

    macro_rules! assert_head {
        ($s: expr, $prim: expr, $pos: expr) => {
            assert!($s.run_primitive($prim));
            assert_eq!($s.selection().main_range().head, $pos);
        };
    }

    #[test]
    fn test_line_at() {
        let s = surface("hello\nworld\n", 0);

        assert_eq!(s.line_at(2), Line { from: 0, to: 5, text: "hello".into() });
        assert_eq!(s.line_at(5), Line { from: 0, to: 5, text: "hello".into() });
        assert_eq!(s.line_at(6), Line { from: 6, to: 11, text: "world".into() });
        assert_eq!(s.line_at(12), Line { from: 12, to: 12, text: "".into() });
    }

    #[test]
    fn test_char_motion() {
        let mut s = surface("abc", 1);

        assert_head!(s, Primitive::CursorCharForward, 2);
        assert_head!(s, Primitive::CursorCharForward, 3);
        assert_head!(s, Primitive::CursorCharForward, 3);
        assert_head!(s, Primitive::CursorCharBackward, 2);
        assert!(s.selection().is_empty());

        assert_head!(s, Primitive::SelectCharBackward, 1);
        assert_eq!(s.selection().main_range(), SelectionRange::new(2, 1));
    }

    #[test]
    fn test_line_motion() {
        let mut s = surface("abcdef\nab\nabcdef", 5);

        assert_head!(s, Primitive::CursorLineDown, 9);
        assert_head!(s, Primitive::CursorLineDown, 12);
        assert_head!(s, Primitive::CursorLineDown, 16);
        assert_head!(s, Primitive::CursorLineUp, 9);
        assert_head!(s, Primitive::CursorLineStart, 7);
        assert_head!(s, Primitive::CursorLineEnd, 9);
        assert_head!(s, Primitive::CursorDocStart, 0);
        assert_head!(s, Primitive::CursorLineUp, 0);
        assert_head!(s, Primitive::CursorDocEnd, 16);
    }

    #[test]
    fn test_page_motion() {
        let text = "a\n".repeat(10);
        let mut s = RopeSurface::new(&text).page_lines(3);

        assert_head!(s, Primitive::CursorPageDown, 6);
        assert_head!(s, Primitive::CursorPageUp, 0);
    }

    #[test]
    fn test_page_lines_config() {
        let text = "a\n".repeat(10);
        let config = EmacsConfig { page_lines: 2, ..EmacsConfig::default() };
        let mut s = RopeSurface::with_config(&text, &config);

        assert_head!(s, Primitive::CursorPageDown, 4);
        assert_head!(s, Primitive::SelectPageDown, 8);
        assert_eq!(s.selection().main_range().anchor, 4);
    }

    #[test]
    fn test_group_motion() {
        let mut s = surface("foo bar, baz", 0);

        assert_head!(s, Primitive::CursorGroupRight, 3);
        assert_head!(s, Primitive::CursorGroupRight, 7);
        assert_head!(s, Primitive::CursorGroupRight, 8);
        assert_head!(s, Primitive::CursorGroupRight, 12);
        assert_head!(s, Primitive::CursorGroupLeft, 9);
        assert_head!(s, Primitive::CursorGroupLeft, 7);
        assert_head!(s, Primitive::CursorGroupLeft, 4);
    }

    #[test]
    fn test_replace_maps_selection() {
        let mut s = surface("hello world", 6);

        s.replace_ranges(vec![Change::new(0, 5, "bye")]);
        assert_eq!(s.text(), "bye world");
        assert_eq!(s.selection().heads(), vec![4]);

        let changes = s.take_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].changes(), &[Change::new(0, 5, "bye")]);
        assert!(s.take_changes().is_empty());
    }

    #[test]
    fn test_delete_chars() {
        let mut s = surface("abc", 2);

        assert!(s.run_primitive(Primitive::DeleteCharBackward));
        assert_eq!(s.text(), "ac");
        assert_eq!(s.selection().heads(), vec![1]);

        assert!(s.run_primitive(Primitive::DeleteCharForward));
        assert_eq!(s.text(), "a");
        assert!(!s.run_primitive(Primitive::DeleteCharForward));
    }

    #[test]
    fn test_undo_redo() {
        let mut s = surface("one two three", 0);

        s.replace_ranges(vec![Change::new(4, 7, "2")]);
        assert_eq!(s.text(), "one 2 three");
        let _ = s.take_changes();

        assert!(s.run_primitive(Primitive::Undo));
        assert_eq!(s.text(), "one two three");
        assert_eq!(s.take_changes(), vec![ChangeSet::new(vec![Change::new(4, 5, "two")])]);

        assert!(s.run_primitive(Primitive::Redo));
        assert_eq!(s.text(), "one 2 three");
        assert!(!s.run_primitive(Primitive::Redo));

        assert!(s.run_primitive(Primitive::Undo));
        assert!(!s.run_primitive(Primitive::Undo));
    }

    #[test]
    fn test_simplify_selection() {
        let mut s = RopeSurface::new("abcdef");
        s.set_selection(Selection::new(
            vec![SelectionRange::new(0, 2), SelectionRange::new(3, 5)],
            1,
        ));

        assert!(s.run_primitive(Primitive::SimplifySelection));
        assert_eq!(s.selection(), Selection::single(SelectionRange::new(3, 5)));
        assert!(s.run_primitive(Primitive::SimplifySelection));
        assert_eq!(s.selection(), Selection::cursors(&[5], 0));
        assert!(!s.run_primitive(Primitive::SimplifySelection));
    }

    #[test]
    fn test_split_line() {
        let mut s = surface("ab", 1);

        assert!(s.run_primitive(Primitive::SplitLine));
        assert_eq!(s.text(), "a\nb");
        assert_eq!(s.selection().heads(), vec![1]);
    }
}

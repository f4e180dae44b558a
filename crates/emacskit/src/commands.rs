//! # Commands
//!
//! ## Overview
//!
//! Named operations that can be bound to chords. Each [Command] is a plain function that receives
//! an [EmacsContext], giving it access to the editing surface, the surface's marks, its dispatch
//! state and the shared kill ring.
//!
//! The default [CommandSet] contains the usual Emacs editing commands (`killLine`, `yank`,
//! `setMark`, `exchangePointAndMark`, and so on). Applications can register additional commands
//! before building a [Keymap](crate::keymap::Keymap).
use std::collections::HashMap;
use std::sync::RwLockWriteGuard;

use bitflags::bitflags;
use tracing::warn;

use crate::dispatch::DispatchState;
use crate::killring::{KillRing, SharedKillRing};
use crate::mark::{Mark, MarkState};
use crate::surface::{
    Assoc,
    Change,
    ChangeSet,
    Line,
    MapMode,
    Primitive,
    Selection,
    SelectionRange,
    Surface,
};

bitflags! {
    /// Properties of a [Command] that affect how it gets dispatched.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct CommandFlags: u8 {
        /// The command doesn't modify the document, and doesn't reset the last command.
        const READ_ONLY = 0b00001;

        /// The command receives the repeat count instead of being run repeatedly.
        const HANDLES_COUNT = 0b00010;

        /// The command manages the last command itself.
        const KEEP_LAST_COMMAND = 0b00100;

        /// Push the active mark onto the ring before running the command.
        const BREAKS_MARK = 0b01000;

        /// The command starts a repeat count instead of running.
        const UNIVERSAL_ARGUMENT = 0b10000;
    }
}

/// Whether a command did anything.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandResult {
    /// The key was consumed.
    Applied,

    /// The command declined the key, which should be left to the host's default processing.
    NotApplied,
}

/// Which way to kill a word.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WordDirection {
    /// Kill the word before the cursor.
    Left,

    /// Kill the word after the cursor.
    Right,
}

/// Static arguments attached to a binding.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum CommandArgs {
    /// No arguments.
    #[default]
    None,

    /// Some text, such as the string to insert.
    Text(String),

    /// The direction to kill a word in.
    Direction(WordDirection),

    /// A pair of primitives: one to use when no mark is active, and one to use when it is.
    Motion {
        /// Moves the cursor.
        go: Primitive,

        /// Extends the selection.
        select: Primitive,
    },

    /// Change the case of text.
    Case {
        /// Upper-case when `true`, lower-case otherwise.
        upper: bool,

        /// Use the current selection instead of the next word.
        region: bool,
    },
}

/// The function that runs a [Command].
///
/// The count is only given to commands that have [CommandFlags::HANDLES_COUNT] when it's greater
/// than one.
pub type CommandFn = fn(&mut EmacsContext<'_>, &CommandArgs, Option<usize>) -> CommandResult;

/// A named command.
#[derive(Clone, Copy)]
pub struct Command {
    exec: CommandFn,
    flags: CommandFlags,
}

impl Command {
    /// Create a command.
    pub fn new(exec: CommandFn) -> Self {
        Command { exec, flags: CommandFlags::empty() }
    }

    /// Add flags to this command.
    pub fn flags(mut self, flags: CommandFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// This command's flags.
    pub fn get_flags(&self) -> CommandFlags {
        self.flags
    }

    /// Whether the command doesn't reset the last command.
    pub fn preserves_last_command(&self) -> bool {
        self.flags.intersects(CommandFlags::READ_ONLY | CommandFlags::KEEP_LAST_COMMAND)
    }

    /// Run the command.
    pub fn exec(
        &self,
        ctx: &mut EmacsContext<'_>,
        args: &CommandArgs,
        count: Option<usize>,
    ) -> CommandResult {
        (self.exec)(ctx, args, count)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").field("flags", &self.flags).finish_non_exhaustive()
    }
}

/// A table of named commands.
#[derive(Clone, Debug)]
pub struct CommandSet {
    commands: HashMap<String, Command>,
}

impl CommandSet {
    /// Create an empty command set.
    pub fn empty() -> Self {
        CommandSet { commands: HashMap::new() }
    }

    /// Add a command, replacing any previous command with the same name.
    pub fn register(&mut self, name: impl Into<String>, command: Command) {
        self.commands.insert(name.into(), command);
    }

    /// Look a command up.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Whether a command exists.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl Default for CommandSet {
    fn default() -> Self {
        let mut set = CommandSet::empty();

        let ro = CommandFlags::READ_ONLY;
        let count = CommandFlags::HANDLES_COUNT;
        let keep = CommandFlags::KEEP_LAST_COMMAND;

        set.register("insertString", Command::new(insert_string).flags(CommandFlags::BREAKS_MARK));
        set.register(
            "universalArgument",
            Command::new(universal_argument).flags(CommandFlags::UNIVERSAL_ARGUMENT),
        );
        set.register("goOrSelect", Command::new(go_or_select));
        set.register("setMark", Command::new(set_mark).flags(ro | count));
        set.register(
            "exchangePointAndMark",
            Command::new(exchange_point_and_mark).flags(ro | count),
        );
        set.register("markWord", Command::new(mark_word));
        set.register("selectParagraph", Command::new(select_paragraph));
        set.register("selectRectangularRegion", Command::new(select_rectangular_region));
        set.register("changeCase", Command::new(change_case));
        set.register("killWord", Command::new(kill_word));
        set.register("killLine", Command::new(kill_line).flags(keep));
        set.register("killRegion", Command::new(kill_region));
        set.register("killRingSave", Command::new(kill_ring_save).flags(ro));
        set.register("yank", Command::new(yank).flags(keep));
        set.register("yankRotate", Command::new(yank_rotate).flags(keep));
        set.register("keyboardQuit", Command::new(keyboard_quit));
        set.register("unsetTransientMark", Command::new(unset_transient_mark));
        set.register("focusCommandLine", Command::new(focus_command_line));
        set.register("centerSelection", Command::new(center_selection));
        set.register("recenterTopBottom", Command::new(recenter_top_bottom));
        set.register("navigateBackward", Command::new(navigate_backward));
        set.register("navigateForward", Command::new(navigate_forward));

        return set;
    }
}

/// Everything a command can look at and change.
pub struct EmacsContext<'a> {
    /// The surface the key was pressed in.
    pub surface: &'a mut dyn Surface,

    /// The surface's marks.
    pub marks: &'a mut MarkState,

    /// The surface's dispatch state.
    pub state: &'a mut DispatchState,

    /// The process-wide kill ring.
    pub kill_ring: &'a SharedKillRing,
}

impl<'a> EmacsContext<'a> {
    /// Create a new context.
    pub fn new(
        surface: &'a mut dyn Surface,
        marks: &'a mut MarkState,
        state: &'a mut DispatchState,
        kill_ring: &'a SharedKillRing,
    ) -> Self {
        EmacsContext { surface, marks, state, kill_ring }
    }

    /// Lock the kill ring for writing.
    pub fn kill_ring(&self) -> RwLockWriteGuard<'a, KillRing> {
        let ring: &'a SharedKillRing = self.kill_ring;

        match ring.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Move the marks through any document changes the surface has made.
    pub fn sync_marks(&mut self) {
        for changes in self.surface.take_changes() {
            if !changes.is_empty() {
                self.marks.on_edit(&changes);
            }
        }
    }

    /// Run a surface primitive.
    pub fn run(&mut self, primitive: Primitive) -> bool {
        let res = self.surface.run_primitive(primitive);
        self.sync_marks();
        res
    }

    /// Apply changes to the document.
    pub fn replace(&mut self, changes: Vec<Change>) {
        self.surface.replace_ranges(changes);
        self.sync_marks();
    }

    /// The cursor positions, in a form that can be stored as a [Mark].
    pub fn selection_to_mark(&self) -> Mark {
        Mark::new(self.surface.selection().heads())
    }

    /// Collapse every selection range onto its head. Returns `false` if nothing was selected.
    pub fn clear_selection(&mut self) -> bool {
        let sel = self.surface.selection();

        if sel.is_empty() {
            return false;
        }

        self.surface.set_selection(Selection::cursors(&sel.heads(), sel.main));

        return true;
    }

    /// The selected text of every range, joined by newlines.
    pub fn copy_text(&self) -> String {
        let sel = self.surface.selection();

        sel.ranges
            .iter()
            .map(|r| self.surface.slice_text(r.from(), r.to()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace every selection range with its corresponding text, leaving a cursor after each
    /// insertion.
    fn replace_each(&mut self, texts: Vec<String>) {
        let sel = self.surface.selection();
        let changes: Vec<Change> = sel
            .ranges
            .iter()
            .zip(texts)
            .map(|(r, text)| Change::new(r.from(), r.to(), text))
            .collect();

        let cs = ChangeSet::new(changes.clone());
        let cursors: Vec<usize> = changes
            .iter()
            .map(|c| {
                let start = cs.map_pos(c.from, Assoc::Before, MapMode::Simple).unwrap_or(c.from);
                start + c.insert_len()
            })
            .collect();

        self.replace(changes);
        self.surface.set_selection(Selection::cursors(&cursors, sel.main));
    }

    /// Replace every selection range with the same text.
    pub fn replace_selection(&mut self, text: &str) {
        let n = self.surface.selection().ranges.len();

        self.replace_each(vec![text.to_string(); n]);
    }

    /// Paste text over the selection.
    ///
    /// When there are several cursors and the text has exactly one line per cursor, each cursor
    /// gets its own line.
    pub fn paste(&mut self, text: &str) {
        let n = self.surface.selection().ranges.len();
        let lines: Vec<&str> = text.split('\n').collect();

        if n > 1 && lines.len() == n {
            self.replace_each(lines.into_iter().map(str::to_string).collect());
        } else {
            self.replace_each(vec![text.to_string(); n]);
        }
    }
}

fn has_text(line: &Line) -> bool {
    line.text.chars().any(|c| !c.is_whitespace())
}

fn insert_string(
    ctx: &mut EmacsContext<'_>,
    args: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    if let CommandArgs::Text(text) = args {
        ctx.replace_selection(text);
    }

    CommandResult::Applied
}

fn universal_argument(
    _: &mut EmacsContext<'_>,
    _: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    CommandResult::Applied
}

fn go_or_select(ctx: &mut EmacsContext<'_>, args: &CommandArgs, _: Option<usize>) -> CommandResult {
    if let CommandArgs::Motion { go, select } = args {
        let primitive = if ctx.marks.current().is_some() { *select } else { *go };

        let _ = ctx.run(primitive);
    }

    CommandResult::Applied
}

fn set_mark(ctx: &mut EmacsContext<'_>, _: &CommandArgs, count: Option<usize>) -> CommandResult {
    if count.is_some() {
        // Jump to the previous mark, and remember where we came from.
        let here = ctx.selection_to_mark();

        if let Some(mark) = ctx.marks.pop() {
            ctx.surface.set_selection(Selection::cursors(mark.positions(), 0));
            ctx.marks.push_oldest(here);
        }

        return CommandResult::Applied;
    }

    let sel = ctx.surface.selection();

    if ctx.marks.current().is_some() || !sel.is_empty() {
        ctx.clear_selection();

        if ctx.marks.current().is_some() {
            ctx.marks.push(None, false);
        }

        return CommandResult::Applied;
    }

    let mark = ctx.selection_to_mark();
    ctx.marks.push(Some(mark.clone()), false);
    ctx.marks.set(Some(mark));

    CommandResult::Applied
}

fn exchange_point_and_mark(
    ctx: &mut EmacsContext<'_>,
    _: &CommandArgs,
    count: Option<usize>,
) -> CommandResult {
    let sel = ctx.surface.selection();

    if count.is_none() && !sel.is_empty() {
        let ranges = sel.ranges.iter().map(|r| SelectionRange::new(r.head, r.anchor)).collect();
        ctx.surface.set_selection(Selection::new(ranges, sel.main));

        return CommandResult::Applied;
    }

    let Some(last) = ctx.marks.ring_top().cloned() else {
        return CommandResult::Applied;
    };

    if count.is_some() {
        ctx.marks.replace_ring_top(ctx.selection_to_mark());
        ctx.clear_selection();
        ctx.surface.set_selection(Selection::cursors(last.positions(), sel.main));
    } else {
        let ranges = sel
            .ranges
            .iter()
            .zip(last.positions())
            .map(|(r, &pos)| SelectionRange::new(r.head, pos))
            .collect();

        ctx.surface.set_selection(Selection::new(ranges, sel.main));
    }

    CommandResult::Applied
}

fn mark_word(ctx: &mut EmacsContext<'_>, _: &CommandArgs, _: Option<usize>) -> CommandResult {
    ctx.clear_selection();
    let _ = ctx.run(Primitive::SelectGroupForward);

    // Leave the cursor where it was, with the mark after the word.
    let sel = ctx.surface.selection();
    let ends: Vec<usize> = sel.heads();
    let ranges = sel.ranges.iter().map(|r| SelectionRange::new(r.head, r.anchor)).collect();
    ctx.surface.set_selection(Selection::new(ranges, sel.main));
    ctx.marks.push(Some(Mark::new(ends)), true);

    CommandResult::Applied
}

fn select_paragraph(
    ctx: &mut EmacsContext<'_>,
    _: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    let doc_len = ctx.surface.doc_len();
    let head = ctx.surface.selection().ranges[0].head;
    let start_line = ctx.surface.line_at(head);

    let mut line = start_line.clone();
    let mut start = None;

    while has_text(&line) {
        start = Some(line.from);

        if line.from == 0 {
            break;
        }

        line = ctx.surface.line_at(line.from - 1);
    }

    if start.is_none() {
        // Starting on a blank line: skip ahead to the next paragraph.
        while !has_text(&line) {
            start = Some(line.from);

            if line.to >= doc_len {
                break;
            }

            line = ctx.surface.line_at(line.to + 1);
        }
    } else {
        line = start_line.clone();
    }

    let mut end = None;

    while has_text(&line) {
        end = Some(line.to);

        if line.to >= doc_len {
            break;
        }

        line = ctx.surface.line_at(line.to + 1);
    }

    let start = start.unwrap_or(start_line.from);
    let end = end.unwrap_or(start_line.to);

    ctx.surface.set_selection(Selection::single(SelectionRange::new(start, end)));

    CommandResult::Applied
}

fn select_rectangular_region(
    ctx: &mut EmacsContext<'_>,
    _: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    let sel = ctx.surface.selection();
    let mut ranges = vec![];

    if sel.ranges.len() > 1 {
        let first = sel.ranges[0].from();
        let last = sel.ranges[sel.ranges.len() - 1].to();
        ranges.push(SelectionRange::new(first, last));
    } else {
        let doc_len = ctx.surface.doc_len();
        let r = sel.main_range();
        let mut line = ctx.surface.line_at(r.from());
        let end_line = ctx.surface.line_at(r.to());
        let start_col = r.from() - line.from;
        let end_col = r.to() - end_line.from;

        while line.from < end_line.to {
            let anchor = (line.from + start_col).min(line.to);
            let head = (line.from + end_col).min(line.to);
            ranges.push(SelectionRange::new(anchor, head));

            if line.to >= doc_len {
                break;
            }

            line = ctx.surface.line_at(line.to + 1);
        }
    }

    if !ranges.is_empty() {
        ctx.surface.set_selection(Selection::new(ranges, 0));
    }

    CommandResult::Applied
}

fn change_case(ctx: &mut EmacsContext<'_>, args: &CommandArgs, _: Option<usize>) -> CommandResult {
    let CommandArgs::Case { upper, region } = *args else {
        return CommandResult::Applied;
    };

    if !region {
        ctx.clear_selection();
        let _ = ctx.run(Primitive::SelectGroupForward);
    }

    let sel = ctx.surface.selection();
    let texts = sel
        .ranges
        .iter()
        .map(|r| {
            let text = ctx.surface.slice_text(r.from(), r.to());

            if upper {
                text.to_uppercase()
            } else {
                text.to_lowercase()
            }
        })
        .collect();

    ctx.replace_each(texts);

    CommandResult::Applied
}

fn kill_word(ctx: &mut EmacsContext<'_>, args: &CommandArgs, _: Option<usize>) -> CommandResult {
    let primitive = match args {
        CommandArgs::Direction(WordDirection::Left) => Primitive::SelectGroupBackward,
        _ => Primitive::SelectGroupForward,
    };

    let sel = ctx.surface.selection();
    ctx.surface.set_selection(Selection::cursors(&sel.heads(), sel.main));
    let _ = ctx.run(primitive);

    let sel = ctx.surface.selection();
    {
        let mut ring = ctx.kill_ring();

        for r in sel.ranges.iter() {
            ring.add(ctx.surface.slice_text(r.from(), r.to()).as_str());
        }
    }

    ctx.replace_selection("");

    CommandResult::Applied
}

fn kill_line(ctx: &mut EmacsContext<'_>, _: &CommandArgs, _: Option<usize>) -> CommandResult {
    ctx.marks.push(None, false);
    ctx.clear_selection();

    let doc_len = ctx.surface.doc_len();
    let mut heads = ctx.surface.selection().heads();
    heads.sort_unstable();
    heads.dedup();

    let mut texts = vec![];
    let mut changes: Vec<Change> = vec![];

    let mut last_line = None;

    for from in heads {
        let line = ctx.surface.line_at(from);

        // Only the leftmost cursor on each line kills.
        if last_line == Some(line.from) {
            continue;
        }

        last_line = Some(line.from);

        let mut to = line.to;
        let mut text = ctx.surface.slice_text(from, to);

        // Take the line break too when only whitespace is left.
        if text.trim().is_empty() && to < doc_len {
            to += 1;
            text.push('\n');
        }

        texts.push(text);
        changes.push(Change::new(from, to, ""));
    }

    let text = texts.join("\n");

    {
        let mut ring = ctx.kill_ring();

        if ctx.state.last_command() == Some("killLine") {
            ring.append(&text);
        } else {
            ring.add(&text);
        }
    }

    ctx.state.set_last_command("killLine");
    ctx.replace(changes);

    CommandResult::Applied
}

fn kill_region(ctx: &mut EmacsContext<'_>, _: &CommandArgs, _: Option<usize>) -> CommandResult {
    let text = ctx.copy_text();
    ctx.kill_ring().add(&text);
    ctx.replace_selection("");
    ctx.marks.set(None);

    CommandResult::Applied
}

fn kill_ring_save(ctx: &mut EmacsContext<'_>, _: &CommandArgs, _: Option<usize>) -> CommandResult {
    let text = ctx.copy_text();
    ctx.kill_ring().add(&text);
    ctx.clear_selection();

    CommandResult::Applied
}

/// Paste the top of the kill ring, once any external clipboard text has been merged in.
pub(crate) fn apply_yank(ctx: &mut EmacsContext<'_>) -> CommandResult {
    let text = ctx.kill_ring().get(1);

    if text.is_empty() {
        // Nothing was pasted, so there's nothing for M-y to replace.
        ctx.state.clear_last_command();
        return CommandResult::Applied;
    }

    ctx.paste(&text);
    ctx.state.set_last_command("yank");

    CommandResult::Applied
}

fn yank(ctx: &mut EmacsContext<'_>, _: &CommandArgs, _: Option<usize>) -> CommandResult {
    let _ = ctx.kill_ring().reconcile_clipboard();

    apply_yank(ctx)
}

fn yank_rotate(ctx: &mut EmacsContext<'_>, _: &CommandArgs, _: Option<usize>) -> CommandResult {
    if ctx.state.last_command() != Some("yank") {
        return CommandResult::Applied;
    }

    let _ = ctx.run(Primitive::Undo);
    let _ = ctx.marks.drop_ring_top();

    let text = ctx.kill_ring().rotate();
    ctx.paste(&text);
    ctx.state.set_last_command("yank");

    CommandResult::Applied
}

fn keyboard_quit(ctx: &mut EmacsContext<'_>, _: &CommandArgs, _: Option<usize>) -> CommandResult {
    let sel = ctx.surface.selection();

    if sel.ranges.len() > 1 && !sel.is_empty() {
        ctx.surface.set_selection(Selection::cursors(&sel.heads(), sel.main));
    } else {
        let _ = ctx.run(Primitive::SimplifySelection);
    }

    ctx.marks.set(None);
    ctx.state.quit();

    CommandResult::Applied
}

fn unset_transient_mark(
    ctx: &mut EmacsContext<'_>,
    _: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    ctx.marks.set(None);

    CommandResult::NotApplied
}

fn focus_command_line(
    ctx: &mut EmacsContext<'_>,
    args: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    let text = match args {
        CommandArgs::Text(text) => text.as_str(),
        _ => "",
    };

    match ctx.surface.host() {
        Some(host) => host.show_command_line(text),
        None => warn!("no host available to show the command line"),
    }

    CommandResult::Applied
}

fn center_selection(
    ctx: &mut EmacsContext<'_>,
    _: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    let _ = ctx.run(Primitive::ScrollIntoView);

    CommandResult::Applied
}

fn recenter_top_bottom(
    ctx: &mut EmacsContext<'_>,
    _: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    let _ = ctx.run(Primitive::Recenter);

    CommandResult::Applied
}

fn navigate(ctx: &mut EmacsContext<'_>, id: &str) -> CommandResult {
    match ctx.surface.host() {
        Some(host) => {
            if !host.execute_command(id) {
                warn!(id, "host doesn't know this command");
            }
        },
        None => warn!(id, "no host available to navigate"),
    }

    CommandResult::Applied
}

fn navigate_backward(
    ctx: &mut EmacsContext<'_>,
    _: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    navigate(ctx, "app:go-back")
}

fn navigate_forward(
    ctx: &mut EmacsContext<'_>,
    _: &CommandArgs,
    _: Option<usize>,
) -> CommandResult {
    navigate(ctx, "app:go-forward")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::killring::KillRing;
    use crate::surface::RopeSurface;

    struct Harness {
        surface: RopeSurface,
        marks: MarkState,
        state: DispatchState,
        ring: SharedKillRing,
    }

    impl Harness {
        fn new(text: &str, cursors: &[usize]) -> Self {
            let mut surface = RopeSurface::new(text);
            surface.set_selection(Selection::cursors(cursors, 0));

            Harness {
                surface,
                marks: MarkState::new(),
                state: DispatchState::default(),
                ring: KillRing::default().shared(),
            }
        }

        fn run(&mut self, name: &str, args: CommandArgs, count: Option<usize>) -> CommandResult {
            let commands = CommandSet::default();
            let cmd = *commands.get(name).unwrap();
            let mut ctx =
                EmacsContext::new(&mut self.surface, &mut self.marks, &mut self.state, &self.ring);

            cmd.exec(&mut ctx, &args, count)
        }

        fn select(&mut self, ranges: &[(usize, usize)]) {
            let ranges = ranges.iter().map(|&(a, h)| SelectionRange::new(a, h)).collect();
            self.surface.set_selection(Selection::new(ranges, 0));
        }

        fn ring_top(&self) -> String {
            self.ring.read().unwrap().get(1)
        }
    }

    #[test]
    fn test_default_set() {
        let set = CommandSet::default();

        assert_eq!(set.len(), 22);
        assert!(set.get("setMark").unwrap().get_flags().contains(CommandFlags::HANDLES_COUNT));
        assert!(set.get("killLine").unwrap().preserves_last_command());
        assert!(set.get("killRingSave").unwrap().preserves_last_command());
        assert!(!set.get("killRegion").unwrap().preserves_last_command());
        assert!(!set.contains("gotoLine"));
    }

    #[test]
    fn test_set_mark_toggle() {
        let mut h = Harness::new("hello world", &[3]);

        h.run("setMark", CommandArgs::None, None);
        assert_eq!(h.marks.current(), Some(&Mark::new(vec![3])));
        assert_eq!(h.marks.ring(), &[Mark::new(vec![3])]);

        // Setting it again at the same place deactivates it.
        h.run("setMark", CommandArgs::None, None);
        assert_eq!(h.marks.current(), None);
        assert_eq!(h.marks.ring(), &[Mark::new(vec![3])]);
    }

    #[test]
    fn test_set_mark_with_selection() {
        let mut h = Harness::new("hello world", &[0]);
        h.select(&[(0, 5)]);

        h.run("setMark", CommandArgs::None, None);
        assert_eq!(h.marks.current(), None);
        assert_eq!(h.surface.selection(), Selection::cursors(&[5], 0));
    }

    #[test]
    fn test_set_mark_count_pops() {
        let mut h = Harness::new("hello world", &[8]);
        h.marks.push(Some(Mark::new(vec![1])), false);
        h.marks.push(Some(Mark::new(vec![4])), false);

        h.run("setMark", CommandArgs::None, Some(4));
        assert_eq!(h.surface.selection().heads(), vec![4]);
        assert_eq!(h.marks.ring(), &[Mark::new(vec![8]), Mark::new(vec![1])]);
    }

    #[test]
    fn test_exchange_inverts() {
        let mut h = Harness::new("hello world", &[0]);
        h.select(&[(2, 7)]);

        h.run("exchangePointAndMark", CommandArgs::None, None);
        assert_eq!(h.surface.selection().ranges, vec![SelectionRange::new(7, 2)]);
    }

    #[test]
    fn test_exchange_to_mark() {
        let mut h = Harness::new("hello world", &[9]);
        h.marks.push(Some(Mark::new(vec![2])), false);

        h.run("exchangePointAndMark", CommandArgs::None, None);
        assert_eq!(h.surface.selection().ranges, vec![SelectionRange::new(9, 2)]);

        h.surface.set_selection(Selection::cursors(&[9], 0));
        h.run("exchangePointAndMark", CommandArgs::None, Some(4));
        assert_eq!(h.surface.selection().heads(), vec![2]);
        assert_eq!(h.marks.ring(), &[Mark::new(vec![9])]);
    }

    #[test]
    fn test_go_or_select() {
        let mut h = Harness::new("hello world", &[0]);
        let motion = CommandArgs::Motion {
            go: Primitive::CursorCharForward,
            select: Primitive::SelectCharForward,
        };

        h.run("goOrSelect", motion.clone(), None);
        assert_eq!(h.surface.selection(), Selection::cursors(&[1], 0));

        h.marks.set(Some(Mark::new(vec![1])));
        h.run("goOrSelect", motion.clone(), None);
        h.run("goOrSelect", motion, None);
        assert_eq!(h.surface.selection().ranges, vec![SelectionRange::new(1, 3)]);
    }

    #[test]
    fn test_kill_region_and_yank() {
        let mut h = Harness::new("one\ntwo\nthree", &[0]);
        h.select(&[(2, 9)]);
        h.marks.set(Some(Mark::new(vec![2])));

        h.run("killRegion", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "onhree");
        assert_eq!(h.ring_top(), "e\ntwo\nt");
        assert_eq!(h.marks.current(), None);

        h.run("yank", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "one\ntwo\nthree");
        assert_eq!(h.surface.selection(), Selection::cursors(&[9], 0));
        assert_eq!(h.state.last_command(), Some("yank"));

        // Nothing new was copied elsewhere, so the ring doesn't grow.
        assert_eq!(h.ring.read().unwrap().len(), 1);
    }

    #[test]
    fn test_kill_ring_save() {
        let mut h = Harness::new("abc def", &[0]);
        h.select(&[(0, 3)]);

        h.run("killRingSave", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "abc def");
        assert_eq!(h.ring_top(), "abc");
        assert_eq!(h.surface.selection(), Selection::cursors(&[3], 0));
    }

    #[test]
    fn test_kill_line() {
        let mut h = Harness::new("abc\ndef", &[1]);

        h.run("killLine", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "a\ndef");
        assert_eq!(h.ring_top(), "bc");

        // The rest of the line is now empty, so the line break goes.
        h.run("killLine", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "adef");
        assert_eq!(h.ring_top(), "bc\n");

        h.run("killLine", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "a");
        assert_eq!(h.ring_top(), "bc\ndef");
        assert_eq!(h.ring.read().unwrap().len(), 1);
    }

    #[test]
    fn test_kill_line_last_line() {
        let mut h = Harness::new("abc\ndef", &[5]);

        h.run("killLine", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "abc\nd");
        assert_eq!(h.ring_top(), "ef");

        // Nothing left to kill at the end of the document.
        h.run("killLine", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "abc\nd");
        assert_eq!(h.ring_top(), "ef");
    }

    #[test]
    fn test_kill_line_multiple_cursors() {
        let mut h = Harness::new("abc\ndef\nghi", &[1, 5]);

        h.run("killLine", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "a\nd\nghi");
        assert_eq!(h.ring_top(), "bc\nef");
        assert_eq!(h.surface.selection().heads(), vec![1, 3]);

        // Yanking the two lines gives each cursor its own.
        h.run("yank", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "abc\ndef\nghi");
    }

    #[test]
    fn test_kill_line_same_line() {
        let mut h = Harness::new("abcdef\nxyz", &[1, 3]);

        h.run("killLine", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "a\nxyz");
        assert_eq!(h.ring_top(), "bcdef");
    }

    #[test]
    fn test_yank_empty_ring() {
        let mut h = Harness::new("abc", &[3]);
        h.surface.replace_ranges(vec![Change::new(3, 3, "def")]);

        h.run("yank", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "abcdef");
        assert_eq!(h.state.last_command(), None);

        // M-y has no yank to replace, so the earlier edit stays.
        h.run("yankRotate", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "abcdef");
    }

    #[test]
    fn test_kill_word() {
        let mut h = Harness::new("foo bar baz", &[4]);

        h.run("killWord", CommandArgs::Direction(WordDirection::Right), None);
        assert_eq!(h.surface.text(), "foo  baz");
        assert_eq!(h.ring_top(), "bar");

        h.run("killWord", CommandArgs::Direction(WordDirection::Left), None);
        assert_eq!(h.surface.text(), " baz");
        assert_eq!(h.ring_top(), "foo ");
    }

    #[test]
    fn test_yank_rotate() {
        let mut h = Harness::new("", &[0]);
        {
            let mut ring = h.ring.write().unwrap();
            ring.add("first");
            ring.add("second");
        }

        // Rotating only works right after a yank.
        h.run("yankRotate", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "");

        h.run("yank", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "second");

        h.run("yankRotate", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "first");
        assert_eq!(h.state.last_command(), Some("yank"));
    }

    #[test]
    fn test_yank_external_clipboard() {
        let clipboard = crate::clipboard::MemoryClipboard::new();
        let mut h = Harness::new("x", &[1]);
        h.ring = KillRing::new(clipboard.clone()).shared();
        h.ring.write().unwrap().add("ours");

        let mut external = clipboard.clone();
        crate::clipboard::Clipboard::write_text(&mut external, "theirs\r\n");

        h.run("yank", CommandArgs::None, None);
        assert_eq!(h.surface.text(), "xtheirs\n");
        assert_eq!(h.ring.read().unwrap().len(), 2);
    }

    #[test]
    fn test_change_case() {
        let mut h = Harness::new("hello world", &[0]);

        h.run("changeCase", CommandArgs::Case { upper: true, region: false }, None);
        assert_eq!(h.surface.text(), "HELLO world");
        assert_eq!(h.surface.selection(), Selection::cursors(&[5], 0));

        h.select(&[(0, 11)]);
        h.run("changeCase", CommandArgs::Case { upper: false, region: true }, None);
        assert_eq!(h.surface.text(), "hello world");
    }

    #[test]
    fn test_select_paragraph() {
        let mut h = Harness::new("a\nb\n\nc\nd", &[2]);

        h.run("selectParagraph", CommandArgs::None, None);
        assert_eq!(h.surface.selection().ranges, vec![SelectionRange::new(0, 3)]);

        h.surface.set_selection(Selection::cursors(&[4], 0));
        h.run("selectParagraph", CommandArgs::None, None);
        assert_eq!(h.surface.selection().ranges, vec![SelectionRange::new(4, 8)]);
    }

    #[test]
    fn test_select_rectangle() {
        let mut h = Harness::new("abcd\nefgh\nijkl", &[0]);
        h.select(&[(1, 13)]);

        h.run("selectRectangularRegion", CommandArgs::None, None);
        assert_eq!(h.surface.selection().ranges, vec![
            SelectionRange::new(1, 3),
            SelectionRange::new(6, 8),
            SelectionRange::new(11, 13),
        ]);

        // Running it again joins the ranges back up.
        h.run("selectRectangularRegion", CommandArgs::None, None);
        assert_eq!(h.surface.selection().ranges, vec![SelectionRange::new(1, 13)]);
    }

    #[test]
    fn test_mark_word() {
        let mut h = Harness::new("foo bar", &[0]);

        h.run("markWord", CommandArgs::None, None);
        assert_eq!(h.surface.selection().ranges, vec![SelectionRange::new(3, 0)]);
        assert_eq!(h.marks.current(), Some(&Mark::new(vec![3])));
    }

    #[test]
    fn test_keyboard_quit() {
        let mut h = Harness::new("abc def", &[0]);
        h.select(&[(0, 2), (4, 6)]);
        h.marks.set(Some(Mark::new(vec![0, 4])));

        h.run("keyboardQuit", CommandArgs::None, None);
        assert_eq!(h.surface.selection(), Selection::cursors(&[2, 6], 0));
        assert_eq!(h.marks.current(), None);

        h.run("keyboardQuit", CommandArgs::None, None);
        assert_eq!(h.surface.selection(), Selection::cursors(&[2], 0));
    }

    #[test]
    fn test_unset_transient_mark() {
        let mut h = Harness::new("abc", &[0]);
        h.marks.set(Some(Mark::new(vec![1])));

        let res = h.run("unsetTransientMark", CommandArgs::None, None);
        assert_eq!(res, CommandResult::NotApplied);
        assert_eq!(h.marks.current(), None);
    }

    #[test]
    fn test_edits_deactivate_mark() {
        let mut h = Harness::new("abc def", &[4]);
        h.marks.push(Some(Mark::new(vec![6])), false);
        h.marks.set(Some(Mark::new(vec![4])));

        h.run("insertString", CommandArgs::Text("xy".into()), None);
        assert_eq!(h.surface.text(), "abc xydef");
        assert_eq!(h.marks.current(), None);
        assert_eq!(h.marks.ring(), &[Mark::new(vec![8])]);
    }
}

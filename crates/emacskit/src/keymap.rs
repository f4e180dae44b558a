//! # Keymaps
//!
//! ## Overview
//!
//! A [Keymap] combines an immutable [ChordTable] of [Binding] values with the [CommandSet] that
//! named bindings refer to. It's built once at startup, usually through [Keymap::emacs], and then
//! shared between every editing surface.
//!
//! Bindings can refer to their targets in three ways:
//!
//! * [Binding::Primitive] runs a host primitive directly
//! * [Binding::Named] runs a command from the [CommandSet] by name
//! * [Binding::Inline] runs a named command with static arguments
//!
//! ## Example
//!
//! ```
//! use emacskit::commands::CommandSet;
//! use emacskit::config::EmacsConfig;
//! use emacskit::keymap::{Binding, Keymap};
//! use emacskit::surface::Primitive;
//!
//! let bindings = vec![
//!     ("C-x h", Binding::Primitive(Primitive::SelectAll)),
//!     ("C-y", Binding::Named("yank".into())),
//! ];
//!
//! let keymap = Keymap::new(bindings, CommandSet::default(), &EmacsConfig::default()).unwrap();
//! assert_eq!(keymap.table().len(), 3);
//! ```
use keychords::ChordTable;

use crate::commands::{Command, CommandArgs, CommandFlags, CommandSet, WordDirection};
use crate::config::EmacsConfig;
use crate::errors::EmacsError;
use crate::surface::Primitive;

/// What a chord sequence is bound to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Binding {
    /// Run a host primitive.
    Primitive(Primitive),

    /// Run a named command.
    Named(String),

    /// Run a named command with static arguments.
    Inline {
        /// The command's name.
        command: String,

        /// Arguments passed to the command.
        args: CommandArgs,
    },
}

impl Binding {
    fn command_name(&self) -> Option<&str> {
        match self {
            Binding::Primitive(_) => None,
            Binding::Named(name) => Some(name),
            Binding::Inline { command, .. } => Some(command),
        }
    }
}

/// A [Binding] after its command name has been looked up.
#[derive(Clone, Debug)]
pub enum Action {
    /// Run a host primitive.
    Primitive(Primitive),

    /// Run a command.
    Command {
        /// The name the command was registered under.
        name: String,

        /// The command itself.
        command: Command,
    },
}

impl Action {
    /// Flags that affect how this action is dispatched.
    pub fn flags(&self) -> CommandFlags {
        match self {
            Action::Primitive(p) if p.breaks_mark() => CommandFlags::BREAKS_MARK,
            Action::Primitive(_) => CommandFlags::empty(),
            Action::Command { command, .. } => command.get_flags(),
        }
    }
}

/// An immutable map from chord sequences to bindings, along with the commands they can name.
#[derive(Clone, Debug)]
pub struct Keymap {
    table: ChordTable<Binding>,
    commands: CommandSet,
    universal_count: usize,
}

fn is_malformed(name: &str) -> bool {
    name.is_empty() || name.chars().any(char::is_whitespace)
}

impl Keymap {
    /// Build a keymap from a list of bindings, followed by any bindings in the configuration.
    ///
    /// Configured bindings must name commands that exist in `commands`. Other named bindings are
    /// only looked up when they're used, and do nothing if the command is missing.
    pub fn new<S: AsRef<str>>(
        bindings: Vec<(S, Binding)>,
        commands: CommandSet,
        config: &EmacsConfig,
    ) -> Result<Self, EmacsError> {
        let mut all: Vec<(String, Binding)> = Vec::with_capacity(bindings.len());

        for (spec, binding) in bindings {
            let spec = spec.as_ref();

            if binding.command_name().is_some_and(is_malformed) {
                return Err(EmacsError::MalformedBinding(spec.to_string()));
            }

            all.push((spec.to_string(), binding));
        }

        for bc in config.bindings.iter() {
            if is_malformed(&bc.command) {
                return Err(EmacsError::MalformedBinding(bc.keys.clone()));
            }

            if !commands.contains(&bc.command) {
                return Err(EmacsError::UnknownCommand(bc.command.clone()));
            }

            all.push((bc.keys.clone(), Binding::Named(bc.command.clone())));
        }

        let table = ChordTable::from_bindings(all)?;
        let universal_count = config.universal_argument.max(1);

        Ok(Keymap { table, commands, universal_count })
    }

    /// Build the default Emacs keymap, with any configured bindings.
    pub fn emacs(config: &EmacsConfig) -> Result<Self, EmacsError> {
        Keymap::new(default_emacs_keys(), CommandSet::default(), config)
    }

    /// The chord table.
    pub fn table(&self) -> &ChordTable<Binding> {
        &self.table
    }

    /// The commands that bindings can name.
    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// The repeat count set by the universal argument.
    pub fn universal_count(&self) -> usize {
        self.universal_count
    }

    /// Look up a command by name.
    pub fn command(&self, name: &str) -> Option<Action> {
        let command = *self.commands.get(name)?;

        Some(Action::Command { name: name.to_string(), command })
    }

    /// Resolve a binding into something that can be run.
    pub fn resolve(&self, binding: &Binding) -> Option<(Action, CommandArgs)> {
        match binding {
            Binding::Primitive(p) => Some((Action::Primitive(*p), CommandArgs::None)),
            Binding::Named(name) => Some((self.command(name)?, CommandArgs::None)),
            Binding::Inline { command, args } => Some((self.command(command)?, args.clone())),
        }
    }
}

impl Default for Keymap {
    /// A keymap with the default commands, but no bindings.
    fn default() -> Self {
        Keymap {
            table: ChordTable::default(),
            commands: CommandSet::default(),
            universal_count: EmacsConfig::default().universal_argument,
        }
    }
}

fn go(go: Primitive, select: Primitive) -> Binding {
    let args = CommandArgs::Motion { go, select };

    Binding::Inline { command: "goOrSelect".into(), args }
}

fn inline(command: &str, args: CommandArgs) -> Binding {
    Binding::Inline { command: command.into(), args }
}

fn named(command: &str) -> Binding {
    Binding::Named(command.into())
}

fn case(upper: bool, region: bool) -> Binding {
    inline("changeCase", CommandArgs::Case { upper, region })
}

/// The default Emacs key bindings.
pub fn default_emacs_keys() -> Vec<(&'static str, Binding)> {
    use Primitive as P;

    vec![
        // Movement
        ("Up|C-p", go(P::CursorLineUp, P::SelectLineUp)),
        ("Down|C-n", go(P::CursorLineDown, P::SelectLineDown)),
        ("Left|C-b", go(P::CursorCharBackward, P::SelectCharBackward)),
        ("Right|C-f", go(P::CursorCharForward, P::SelectCharForward)),
        ("C-Left|M-b", go(P::CursorGroupLeft, P::SelectGroupLeft)),
        ("C-Right|M-f", go(P::CursorGroupRight, P::SelectGroupRight)),
        ("Home|C-a", go(P::CursorLineStart, P::SelectLineStart)),
        ("End|C-e", go(P::CursorLineEnd, P::SelectLineEnd)),
        ("C-Home|S-M-,", go(P::CursorDocStart, P::SelectDocStart)),
        ("C-End|S-M-.", go(P::CursorDocEnd, P::SelectDocEnd)),
        // Selection
        ("S-Up|S-C-p", Binding::Primitive(P::SelectLineUp)),
        ("S-Down|S-C-n", Binding::Primitive(P::SelectLineDown)),
        ("S-Left|S-C-b", Binding::Primitive(P::SelectCharBackward)),
        ("S-Right|S-C-f", Binding::Primitive(P::SelectCharForward)),
        ("S-C-Left|S-M-b", Binding::Primitive(P::SelectGroupBackward)),
        ("S-C-Right|S-M-f", Binding::Primitive(P::SelectGroupForward)),
        ("S-Home|S-C-a", Binding::Primitive(P::SelectLineStart)),
        ("S-End|S-C-e", Binding::Primitive(P::SelectLineEnd)),
        ("S-C-Home", Binding::Primitive(P::SelectDocStart)),
        ("S-C-End", Binding::Primitive(P::SelectDocEnd)),
        ("C-x C-p|C-x h", Binding::Primitive(P::SelectAll)),
        // Paging
        ("PageDown|C-v|C-Down", go(P::CursorPageDown, P::SelectPageDown)),
        ("PageUp|M-v|C-Up", go(P::CursorPageUp, P::SelectPageUp)),
        ("S-C-Down", Binding::Primitive(P::SelectPageDown)),
        ("S-C-Up", Binding::Primitive(P::SelectPageUp)),
        // Search
        ("C-s", Binding::Primitive(P::OpenSearchPanel)),
        ("C-r", Binding::Primitive(P::OpenSearchPanel)),
        ("M-C-s", Binding::Primitive(P::FindNext)),
        ("M-C-r", Binding::Primitive(P::FindPrevious)),
        ("S-M-5", Binding::Primitive(P::Replace)),
        // Basic editing
        ("Backspace|C-h", Binding::Primitive(P::DeleteCharBackward)),
        ("Delete|C-d", Binding::Primitive(P::DeleteCharForward)),
        ("Return|C-m", inline("insertString", CommandArgs::Text("\n".into()))),
        ("M-d|C-Delete", inline("killWord", CommandArgs::Direction(WordDirection::Right))),
        (
            "C-Backspace|M-Backspace|M-Delete",
            inline("killWord", CommandArgs::Direction(WordDirection::Left)),
        ),
        ("C-k", named("killLine")),
        ("M-h", named("selectParagraph")),
        ("M-@|M-S-2", named("markWord")),
        // Killing and yanking
        ("C-y|S-Delete", named("yank")),
        ("M-y", named("yankRotate")),
        ("C-g", named("keyboardQuit")),
        ("C-w|C-S-w", named("killRegion")),
        ("M-w", named("killRingSave")),
        // Marks
        ("C-Space", named("setMark")),
        ("C-x C-x", named("exchangePointAndMark")),
        // Case
        ("M-u", case(true, false)),
        ("M-l", case(false, false)),
        ("C-x C-u", case(true, true)),
        ("C-x C-l", case(true, true)),
        // Completion, comments and history
        ("M-/", Binding::Primitive(P::StartCompletion)),
        ("C-u", named("universalArgument")),
        ("M-;", Binding::Primitive(P::ToggleComment)),
        ("C-/|C-x u|S-C--|C-z", Binding::Primitive(P::Undo)),
        ("S-C-/|S-C-x u|C--|S-C-z", Binding::Primitive(P::Redo)),
        // Rectangles, the command line and navigation
        ("C-x r", named("selectRectangularRegion")),
        ("M-x", inline("focusCommandLine", CommandArgs::Text("M-x ".into()))),
        ("C-c b", named("navigateBackward")),
        ("C-c f", named("navigateForward")),
        ("Esc", named("unsetTransientMark")),
    ]
}

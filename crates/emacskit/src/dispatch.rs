//! # Chord dispatch
//!
//! ## Overview
//!
//! Each editing surface owns a [DispatchState], which folds canonicalized chords into a pending
//! chord chain and a pending repeat count, and resolves completed chains against a
//! [Keymap](crate::keymap::Keymap).
//!
//! Feeding a chord produces an [Outcome]:
//!
//! * [Outcome::NoMatch] when nothing is bound, which should be left to the host
//! * [Outcome::Continuation] when more input is expected (a prefix key, a repeat count digit, or
//!   `C-u`)
//! * [Outcome::Execute] with the resolved action, its arguments and the repeat count
//!
//! Repeat counts are entered either with `C-u`, which defaults to 4 until a digit is typed, or by
//! holding control while typing digits. While a count is pending, printable keys typed outside of
//! a chord chain are inserted that many times.
use keychords::{ChordEntry, KeyData, Modifiers};
use tracing::debug;

use crate::commands::{CommandArgs, CommandFlags};
use crate::keymap::{Action, Keymap};
use crate::mark::MarkState;

/// A repeat count that's being entered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PendingCount {
    /// Set by the universal argument. The next digit replaces it.
    Universal(usize),

    /// Typed digits. The next digit is appended.
    Typed(usize),
}

impl PendingCount {
    /// How many times to repeat.
    pub fn value(&self) -> usize {
        match self {
            PendingCount::Universal(n) | PendingCount::Typed(n) => (*n).max(1),
        }
    }

    fn push_digit(this: Option<Self>, digit: usize) -> Self {
        let prev = match this {
            Some(PendingCount::Typed(n)) => n,
            Some(PendingCount::Universal(_)) | None => 0,
        };

        PendingCount::Typed(prev.saturating_mul(10).saturating_add(digit))
    }
}

/// A resolved key binding, ready to run.
#[derive(Clone, Debug)]
pub struct Execution {
    /// What to run.
    pub action: Action,

    /// Static arguments from the binding.
    pub args: CommandArgs,

    /// How many times to run it.
    pub count: usize,
}

/// The result of feeding a chord to a [DispatchState].
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Nothing is bound to the chord.
    NoMatch,

    /// More input is expected.
    Continuation,

    /// Run a bound action.
    Execute(Execution),
}

/// Pending chord chain, repeat count and last command for a single editing surface.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DispatchState {
    chain: String,
    count: Option<PendingCount>,
    last_command: Option<String>,
}

impl DispatchState {
    /// Create an empty state.
    pub fn new() -> Self {
        DispatchState::default()
    }

    /// The chords typed so far towards a multi-chord binding.
    pub fn pending_chain(&self) -> &str {
        self.chain.as_str()
    }

    /// The repeat count being entered.
    pub fn pending_count(&self) -> Option<PendingCount> {
        self.count
    }

    /// The last command that recorded itself.
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    /// Record the last command.
    pub fn set_last_command(&mut self, name: &str) {
        self.last_command = Some(name.to_string());
    }

    /// Forget the last command.
    pub fn clear_last_command(&mut self) {
        self.last_command = None;
    }

    /// Forget any pending chain and count.
    pub fn quit(&mut self) {
        self.chain.clear();
        self.count = None;
    }

    fn take_count(&mut self) -> usize {
        self.count.take().map(|c| c.value()).unwrap_or(1)
    }

    /// Fold a canonicalized key into the state.
    pub fn feed(&mut self, key: &KeyData, keymap: &Keymap, marks: &mut MarkState) -> Outcome {
        if key.is_empty() {
            return Outcome::NoMatch;
        }

        let digit = key.digit().map(|d| d as usize);

        if key.is_printable() {
            // Plain keys break the mark, whether they self-insert or finish a chain.
            marks.push(None, false);
        }

        if self.chain.is_empty() && key.is_printable() {
            if let (Some(count), None) = (self.count, digit) {
                let Some(action) = keymap.command("insertString") else {
                    return Outcome::NoMatch;
                };

                self.count = None;
                self.last_command = None;

                let text = key.text().repeat(count.value());
                debug!(count = count.value(), "inserting repeated text");

                return Outcome::Execute(Execution {
                    action,
                    args: CommandArgs::Text(text),
                    count: 1,
                });
            }
        }

        if key.modifiers() == Modifiers::CONTROL || self.count.is_some() {
            if let Some(digit) = digit {
                self.count = Some(PendingCount::push_digit(self.count, digit));

                return Outcome::Continuation;
            }
        }

        let chord = key.chord().to_string();
        let lookup = if self.chain.is_empty() {
            chord
        } else {
            format!("{} {}", self.chain, chord)
        };

        let binding = match keymap.table().get(&lookup) {
            None => {
                debug!(chain = %lookup, "no binding");
                self.chain.clear();
                return Outcome::NoMatch;
            },
            Some(ChordEntry::Prefix) => {
                debug!(chain = %lookup, "waiting for more chords");
                self.chain = lookup;
                return Outcome::Continuation;
            },
            Some(ChordEntry::Bound(binding)) => binding,
        };

        self.chain.clear();

        let Some((action, args)) = keymap.resolve(binding) else {
            debug!(chain = %lookup, "binding names an unknown command");
            return Outcome::NoMatch;
        };

        let flags = action.flags();

        if flags.contains(CommandFlags::UNIVERSAL_ARGUMENT) {
            self.count = Some(PendingCount::Universal(keymap.universal_count()));
            return Outcome::Continuation;
        }

        if flags.contains(CommandFlags::BREAKS_MARK) {
            marks.push(None, false);
        }

        if !flags.intersects(CommandFlags::READ_ONLY | CommandFlags::KEEP_LAST_COMMAND) {
            self.last_command = None;
        }

        let count = self.take_count();
        debug!(chain = %lookup, count, "resolved binding");

        Outcome::Execute(Execution { action, args, count })
    }
}

//! # Key handlers
//!
//! ## Overview
//!
//! An [EmacsHandler] holds the per-surface state (pending chords, repeat count, last command and
//! marks), and runs keys against a shared [Keymap] and [SharedKillRing]. Hosts usually keep one
//! handler for each editing surface in a [HandlerRegistry], and forward every key press to
//! [EmacsHandler::handle_key].
//!
//! When [KeyResult::Unhandled] is returned, the host should carry on with its default key
//! processing, such as inserting the typed character.
//!
//! ## Example
//!
//! ```
//! use emacskit::handler::{EmacsHandler, KeyResult};
//! use emacskit::keychords::RawKey;
//! use emacskit::surface::RopeSurface;
//!
//! let mut handler = EmacsHandler::default();
//! let mut surface = RopeSurface::new("hello\nworld\n");
//!
//! let ck = RawKey::new("KeyK", "k").ctrl();
//! assert_eq!(handler.handle_key(&mut surface, &ck), KeyResult::Handled);
//! assert_eq!(surface.text(), "\nworld\n");
//! ```
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use keychords::{canonicalize, KeyData, RawKey};
use tracing::trace;

use crate::commands::{self, CommandArgs, CommandFlags, CommandResult, EmacsContext};
use crate::config::EmacsConfig;
use crate::dispatch::{DispatchState, Execution, Outcome};
use crate::errors::EmacsError;
use crate::keymap::{Action, Binding, Keymap};
use crate::killring::{KillRing, SharedKillRing};
use crate::mark::MarkState;
use crate::surface::{ChangeSet, Surface};

/// Whether a key was consumed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyResult {
    /// The key was consumed, and the host shouldn't process it further.
    Handled,

    /// The host should handle the key normally.
    Unhandled,
}

impl From<CommandResult> for KeyResult {
    fn from(res: CommandResult) -> Self {
        match res {
            CommandResult::Applied => KeyResult::Handled,
            CommandResult::NotApplied => KeyResult::Unhandled,
        }
    }
}

/// Emacs keybinding state for a single editing surface.
#[derive(Debug)]
pub struct EmacsHandler {
    keymap: Arc<Keymap>,
    kill_ring: SharedKillRing,
    state: DispatchState,
    marks: MarkState,
}

impl EmacsHandler {
    /// Create a handler that uses a shared keymap and kill ring.
    pub fn new(keymap: Arc<Keymap>, kill_ring: SharedKillRing) -> Self {
        EmacsHandler {
            keymap,
            kill_ring,
            state: DispatchState::new(),
            marks: MarkState::new(),
        }
    }

    /// The surface's dispatch state.
    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// The surface's marks.
    pub fn marks(&self) -> &MarkState {
        &self.marks
    }

    /// The keymap used by this handler.
    pub fn keymap(&self) -> &Arc<Keymap> {
        &self.keymap
    }

    /// The kill ring used by this handler.
    pub fn kill_ring(&self) -> &SharedKillRing {
        &self.kill_ring
    }

    /// The bindings that can complete the chord chain typed so far, such as everything after
    /// `C-x`. Hosts can use this to show a hint while a prefix key is pending.
    pub fn pending_continuations(&self) -> Vec<(&str, &Binding)> {
        let chain = self.state.pending_chain();

        if chain.is_empty() {
            return vec![];
        }

        self.keymap.table().continuations(chain)
    }

    fn context<'a>(&'a mut self, surface: &'a mut dyn Surface) -> EmacsContext<'a> {
        EmacsContext::new(surface, &mut self.marks, &mut self.state, &self.kill_ring)
    }

    /// Handle a physical key press.
    pub fn handle_key(&mut self, surface: &mut dyn Surface, key: &RawKey) -> KeyResult {
        let key = canonicalize(key);
        trace!(chord = %key.chord(), "key pressed");

        self.handle_key_data(surface, &key)
    }

    /// Handle a key that has already been canonicalized.
    pub fn handle_key_data(&mut self, surface: &mut dyn Surface, key: &KeyData) -> KeyResult {
        if surface.is_composing() {
            return KeyResult::Unhandled;
        }

        // Catch up with any edits made since the last key.
        self.context(surface).sync_marks();

        let outcome = self.state.feed(key, &self.keymap, &mut self.marks);

        if matches!(key.key(), "Up" | "Down") && surface.completion_active() {
            // Leave the arrows to the completion popup.
            return KeyResult::Unhandled;
        }

        match outcome {
            Outcome::NoMatch => KeyResult::Unhandled,
            Outcome::Continuation => KeyResult::Handled,
            Outcome::Execute(exec) => self.execute(surface, exec),
        }
    }

    fn execute(&mut self, surface: &mut dyn Surface, exec: Execution) -> KeyResult {
        let Execution { action, args, count } = exec;
        let count = count.max(1);
        let mut ctx = self.context(surface);

        let res = match action {
            Action::Primitive(primitive) => {
                for _ in 0..count {
                    let _ = ctx.run(primitive);
                }

                KeyResult::Handled
            },
            Action::Command { command, .. }
                if count > 1 && command.get_flags().contains(CommandFlags::HANDLES_COUNT) =>
            {
                command.exec(&mut ctx, &args, Some(count)).into()
            },
            Action::Command { command, .. } => {
                let mut res = KeyResult::Handled;

                for _ in 0..count {
                    res = command.exec(&mut ctx, &args, None).into();

                    if res == KeyResult::Unhandled {
                        break;
                    }
                }

                res
            },
        };

        ctx.sync_marks();

        return res;
    }

    /// Run a named command directly, as if its key had been pressed once.
    pub fn run_command(
        &mut self,
        surface: &mut dyn Surface,
        name: &str,
        args: CommandArgs,
    ) -> Result<KeyResult, EmacsError> {
        let Some(Action::Command { command, .. }) = self.keymap.command(name) else {
            return Err(EmacsError::UnknownCommand(name.to_string()));
        };

        let flags = command.get_flags();

        if flags.contains(CommandFlags::BREAKS_MARK) {
            self.marks.push(None, false);
        }

        if !command.preserves_last_command() {
            self.state.clear_last_command();
        }

        let mut ctx = self.context(surface);
        ctx.sync_marks();

        let res = command.exec(&mut ctx, &args, None).into();
        ctx.sync_marks();

        Ok(res)
    }

    /// Yank, using clipboard text that the host has already read.
    ///
    /// This is for hosts that can only read the clipboard asynchronously: they read it first,
    /// and then call this instead of running the `yank` command.
    pub fn yank_text(&mut self, surface: &mut dyn Surface, clipboard_text: &str) -> KeyResult {
        let mut ctx = self.context(surface);
        ctx.sync_marks();

        let _ = ctx.kill_ring().merge_clipboard_text(clipboard_text);
        let res = commands::apply_yank(&mut ctx).into();
        ctx.sync_marks();

        return res;
    }

    /// Tell the handler about a document change made outside of it.
    pub fn on_doc_changed(&mut self, changes: &ChangeSet) {
        if !changes.is_empty() {
            self.marks.on_edit(changes);
        }
    }

    /// Tell the handler that the user clicked in the surface.
    pub fn on_mouse_down(&mut self) {
        self.marks.set(None);
    }
}

impl Default for EmacsHandler {
    fn default() -> Self {
        let keymap = match Keymap::emacs(&EmacsConfig::default()) {
            Ok(keymap) => keymap,
            Err(e) => {
                tracing::error!("default keymap failed to build: {e}");
                Keymap::default()
            },
        };

        EmacsHandler::new(Arc::new(keymap), KillRing::default().shared())
    }
}

/// A set of [EmacsHandler] values, one per editing surface, that share a keymap and kill ring.
#[derive(Debug)]
pub struct HandlerRegistry<Id: Eq + Hash> {
    keymap: Arc<Keymap>,
    kill_ring: SharedKillRing,
    handlers: HashMap<Id, EmacsHandler>,
}

impl<Id: Eq + Hash> HandlerRegistry<Id> {
    /// Create a registry.
    pub fn new(keymap: Arc<Keymap>, kill_ring: SharedKillRing) -> Self {
        HandlerRegistry { keymap, kill_ring, handlers: HashMap::new() }
    }

    /// Create a registry using the default Emacs keymap and a configuration.
    pub fn from_config(config: &EmacsConfig) -> Result<Self, EmacsError> {
        let keymap = Arc::new(Keymap::emacs(config)?);
        let kill_ring = KillRing::default().with_capacity(config.kill_ring_capacity).shared();

        Ok(HandlerRegistry::new(keymap, kill_ring))
    }

    /// Get the handler for a surface, creating it if needed.
    pub fn handler(&mut self, id: Id) -> &mut EmacsHandler {
        let keymap = &self.keymap;
        let kill_ring = &self.kill_ring;

        self.handlers
            .entry(id)
            .or_insert_with(|| EmacsHandler::new(keymap.clone(), kill_ring.clone()))
    }

    /// Get the handler for a surface, if it exists.
    pub fn get(&self, id: &Id) -> Option<&EmacsHandler> {
        self.handlers.get(id)
    }

    /// Forget a surface's handler.
    pub fn remove(&mut self, id: &Id) -> Option<EmacsHandler> {
        self.handlers.remove(id)
    }

    /// Number of surfaces with a handler.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// The shared keymap.
    pub fn keymap(&self) -> &Arc<Keymap> {
        &self.keymap
    }

    /// The shared kill ring.
    pub fn kill_ring(&self) -> &SharedKillRing {
        &self.kill_ring
    }
}

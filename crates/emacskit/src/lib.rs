//! # emacskit
//!
//! ## Overview
//!
//! This crate adds Emacs-style keybindings to text editing surfaces that don't natively support
//! them. It provides:
//!
//! * chord dispatch, with prefix keys like `C-x` and repeat counts entered through `C-u` or
//!   control-digits, in the [dispatch] module
//! * a transient mark and mark ring for each surface, in the [mark] module
//! * a kill ring shared between every surface and mirrored to the system clipboard, in the
//!   [killring] module
//! * the usual editing commands (`killLine`, `yank`, `exchangePointAndMark`, and so on) in the
//!   [commands] module
//!
//! Host applications implement [surface::Surface] for their editing widget (or use the provided
//! [surface::RopeSurface]), and then forward key presses to an [EmacsHandler]. In the terminal,
//! [key::TerminalKey] converts [crossterm] key events into the physical keys that handlers expect.
//!
//! ## Example
//!
//! ```
//! use emacskit::handler::KeyResult;
//! use emacskit::keychords::RawKey;
//! use emacskit::surface::RopeSurface;
//! use emacskit::{EmacsConfig, HandlerRegistry};
//!
//! let mut registry = HandlerRegistry::from_config(&EmacsConfig::default()).unwrap();
//! let mut left = RopeSurface::new("copied text");
//! let mut right = RopeSurface::new("");
//!
//! // C-x h selects everything, and M-w copies it onto the shared kill ring.
//! let cx = RawKey::new("KeyX", "x").ctrl();
//! let h = RawKey::new("KeyH", "h");
//! let mw = RawKey::new("KeyW", "w").meta();
//!
//! for key in [cx, h, mw] {
//!     assert_eq!(registry.handler("left").handle_key(&mut left, &key), KeyResult::Handled);
//! }
//!
//! // C-y in another surface yanks it.
//! let cy = RawKey::new("KeyY", "y").ctrl();
//! registry.handler("right").handle_key(&mut right, &cy);
//! assert_eq!(right.text(), "copied text");
//! ```

// Require docs for public APIs, and disable the more annoying clippy lints.
#![deny(missing_docs)]
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::needless_return)]
#![allow(clippy::type_complexity)]

pub mod clipboard;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod handler;
pub mod key;
pub mod keymap;
pub mod killring;
pub mod mark;
pub mod surface;

pub use crossterm;
pub use keychords;

pub use self::config::EmacsConfig;
pub use self::errors::EmacsError;
pub use self::handler::{EmacsHandler, HandlerRegistry, KeyResult};
pub use self::keymap::Keymap;
pub use self::killring::{KillRing, SharedKillRing};

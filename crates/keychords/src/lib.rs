//! # keychords
//!
//! ## Overview
//!
//! This crate provides environment-agnostic pieces for Emacs-style chorded keybindings:
//!
//! * [canonicalize] turns a physical [RawKey] event into a normalized [Chord], such as `C-x` or
//!   `M-S-f`
//! * [parse_chord_spec] reads binding specifications like `"C-x C-p|C-x h"`
//! * [ChordTable] maps complete chord sequences onto bindings, and marks their prefixes so that
//!   callers know to wait for more input
//!
//! ## Example
//!
//! ```
//! use keychords::{canonicalize, ChordEntry, ChordTable, RawKey};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Action {
//!     SelectAll,
//!     Exchange,
//! }
//!
//! let table = ChordTable::from_bindings([
//!     ("C-x h", Action::SelectAll),
//!     ("C-x C-x", Action::Exchange),
//! ])
//! .unwrap();
//!
//! let cx = canonicalize(&RawKey::new("KeyX", "x").ctrl());
//! let h = canonicalize(&RawKey::new("KeyH", "h"));
//!
//! let chain = cx.chord().to_string();
//! assert_eq!(table.get(&chain), Some(&ChordEntry::Prefix));
//!
//! let chain = format!("{} {}", chain, h.chord());
//! assert_eq!(table.get(&chain), Some(&ChordEntry::Bound(Action::SelectAll)));
//! ```

// Require docs for public APIs, and disable the more annoying clippy lints.
#![deny(missing_docs)]
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::needless_return)]
#![allow(clippy::type_complexity)]

mod key;
mod parse;
mod table;

pub use self::key::{canonicalize, Chord, KeyData, Modifiers, RawKey};
pub use self::parse::{parse_chord_spec, ChordSpecError};
pub use self::table::{ChordEntry, ChordTable};

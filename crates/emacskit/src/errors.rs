//! # Error Types
//!
//! ## Overview
//!
//! Errors returned while building keymaps and loading configuration. Dispatching keys never fails:
//! a key that doesn't resolve to anything is just left for the host to handle.
use keychords::ChordSpecError;

/// Errors from building a [Keymap](crate::keymap::Keymap) or loading an
/// [EmacsConfig](crate::config::EmacsConfig).
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum EmacsError {
    /// A binding used an invalid chord specification.
    #[error("Invalid key specification: {0}")]
    BadSpec(#[from] ChordSpecError),

    /// A binding referred to a command in a way that can never be resolved.
    #[error("Malformed binding for {0:?}")]
    MalformedBinding(String),

    /// A configured binding named a command that doesn't exist.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The configuration couldn't be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration couldn't be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

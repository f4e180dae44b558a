//! # Configuration
//!
//! ## Overview
//!
//! [EmacsConfig] controls the size of the kill ring, the default universal argument count, the
//! page size of the reference surface, and extra key bindings layered on top of the defaults.
//!
//! It's usually loaded from TOML:
//!
//! ```toml
//! kill_ring_capacity = 60
//! universal_argument = 4
//!
//! [[bindings]]
//! keys = "C-c y|C-x y"
//! command = "yank"
//! ```
//!
//! Any field that isn't given keeps its default value.
use std::path::Path;

use serde::Deserialize;

use crate::errors::EmacsError;
use crate::killring::DEFAULT_CAPACITY;

/// A key binding supplied through configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct BindingConfig {
    /// Chord specification, such as `"C-c y"`.
    pub keys: String,

    /// Name of the command to run.
    pub command: String,
}

/// Settings for the Emacs keybinding engine.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct EmacsConfig {
    /// How many entries the kill ring keeps.
    pub kill_ring_capacity: usize,

    /// The count used by `C-u` when no digits follow it.
    pub universal_argument: usize,

    /// How many lines a page motion moves on a [RopeSurface](crate::surface::RopeSurface) built
    /// with [RopeSurface::with_config](crate::surface::RopeSurface::with_config).
    pub page_lines: usize,

    /// Extra bindings, applied in order after the default ones.
    pub bindings: Vec<BindingConfig>,
}

impl Default for EmacsConfig {
    fn default() -> Self {
        EmacsConfig {
            kill_ring_capacity: DEFAULT_CAPACITY,
            universal_argument: 4,
            page_lines: 20,
            bindings: vec![],
        }
    }
}

impl EmacsConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EmacsError> {
        Ok(toml::from_str(s)?)
    }

    /// Read configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EmacsError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)?;

        tracing::debug!(path = %path.display(), "loading emacs configuration");

        Self::from_toml_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    #[test]
    fn test_defaults() {
        let config = EmacsConfig::from_toml_str("").unwrap();

        assert_eq!(config, EmacsConfig::default());
        assert_eq!(config.kill_ring_capacity, 30);
        assert_eq!(config.universal_argument, 4);
        assert_eq!(config.page_lines, 20);
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn test_partial() {
        let s = r#"
            universal_argument = 16

            [[bindings]]
            keys = "C-c y"
            command = "yank"

            [[bindings]]
            keys = "C-c q"
            command = "keyboardQuit"
        "#;
        let config = EmacsConfig::from_toml_str(s).unwrap();

        assert_eq!(config.universal_argument, 16);
        assert_eq!(config.kill_ring_capacity, 30);
        assert_eq!(config.bindings.len(), 2);
        assert_eq!(config.bindings[0].keys, "C-c y");
        assert_eq!(config.bindings[1].command, "keyboardQuit");
    }

    #[test]
    fn test_bad_toml() {
        let res = EmacsConfig::from_toml_str("kill_ring_capacity = \"many\"");
        assert!(matches!(res, Err(EmacsError::Config(_))));
    }

    #[test]
    fn test_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("emacs.toml");
        std::fs::write(&path, "kill_ring_capacity = 5\npage_lines = 3\n").unwrap();

        let config = EmacsConfig::load(&path).unwrap();
        assert_eq!(config.kill_ring_capacity, 5);
        assert_eq!(config.page_lines, 3);

        let res = EmacsConfig::load(dir.child("missing.toml"));
        assert!(matches!(res, Err(EmacsError::Io(_))));
    }
}

//! # Key canonicalization
//!
//! ## Overview
//!
//! Hosts deliver physical key events that carry a platform key identifier (`KeyA`, `Digit4`,
//! `NumpadEnter`, `ArrowLeft`, ...), the logical character produced by the key, and the state of
//! the control, meta, alt and shift modifiers. This module turns them into [KeyData], whose
//! [Chord] is the normalized token used to look bindings up in a
//! [ChordTable](crate::ChordTable).
//!
//! Chords are written as an optional modifier prefix, always in the order `C-`, `M-`, `S-`,
//! followed by the base key name:
//!
//! ```
//! use keychords::{canonicalize, RawKey};
//!
//! let key = RawKey::new("KeyF", "f").ctrl().alt();
//! assert_eq!(canonicalize(&key).chord().to_string(), "C-M-f");
//!
//! let key = RawKey::new("ArrowLeft", "ArrowLeft").shift();
//! assert_eq!(canonicalize(&key).chord().to_string(), "S-Left");
//!
//! // Modifier-only presses produce nothing.
//! let key = RawKey::new("ShiftLeft", "Shift").shift();
//! assert!(canonicalize(&key).is_empty());
//! ```
use std::fmt;

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;

bitflags! {
    /// Modifiers that can be held down while pressing a key.
    ///
    /// Alt and the platform "meta" key both map to [Modifiers::META].
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Modifiers: u8 {
        /// The control key.
        const CONTROL = 0b001;

        /// The meta or alt key.
        const META = 0b010;

        /// The shift key.
        const SHIFT = 0b100;
    }
}

impl Modifiers {
    /// Map a modifier letter used in binding specifications (`C`, `M`, `S`) to its flag.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'C' => Some(Modifiers::CONTROL),
            'M' => Some(Modifiers::META),
            'S' => Some(Modifiers::SHIFT),
            _ => None,
        }
    }

    /// The canonical prefix for these modifiers, such as `"C-M-"`.
    pub fn prefix(&self) -> String {
        let mut res = String::new();

        if self.contains(Modifiers::CONTROL) {
            res.push_str("C-");
        }

        if self.contains(Modifiers::META) {
            res.push_str("M-");
        }

        if self.contains(Modifiers::SHIFT) {
            res.push_str("S-");
        }

        return res;
    }
}

/// A single normalized keypress, including its modifiers.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Chord {
    modifiers: Modifiers,
    key: String,
}

impl Chord {
    /// Create a new chord.
    ///
    /// Single character key names are lower-cased so that `C-X` and `C-x` name the same chord.
    pub fn new(modifiers: Modifiers, key: &str) -> Self {
        let key = if key.chars().count() == 1 {
            key.to_lowercase()
        } else {
            key.to_string()
        };

        Chord { modifiers, key }
    }

    /// The modifiers held while pressing this chord.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// The base key name, without any modifier prefix.
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Whether this chord has a base key.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.modifiers.prefix(), self.key)
    }
}

/// A physical key event, as reported by the host.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawKey {
    /// Platform identifier for the physical key, such as `KeyA` or `NumpadEnter`.
    pub code: String,

    /// The logical character or key name produced by the press.
    pub key: String,

    /// Whether control was held.
    pub ctrl: bool,

    /// Whether the platform meta (command, super) key was held.
    pub meta: bool,

    /// Whether alt was held.
    pub alt: bool,

    /// Whether shift was held.
    pub shift: bool,
}

impl RawKey {
    /// Create a key event with no modifiers held.
    pub fn new(code: impl Into<String>, key: impl Into<String>) -> Self {
        RawKey { code: code.into(), key: key.into(), ..RawKey::default() }
    }

    /// Hold control.
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Hold the platform meta key.
    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Hold alt.
    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Hold shift.
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::empty();
        mods.set(Modifiers::CONTROL, self.ctrl);
        mods.set(Modifiers::META, self.meta || self.alt);
        mods.set(Modifiers::SHIFT, self.shift);
        mods
    }
}

/// The canonical form of a [RawKey]: its [Chord], and the raw text the key produced.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct KeyData {
    chord: Chord,
    text: String,
}

impl KeyData {
    /// The normalized chord.
    pub fn chord(&self) -> &Chord {
        &self.chord
    }

    /// The base key name of the chord.
    pub fn key(&self) -> &str {
        self.chord.key()
    }

    /// The modifiers of the chord.
    pub fn modifiers(&self) -> Modifiers {
        self.chord.modifiers()
    }

    /// The logical text produced by the key press.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Whether this was a modifier-only press, which should be ignored.
    pub fn is_empty(&self) -> bool {
        self.chord.is_empty()
    }

    /// Whether this key would normally insert a single character into the buffer.
    pub fn is_printable(&self) -> bool {
        self.chord.modifiers().is_empty() && self.chord.key().graphemes(true).count() == 1
    }

    /// If the base key ends in a decimal digit, return its value.
    pub fn digit(&self) -> Option<u32> {
        self.chord.key().chars().last().and_then(|c| c.to_digit(10))
    }
}

const IGNORED_KEYS: &[&str] = &["Shift", "Alt", "Meta", "Command", "Control", "CapsLock"];

fn special_key(code: &str) -> Option<&'static str> {
    let name = match code {
        "Return" | "Enter" => "Return",
        "Escape" => "Esc",
        "Insert" => "Ins",
        "ArrowLeft" => "Left",
        "ArrowRight" => "Right",
        "ArrowUp" => "Up",
        "ArrowDown" => "Down",
        "Divide" | "Slash" => "/",
        "Multiply" => "*",
        "Subtract" | "Minus" => "-",
        "Add" => "+",
        "Decimal" | "Period" => ".",
        "Equal" => "=",
        "Comma" => ",",
        "Semicolon" => ";",
        "Quote" => "'",
        "Backquote" => "`",
        "Backslash" => "\\",
        "BracketLeft" => "[",
        "BracketRight" => "]",
        _ => return None,
    };

    Some(name)
}

fn strip_code(code: &str) -> &str {
    if code.len() <= 1 {
        return code;
    }

    for prefix in ["Numpad", "Key", "Digit"] {
        if let Some(rest) = code.strip_prefix(prefix) {
            if !rest.is_empty() {
                return rest;
            }
        }
    }

    return code;
}

/// Turn a physical key event into its canonical [KeyData].
///
/// Modifier-only presses produce an empty result.
pub fn canonicalize(raw: &RawKey) -> KeyData {
    if IGNORED_KEYS.contains(&raw.key.as_str()) {
        return KeyData::default();
    }

    let code = if raw.code.is_empty() { raw.key.as_str() } else { raw.code.as_str() };
    let code = strip_code(code);
    let code = special_key(code).unwrap_or(code);
    let chord = Chord::new(raw.modifiers(), code);

    KeyData { chord, text: raw.key.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! chord {
        ($raw: expr) => {
            canonicalize(&$raw).chord().to_string()
        };
    }

    #[test]
    fn test_letters() {
        assert_eq!(chord!(RawKey::new("KeyA", "a")), "a");
        assert_eq!(chord!(RawKey::new("KeyA", "A").shift()), "S-a");
        assert_eq!(chord!(RawKey::new("KeyX", "x").ctrl()), "C-x");
        assert_eq!(chord!(RawKey::new("KeyF", "f").meta()), "M-f");
        assert_eq!(chord!(RawKey::new("KeyF", "f").alt()), "M-f");
    }

    #[test]
    fn test_modifier_order() {
        let raw = RawKey::new("KeyB", "B").shift().alt().ctrl();
        assert_eq!(chord!(raw), "C-M-S-b");

        // Alt and meta share one marker.
        let raw = RawKey::new("KeyB", "b").meta().alt();
        assert_eq!(chord!(raw), "M-b");
    }

    #[test]
    fn test_special_names() {
        assert_eq!(chord!(RawKey::new("Enter", "Enter")), "Return");
        assert_eq!(chord!(RawKey::new("NumpadEnter", "Enter")), "Return");
        assert_eq!(chord!(RawKey::new("Escape", "Escape")), "Esc");
        assert_eq!(chord!(RawKey::new("Insert", "Insert")), "Ins");
        assert_eq!(chord!(RawKey::new("ArrowUp", "ArrowUp").ctrl()), "C-Up");
        assert_eq!(chord!(RawKey::new("NumpadDivide", "/")), "/");
        assert_eq!(chord!(RawKey::new("NumpadMultiply", "*")), "*");
        assert_eq!(chord!(RawKey::new("NumpadSubtract", "-")), "-");
        assert_eq!(chord!(RawKey::new("Minus", "-").ctrl()), "C--");
        assert_eq!(chord!(RawKey::new("Slash", "/").ctrl()), "C-/");
        assert_eq!(chord!(RawKey::new("Comma", "<").shift().alt()), "M-S-,");
        assert_eq!(chord!(RawKey::new("Space", " ").ctrl()), "C-Space");
        assert_eq!(chord!(RawKey::new("Backspace", "Backspace")), "Backspace");
    }

    #[test]
    fn test_digits() {
        let kd = canonicalize(&RawKey::new("Digit4", "4").ctrl());
        assert_eq!(kd.chord().to_string(), "C-4");
        assert_eq!(kd.digit(), Some(4));

        let kd = canonicalize(&RawKey::new("Numpad7", "7"));
        assert_eq!(kd.chord().to_string(), "7");
        assert_eq!(kd.digit(), Some(7));
        assert!(kd.is_printable());

        let kd = canonicalize(&RawKey::new("KeyQ", "q"));
        assert_eq!(kd.digit(), None);
    }

    #[test]
    fn test_ignored() {
        for name in ["Shift", "Alt", "Meta", "Control", "CapsLock", "Command"] {
            let kd = canonicalize(&RawKey::new(format!("{name}Left"), name));
            assert!(kd.is_empty(), "{name} should be ignored");
        }
    }

    #[test]
    fn test_printable() {
        let kd = canonicalize(&RawKey::new("KeyQ", "q"));
        assert!(kd.is_printable());
        assert_eq!(kd.text(), "q");

        let kd = canonicalize(&RawKey::new("KeyQ", "q").ctrl());
        assert!(!kd.is_printable());

        let kd = canonicalize(&RawKey::new("ArrowLeft", "ArrowLeft"));
        assert!(!kd.is_printable());
    }

    #[test]
    fn test_missing_code() {
        let kd = canonicalize(&RawKey::new("", "z"));
        assert_eq!(kd.chord().to_string(), "z");
    }

    #[test]
    fn test_deterministic() {
        let raw = RawKey::new("KeyK", "k").ctrl();
        assert_eq!(canonicalize(&raw), canonicalize(&raw));
    }
}

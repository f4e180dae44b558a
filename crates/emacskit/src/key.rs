//! # Terminal keys
//!
//! ## Overview
//!
//! Hosts running in a terminal receive [crossterm] key events rather than physical key codes.
//! [TerminalKey] converts them into the [RawKey] events that the chord canonicalizer expects, so
//! that they can be fed to an [EmacsHandler](crate::handler::EmacsHandler) directly.
//!
//! ```
//! use crossterm::event::{KeyCode, KeyModifiers};
//! use emacskit::key::TerminalKey;
//! use emacskit::keychords::canonicalize;
//!
//! let key = TerminalKey::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
//! assert_eq!(canonicalize(&key.into()).chord().to_string(), "C-x");
//! ```
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, ModifierKeyCode};
use keychords::RawKey;

/// A key pressed in a terminal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TerminalKey {
    code: KeyCode,
    modifiers: KeyModifiers,
}

fn char_code(c: char) -> String {
    let name = match c {
        ' ' => "Space",
        '-' => "Minus",
        '/' => "Slash",
        '=' => "Equal",
        ',' => "Comma",
        '.' => "Period",
        ';' => "Semicolon",
        '\'' => "Quote",
        '`' => "Backquote",
        '\\' => "Backslash",
        '[' => "BracketLeft",
        ']' => "BracketRight",
        c if c.is_ascii_alphabetic() => return format!("Key{}", c.to_ascii_uppercase()),
        c if c.is_ascii_digit() => return format!("Digit{c}"),
        c => return c.to_string(),
    };

    name.to_string()
}

fn modifier_name(code: ModifierKeyCode) -> &'static str {
    match code {
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => "Shift",
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => "Control",
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => "Alt",
        _ => "Meta",
    }
}

impl TerminalKey {
    /// Create a new key.
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        TerminalKey { code, modifiers }
    }

    /// The key code.
    pub fn code(&self) -> KeyCode {
        self.code
    }

    /// The modifiers held while pressing the key.
    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    /// Convert this key into a physical key event.
    pub fn to_raw_key(&self) -> RawKey {
        let named = |name: &str| RawKey::new(name, name);

        let mut raw = match self.code {
            KeyCode::Char(c) => {
                let mut raw = RawKey::new(char_code(c), c.to_string());
                raw.shift = c.is_uppercase();
                raw
            },
            KeyCode::Enter => named("Enter"),
            KeyCode::Esc => named("Escape"),
            KeyCode::Backspace => named("Backspace"),
            KeyCode::Delete => named("Delete"),
            KeyCode::Insert => named("Insert"),
            KeyCode::Tab => named("Tab"),
            KeyCode::BackTab => named("Tab").shift(),
            KeyCode::Left => named("ArrowLeft"),
            KeyCode::Right => named("ArrowRight"),
            KeyCode::Up => named("ArrowUp"),
            KeyCode::Down => named("ArrowDown"),
            KeyCode::Home => named("Home"),
            KeyCode::End => named("End"),
            KeyCode::PageUp => named("PageUp"),
            KeyCode::PageDown => named("PageDown"),
            KeyCode::F(n) => named(format!("F{n}").as_str()),
            KeyCode::CapsLock => named("CapsLock"),
            KeyCode::Modifier(m) => named(modifier_name(m)),
            _ => RawKey::default(),
        };

        raw.ctrl |= self.modifiers.contains(KeyModifiers::CONTROL);
        raw.alt |= self.modifiers.contains(KeyModifiers::ALT);
        raw.meta |= self.modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META);
        raw.shift |= self.modifiers.contains(KeyModifiers::SHIFT);

        return raw;
    }
}

impl From<KeyCode> for TerminalKey {
    fn from(code: KeyCode) -> Self {
        TerminalKey::new(code, KeyModifiers::NONE)
    }
}

impl From<KeyEvent> for TerminalKey {
    fn from(ke: KeyEvent) -> Self {
        TerminalKey::new(ke.code, ke.modifiers)
    }
}

impl From<TerminalKey> for RawKey {
    fn from(key: TerminalKey) -> Self {
        key.to_raw_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keychords::canonicalize;

    macro_rules! chord {
        ($code: expr) => {
            chord!($code, KeyModifiers::NONE)
        };
        ($code: expr, $mods: expr) => {
            canonicalize(&TerminalKey::new($code, $mods).into()).chord().to_string()
        };
    }

    #[test]
    fn test_chars() {
        assert_eq!(chord!(KeyCode::Char('a')), "a");
        assert_eq!(chord!(KeyCode::Char('A')), "S-a");
        assert_eq!(chord!(KeyCode::Char('A'), KeyModifiers::SHIFT), "S-a");
        assert_eq!(chord!(KeyCode::Char('x'), KeyModifiers::CONTROL), "C-x");
        assert_eq!(chord!(KeyCode::Char('f'), KeyModifiers::ALT), "M-f");
        assert_eq!(chord!(KeyCode::Char('5'), KeyModifiers::CONTROL), "C-5");
        assert_eq!(chord!(KeyCode::Char(' '), KeyModifiers::CONTROL), "C-Space");
        assert_eq!(chord!(KeyCode::Char('/'), KeyModifiers::CONTROL), "C-/");
        assert_eq!(chord!(KeyCode::Char('@'), KeyModifiers::ALT), "M-@");
        assert_eq!(chord!(KeyCode::Char(','), KeyModifiers::ALT | KeyModifiers::SHIFT), "M-S-,");
    }

    #[test]
    fn test_named() {
        assert_eq!(chord!(KeyCode::Enter), "Return");
        assert_eq!(chord!(KeyCode::Esc), "Esc");
        assert_eq!(chord!(KeyCode::Left), "Left");
        assert_eq!(chord!(KeyCode::Up, KeyModifiers::CONTROL), "C-Up");
        assert_eq!(chord!(KeyCode::Home, KeyModifiers::SHIFT), "S-Home");
        assert_eq!(chord!(KeyCode::Backspace, KeyModifiers::ALT), "M-Backspace");
        assert_eq!(chord!(KeyCode::BackTab), "S-Tab");
    }

    #[test]
    fn test_ignored() {
        let key = TerminalKey::from(KeyCode::Modifier(ModifierKeyCode::LeftControl));
        assert!(canonicalize(&key.into()).is_empty());

        let key = TerminalKey::from(KeyCode::CapsLock);
        assert!(canonicalize(&key.into()).is_empty());

        let key = TerminalKey::from(KeyCode::Null);
        assert!(canonicalize(&key.into()).is_empty());
    }

    #[test]
    fn test_printable() {
        let kd = canonicalize(&TerminalKey::from(KeyCode::Char('q')).into());
        assert!(kd.is_printable());
        assert_eq!(kd.text(), "q");
    }
}

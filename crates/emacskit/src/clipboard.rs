//! # Clipboard access
//!
//! ## Overview
//!
//! The [KillRing](crate::killring::KillRing) mirrors everything it stores into a [Clipboard], and
//! checks it before yanking so that text copied in other applications can be pasted too.
//!
//! [MemoryClipboard] keeps the contents in process, and can be shared between a kill ring and
//! whatever else in the application wants to see or simulate copies. When this crate is built
//! with the `clipboard` feature, [SystemClipboard] talks to the operating system clipboard.
use std::sync::{Arc, Mutex};

/// Errors from reading the clipboard.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ClipboardError {
    /// The clipboard couldn't be reached.
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    /// The clipboard holds something other than text.
    #[error("Clipboard doesn't contain text")]
    NotText,
}

/// A place to exchange copied text with the rest of the system.
pub trait Clipboard {
    /// Read the current clipboard text.
    fn read_text(&mut self) -> Result<String, ClipboardError>;

    /// Replace the clipboard text. Failures are logged and otherwise ignored.
    fn write_text(&mut self, text: &str);
}

/// An in-process clipboard. Clones share the same contents.
#[derive(Clone, Debug, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<String>>,
}

impl MemoryClipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        MemoryClipboard::default()
    }

    /// The current contents.
    pub fn contents(&self) -> String {
        match self.contents.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        self.contents
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }

    fn write_text(&mut self, text: &str) {
        match self.contents.lock() {
            Ok(mut guard) => *guard = text.to_string(),
            Err(e) => tracing::warn!("failed to write clipboard: {e}"),
        }
    }
}

#[cfg(feature = "clipboard")]
mod system {
    use std::sync::Mutex;

    use super::{Clipboard, ClipboardError};

    /// The operating system clipboard.
    pub struct SystemClipboard {
        clipboard: Mutex<arboard::Clipboard>,
    }

    impl SystemClipboard {
        /// Connect to the system clipboard.
        pub fn new() -> Result<Self, ClipboardError> {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;

            Ok(SystemClipboard { clipboard: Mutex::new(clipboard) })
        }
    }

    impl Clipboard for SystemClipboard {
        fn read_text(&mut self) -> Result<String, ClipboardError> {
            let clipboard = self
                .clipboard
                .get_mut()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;

            clipboard.get_text().map_err(|e| {
                match e {
                    arboard::Error::ContentNotAvailable => ClipboardError::NotText,
                    e => ClipboardError::Unavailable(e.to_string()),
                }
            })
        }

        fn write_text(&mut self, text: &str) {
            let res = match self.clipboard.get_mut() {
                Ok(clipboard) => clipboard.set_text(text.to_string()).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            if let Err(e) = res {
                tracing::warn!("failed to write system clipboard: {e}");
            }
        }
    }
}

#[cfg(feature = "clipboard")]
pub use self::system::SystemClipboard;

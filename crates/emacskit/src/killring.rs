//! # Kill ring
//!
//! ## Overview
//!
//! The [KillRing] holds recently killed and copied text, oldest first. There is one ring per
//! process, shared between every editing surface through a [SharedKillRing] handle.
//!
//! Everything added to the ring is also written to its [Clipboard], and before yanking the ring
//! checks whether the clipboard has been changed by another application, in which case the new
//! text is added to the ring first.
//!
//! ## Example
//!
//! ```
//! use emacskit::killring::KillRing;
//!
//! let mut ring = KillRing::default();
//! ring.add("foo");
//! ring.add("bar");
//!
//! assert_eq!(ring.get(2), "bar\nfoo");
//! assert_eq!(ring.rotate(), "foo");
//! ```
use std::collections::VecDeque;
use std::sync::{Arc, OnceLock, RwLock};

use regex::Regex;
use tracing::debug;

use crate::clipboard::{Clipboard, MemoryClipboard};

/// The default number of entries kept in a [KillRing].
pub const DEFAULT_CAPACITY: usize = 30;

/// A [KillRing] that can be shared between editing surfaces.
pub type SharedKillRing = Arc<RwLock<KillRing>>;

fn invisible() -> Option<&'static Regex> {
    static INVISIBLE: OnceLock<Option<Regex>> = OnceLock::new();

    INVISIBLE.get_or_init(|| Regex::new("[\u{200B}-\u{200D}\u{FEFF}]").ok()).as_ref()
}

/// Normalize text read from the clipboard: line endings become `\n`, and zero-width characters
/// and byte-order marks are removed.
pub fn normalize_clipboard_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    match invisible() {
        Some(re) => re.replace_all(&text, "").into_owned(),
        None => text,
    }
}

/// Ring of killed text.
pub struct KillRing {
    entries: VecDeque<String>,
    capacity: usize,
    clipboard: Box<dyn Clipboard + Send + Sync>,
    last_clipboard_text: String,
}

impl KillRing {
    /// Create an empty ring that mirrors into the given clipboard.
    pub fn new<C>(clipboard: C) -> Self
    where
        C: Clipboard + Send + Sync + 'static,
    {
        KillRing {
            entries: VecDeque::new(),
            capacity: DEFAULT_CAPACITY,
            clipboard: Box::new(clipboard),
            last_clipboard_text: String::new(),
        }
    }

    /// Change how many entries are kept. Zero is treated as one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Wrap this ring so that it can be shared.
    pub fn shared(self) -> SharedKillRing {
        Arc::new(RwLock::new(self))
    }

    /// Number of entries in the ring.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    fn mirror(&mut self, text: &str) {
        self.clipboard.write_text(text);
        self.last_clipboard_text = normalize_clipboard_text(text);
    }

    /// Push new text onto the ring, and copy it to the clipboard.
    ///
    /// Empty text is ignored.
    pub fn add(&mut self, text: &str) {
        if !text.is_empty() {
            self.entries.push_back(text.to_string());
            self.mirror(text);
        }

        while self.entries.len() > self.capacity {
            let _ = self.entries.pop_front();
        }
    }

    /// Add text onto the end of the most recent entry, and copy the result to the clipboard.
    pub fn append(&mut self, text: &str) {
        let mut entry = self.entries.pop_back().unwrap_or_default();
        entry.push_str(text);

        if entry.is_empty() {
            return;
        }

        self.mirror(&entry);
        self.entries.push_back(entry);
    }

    /// Get the `n` most recent entries, newest first, joined by newlines.
    pub fn get(&self, n: usize) -> String {
        let n = n.max(1).min(self.entries.len());

        self.entries.iter().rev().take(n).map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    /// Discard the most recent entry, unless it's the only one, and return the new top.
    pub fn pop(&mut self) -> String {
        if self.entries.len() > 1 {
            let _ = self.entries.pop_back();
        }

        self.get(1)
    }

    /// Move the most recent entry to the oldest end of the ring, and return the new top.
    pub fn rotate(&mut self) -> String {
        if let Some(last) = self.entries.pop_back() {
            self.entries.push_front(last);
        }

        self.get(1)
    }

    /// Merge clipboard text that was read by the host into the ring.
    ///
    /// Returns `true` if the text was new and got added.
    pub fn merge_clipboard_text(&mut self, text: &str) -> bool {
        let text = normalize_clipboard_text(text);

        if text == self.last_clipboard_text {
            return false;
        }

        debug!(len = text.len(), "merging external clipboard text into kill ring");
        self.add(text.as_str());
        self.last_clipboard_text = text;

        return true;
    }

    /// Check the clipboard for text copied outside of this ring, and add it if found.
    ///
    /// Failing to read the clipboard isn't an error: the ring is just left as it is.
    pub fn reconcile_clipboard(&mut self) -> bool {
        match self.clipboard.read_text() {
            Ok(text) => self.merge_clipboard_text(&text),
            Err(e) => {
                debug!("unable to read clipboard: {e}");
                false
            },
        }
    }
}

impl Default for KillRing {
    fn default() -> Self {
        KillRing::new(MemoryClipboard::new())
    }
}

impl std::fmt::Debug for KillRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KillRing")
            .field("entries", &self.entries)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

//! # Chord tables
//!
//! ## Overview
//!
//! A [ChordTable] maps chord sequences, written as chords joined by a single space (`"C-x C-p"`),
//! onto bindings. Every proper prefix of a bound sequence maps to [ChordEntry::Prefix], which
//! tells the caller to wait for more input.
//!
//! Tables are built once from a declarative list of `(spec, binding)` pairs and aren't modified
//! afterwards. Later pairs take precedence over earlier ones.
use std::collections::HashMap;

use crate::parse::{parse_chord_spec, ChordSpecError};

/// What a chord sequence resolves to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChordEntry<B> {
    /// More chords are expected.
    Prefix,

    /// The sequence is complete and maps to a binding.
    Bound(B),
}

impl<B> ChordEntry<B> {
    /// Return the binding, if this entry is terminal.
    pub fn binding(&self) -> Option<&B> {
        match self {
            ChordEntry::Prefix => None,
            ChordEntry::Bound(b) => Some(b),
        }
    }
}

/// An immutable mapping from chord sequences to bindings.
#[derive(Clone, Debug)]
pub struct ChordTable<B> {
    map: HashMap<String, ChordEntry<B>>,
}

impl<B: Clone> ChordTable<B> {
    /// Build a table from an ordered list of binding specifications.
    ///
    /// Each specification may list several `|`-separated alternatives, and each alternative may
    /// be a sequence of whitespace-separated chords. Binding a sequence marks all of its proper
    /// prefixes as [ChordEntry::Prefix], even if one of them was previously bound.
    pub fn from_bindings<I, S>(bindings: I) -> Result<Self, ChordSpecError>
    where
        I: IntoIterator<Item = (S, B)>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();

        for (spec, binding) in bindings {
            for seq in parse_chord_spec(spec.as_ref())? {
                let mut chain = String::new();
                let last = seq.len() - 1;

                for (i, chord) in seq.iter().enumerate() {
                    if i > 0 {
                        chain.push(' ');
                    }

                    chain.push_str(chord.to_string().as_str());

                    if i == last {
                        map.insert(chain.clone(), ChordEntry::Bound(binding.clone()));
                    } else {
                        map.insert(chain.clone(), ChordEntry::Prefix);
                    }
                }
            }
        }

        Ok(ChordTable { map })
    }
}

impl<B> ChordTable<B> {
    /// Look up a space-joined chord sequence.
    pub fn get(&self, chain: &str) -> Option<&ChordEntry<B>> {
        self.map.get(chain)
    }

    /// Number of sequences (including prefixes) in the table.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Iterate over the bound (non-prefix) sequences in the table.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &B)> {
        self.map.iter().filter_map(|(k, v)| v.binding().map(|b| (k.as_str(), b)))
    }

    /// List the bound sequences that start with a pending chain, such as `"C-x"`.
    ///
    /// This is useful for showing the user what can follow a prefix key.
    pub fn continuations(&self, chain: &str) -> Vec<(&str, &B)> {
        let prefix = format!("{chain} ");
        let mut res: Vec<_> = self.bindings().filter(|(k, _)| k.starts_with(&prefix)).collect();
        res.sort_by(|a, b| a.0.cmp(b.0));
        res
    }
}

impl<B> Default for ChordTable<B> {
    fn default() -> Self {
        ChordTable { map: HashMap::new() }
    }
}

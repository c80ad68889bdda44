//! Bamini to Unicode Tamil transliteration.
//!
//! Conversion is a context-free substitution over a [`MappingTable`]. Every
//! maximal matching Bamini sequence is replaced by its Unicode Tamil
//! equivalent and anything unmatched passes through unchanged. The engine
//! cannot tell Bamini from text that is already Unicode, so callers must not
//! convert the same text twice.

use crate::table::MappingTable;
use std::borrow::Cow;
use unicode_normalization::{is_nfc, UnicodeNormalization};

/// How the table is applied to a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// One global find-and-replace per rule, longest pattern first.
    #[default]
    Passes,

    /// A single left-to-right scan that takes the longest pattern starting
    /// at each position.
    ///
    /// Agrees with [`Strategy::Passes`] on real Bamini text. The two can
    /// differ when an equal-length rule listed earlier in the table would
    /// match across a token boundary: `fhp` is `கரி` under passes (the `hp`
    /// row runs before `fh`) and `காp` under a scan.
    LongestMatch,
}

/// Applies a mapping table to text.
#[derive(Debug, Clone, Copy)]
pub struct Transliterator<'t> {
    table: &'t MappingTable,
    strategy: Strategy,
    nfc: bool,
}

impl Transliterator<'static> {
    /// A transliterator over the built-in Bamini table.
    pub fn bamini() -> Self {
        Self::new(MappingTable::bamini())
    }
}

impl<'t> Transliterator<'t> {
    /// Create a transliterator over the given table with default options.
    pub fn new(table: &'t MappingTable) -> Self {
        Self {
            table,
            strategy: Strategy::default(),
            nfc: false,
        }
    }

    /// Set the matching strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set whether converted text is normalized to NFC.
    pub fn with_nfc(mut self, nfc: bool) -> Self {
        self.nfc = nfc;
        self
    }

    /// The table this transliterator applies.
    pub fn table(&self) -> &'t MappingTable {
        self.table
    }

    /// The matching strategy in use.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Convert a string. Never fails; empty input comes back empty.
    pub fn convert(&self, text: &str) -> String {
        self.convert_cow(text).into_owned()
    }

    /// Convert a string, borrowing the input when nothing changed.
    pub fn convert_cow<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if text.is_empty() {
            return Cow::Borrowed(text);
        }

        let converted = match self.strategy {
            Strategy::Passes => self.replace_in_passes(text),
            Strategy::LongestMatch => self.scan_longest_match(text),
        };

        if self.nfc && !is_nfc(&converted) {
            Cow::Owned(converted.nfc().collect())
        } else {
            converted
        }
    }

    fn replace_in_passes<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut working = Cow::Borrowed(text);

        for (pattern, replacement) in self.table.rules() {
            if working.contains(pattern) {
                working = Cow::Owned(working.replace(pattern, replacement));
            }
        }

        working
    }

    fn scan_longest_match<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let max_len = self.table.max_pattern_len();
        let mut output = String::with_capacity(text.len() * 2);
        let mut changed = false;
        let mut rest = text;

        while let Some(first) = rest.chars().next() {
            let hit = (1..=max_len).rev().find_map(|chars| {
                let end = byte_offset_of_char(rest, chars)?;
                self.table.get(&rest[..end]).map(|replacement| (end, replacement))
            });

            match hit {
                Some((end, replacement)) => {
                    output.push_str(replacement);
                    rest = &rest[end..];
                    changed = true;
                }
                None => {
                    output.push(first);
                    rest = &rest[first.len_utf8()..];
                }
            }
        }

        if changed {
            Cow::Owned(output)
        } else {
            Cow::Borrowed(text)
        }
    }
}

/// Byte offset just past the first `n` characters of `s`, or `None` if `s`
/// is shorter than that.
fn byte_offset_of_char(s: &str, n: usize) -> Option<usize> {
    s.char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(s.len()))
        .nth(n)
}

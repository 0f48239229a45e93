//! Deterministic `Description` assembly.
//!
//! Unconsumed, non-blank columns are rendered as `column: value` in header
//! order and joined with two spaces. The active field delimiter and line
//! breaks are replaced so a serialized row never splits.

use memchr::{memchr, memchr3};
use std::borrow::Cow;

use crate::reader::RawRow;

/// Joins rendered columns.
pub const FIELD_SEPARATOR: &str = "  ";
/// Stands in for an embedded field delimiter.
pub const DELIMITER_PLACEHOLDER: &str = "   ";

#[derive(Debug, Clone, Copy)]
pub struct DescriptionBuilder {
    delimiter: char,
}

impl Default for DescriptionBuilder {
    fn default() -> Self {
        Self::new('\t')
    }
}

impl DescriptionBuilder {
    /// `delimiter` is the single-character field separator of the flat sink.
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn build(&self, row: &RawRow<'_>, excluded: &[&str]) -> String {
        let mut out = String::new();
        for (column, value) in row.columns() {
            let value = value.trim();
            if value.is_empty() || excluded.contains(&column) {
                continue;
            }
            if !out.is_empty() {
                out.push_str(FIELD_SEPARATOR);
            }
            out.push_str(&sanitize(column, self.delimiter));
            out.push_str(": ");
            out.push_str(&sanitize(value, self.delimiter));
        }
        out
    }
}

/// Replace `delimiter` with [`DELIMITER_PLACEHOLDER`] and CR/LF with a space.
/// A CRLF pair becomes a single space.
pub fn sanitize(value: &str, delimiter: char) -> Cow<'_, str> {
    if !needs_sanitizing(value.as_bytes(), delimiter) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            c if c == delimiter => out.push_str(DELIMITER_PLACEHOLDER),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn needs_sanitizing(bytes: &[u8], delimiter: char) -> bool {
    if delimiter.is_ascii() {
        memchr3(delimiter as u8, b'\r', b'\n', bytes).is_some()
    } else {
        memchr(b'\r', bytes).is_some()
            || memchr(b'\n', bytes).is_some()
            || std::str::from_utf8(bytes).is_ok_and(|s| s.contains(delimiter))
    }
}

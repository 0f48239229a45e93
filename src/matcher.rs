//! Filename → schema resolution.
//!
//! Patterns are whole-name, case-insensitive wildcards. When more than one
//! pattern accepts a filename, the pattern with the most literal characters
//! wins; a tie between the most specific candidates is reported as
//! [`MatchOutcome::Ambiguous`] instead of being settled by table order.

use regex::{Regex, RegexBuilder};

use crate::error::RegistryError;
use crate::schemas::{ArtifactSchema, Registry};

/// Result of resolving one filename.
#[derive(Debug, Clone)]
pub enum MatchOutcome<'r> {
    Matched(&'r ArtifactSchema),
    Unmatched,
    Ambiguous(Vec<&'static str>),
}

// schemas are identified by name; their extractors hold fn pointers
impl PartialEq for MatchOutcome<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MatchOutcome::Matched(a), MatchOutcome::Matched(b)) => a.name == b.name,
            (MatchOutcome::Unmatched, MatchOutcome::Unmatched) => true,
            (MatchOutcome::Ambiguous(a), MatchOutcome::Ambiguous(b)) => a == b,
            _ => false,
        }
    }
}

struct CompiledPattern<'r> {
    schema: &'r ArtifactSchema,
    regex: Regex,
    specificity: usize,
}

pub struct PatternMatcher<'r> {
    patterns: Vec<CompiledPattern<'r>>,
}

impl<'r> PatternMatcher<'r> {
    pub fn new(registry: &'r Registry) -> Result<Self, RegistryError> {
        let patterns = registry
            .schemas()
            .iter()
            .map(|schema| {
                Ok(CompiledPattern {
                    schema,
                    regex: compile(schema.pattern)?,
                    specificity: specificity(schema.pattern),
                })
            })
            .collect::<Result<_, RegistryError>>()?;
        Ok(Self { patterns })
    }

    pub fn resolve(&self, filename: &str) -> MatchOutcome<'r> {
        let candidates: Vec<&CompiledPattern<'r>> = self
            .patterns
            .iter()
            .filter(|p| p.regex.is_match(filename))
            .collect();

        let Some(best) = candidates.iter().map(|p| p.specificity).max() else {
            return MatchOutcome::Unmatched;
        };

        let top: Vec<&CompiledPattern<'r>> = candidates
            .into_iter()
            .filter(|p| p.specificity == best)
            .collect();

        match top.as_slice() {
            [only] => MatchOutcome::Matched(only.schema),
            _ => MatchOutcome::Ambiguous(top.iter().map(|p| p.schema.name).collect()),
        }
    }
}

/// Translate a wildcard pattern into an anchored regex. `*` is the only
/// wildcard; every other character, `$` included, matches itself. A
/// backslash-escaped `\$` is accepted as a literal dollar as well.
pub fn compile(pattern: &str) -> Result<Regex, RegistryError> {
    let mut source = String::with_capacity(pattern.len() * 2 + 2);
    source.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => source.push_str(".*"),
            '\\' if chars.peek() == Some(&'$') => {
                chars.next();
                source.push_str(r"\$");
            }
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|e| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

fn specificity(pattern: &str) -> usize {
    pattern.chars().filter(|c| !matches!(c, '*' | '\\')).count()
}

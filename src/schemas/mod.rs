//! Artifact schemas: how one tool's CSV columns map onto a timeline event.
//!
//! The built-in table is split by artifact family, one module per family,
//! and assembled by [`Registry::builtin`].

pub mod activity;
pub mod filesystem;
pub mod hives;

use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::RegistryError;
use crate::reader::{Header, RawRow};

/// Computes a field from a whole row.
pub type DeriveFn = fn(&RawRow<'_>) -> String;

/// How a canonical field gets its value.
#[derive(Debug, Clone, Copy)]
pub enum Field {
    /// The same value for every row.
    Constant(&'static str),
    /// The value of a source column, or `default` when it is blank or missing.
    Column {
        name: &'static str,
        default: &'static str,
    },
    /// A function of the row. `consumes` lists the columns it reads so they
    /// can be kept out of the description.
    Derived {
        consumes: &'static [&'static str],
        derive: DeriveFn,
    },
}

impl Field {
    pub fn evaluate<'r>(&self, row: &'r RawRow<'_>) -> Cow<'r, str> {
        match self {
            Field::Constant(value) => Cow::Borrowed(*value),
            Field::Column { name, default } => {
                Cow::Borrowed(row.non_empty(name).unwrap_or(*default))
            }
            Field::Derived { derive, .. } => Cow::Owned(derive(row)),
        }
    }

    /// Source columns this field reads.
    pub fn consumed_columns(&self) -> &[&'static str] {
        match self {
            Field::Constant(_) => &[],
            Field::Column { name, .. } => std::slice::from_ref(name),
            Field::Derived { consumes, .. } => consumes,
        }
    }
}

/// Where the event time comes from.
#[derive(Debug, Clone, Copy)]
pub enum TimeSpec {
    /// One timestamp column, one event per row.
    Single(&'static str),
    /// Several `(column, short label)` pairs; rows fan out by distinct value.
    Multi(&'static [(&'static str, &'static str)]),
}

impl TimeSpec {
    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            TimeSpec::Single(column) => vec![*column],
            TimeSpec::Multi(fields) => fields.iter().map(|(column, _)| *column).collect(),
        }
    }

    /// Timestamp columns `header` lacks.
    pub fn missing_from(&self, header: &Header) -> Vec<String> {
        self.columns()
            .into_iter()
            .filter(|c| !header.contains(c))
            .map(str::to_string)
            .collect()
    }
}

/// Immutable mapping rules for one artifact type.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactSchema {
    pub name: &'static str,
    /// Filename wildcard; `*` matches any run of characters, `$` is literal.
    pub pattern: &'static str,
    pub time: TimeSpec,
    pub source: Field,
    /// `None` means the system is unknown.
    pub system: Option<Field>,
    /// `None` hands the row to the user resolver.
    pub user: Option<Field>,
}

impl ArtifactSchema {
    /// Columns that must not appear in the description.
    pub fn consumed_columns(&self) -> Vec<&'static str> {
        let mut columns = self.time.columns();
        columns.extend_from_slice(self.source.consumed_columns());
        for field in self.system.iter().chain(self.user.iter()) {
            columns.extend_from_slice(field.consumed_columns());
        }
        columns
    }
}

/// The validated set of schemas known to a run.
#[derive(Debug, Clone)]
pub struct Registry {
    schemas: Vec<ArtifactSchema>,
}

impl Registry {
    /// Validates names, patterns and time specs.
    pub fn new(schemas: Vec<ArtifactSchema>) -> Result<Self, RegistryError> {
        let mut names = HashSet::new();
        let mut patterns: Vec<(String, &'static str)> = Vec::with_capacity(schemas.len());

        for schema in &schemas {
            if !names.insert(schema.name) {
                return Err(RegistryError::DuplicateName(schema.name.to_string()));
            }

            let folded = schema.pattern.to_lowercase();
            if let Some((_, first)) = patterns.iter().find(|(p, _)| *p == folded) {
                return Err(RegistryError::DuplicatePattern {
                    first: first.to_string(),
                    second: schema.name.to_string(),
                    pattern: schema.pattern.to_string(),
                });
            }
            patterns.push((folded, schema.name));

            if let TimeSpec::Multi([]) = schema.time {
                return Err(RegistryError::EmptyTimeSpec(schema.name.to_string()));
            }
        }

        Ok(Self { schemas })
    }

    /// The KAPE/EZTools artifact table.
    pub fn builtin() -> Result<Self, RegistryError> {
        let schemas = filesystem::SCHEMAS
            .iter()
            .chain(hives::SCHEMAS)
            .chain(activity::SCHEMAS)
            .copied()
            .collect();
        Self::new(schemas)
    }

    pub fn schemas(&self) -> &[ArtifactSchema] {
        &self.schemas
    }

    pub fn get(&self, name: &str) -> Option<&ArtifactSchema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::UNKNOWN_USER;

    const SAMPLE: ArtifactSchema = ArtifactSchema {
        name: "sample",
        pattern: "*_Sample.csv",
        time: TimeSpec::Single("When"),
        source: Field::Constant("SAMPLE"),
        system: Some(Field::Column {
            name: "Host",
            default: "Unknown_System",
        }),
        user: None,
    };

    #[test]
    fn builtin_registry_is_valid() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(registry.len(), 21);
        assert!(registry.get("mft").is_some());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Registry::new(vec![SAMPLE, SAMPLE]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("sample".into()));
    }

    #[test]
    fn rejects_duplicate_patterns_case_insensitively() {
        let other = ArtifactSchema {
            name: "other",
            pattern: "*_SAMPLE.CSV",
            ..SAMPLE
        };
        assert!(matches!(
            Registry::new(vec![SAMPLE, other]),
            Err(RegistryError::DuplicatePattern { .. })
        ));
    }

    #[test]
    fn rejects_empty_multi_time_spec() {
        let empty = ArtifactSchema {
            time: TimeSpec::Multi(&[]),
            ..SAMPLE
        };
        assert_eq!(
            Registry::new(vec![empty]).unwrap_err(),
            RegistryError::EmptyTimeSpec("sample".into())
        );
    }

    #[test]
    fn consumed_columns_cover_time_and_identity() {
        assert_eq!(SAMPLE.consumed_columns(), vec!["When", "Host"]);

        let srum = Registry::builtin().unwrap();
        let srum = srum.get("srum").unwrap();
        let consumed = srum.consumed_columns();
        assert!(consumed.contains(&"UserName"));
        assert!(consumed.contains(&"Sid"));
    }

    #[test]
    fn column_field_falls_back_to_default() {
        let header = Header::new(vec!["UserId".into()]);
        let field = Field::Column {
            name: "UserId",
            default: UNKNOWN_USER,
        };

        let row = RawRow::new(&header, vec!["  ".into()], 2);
        assert_eq!(field.evaluate(&row), UNKNOWN_USER);

        let row = RawRow::new(&header, vec!["S-1-5-18".into()], 3);
        assert_eq!(field.evaluate(&row), "S-1-5-18");
    }
}

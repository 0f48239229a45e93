//! Fallback user resolution for artifacts without a user column.
//!
//! Strategies are tried in a fixed order:
//!
//! 1. a path-like column of the row, for the file family that carries one
//! 2. a username embedded in the export filename
//! 3. [`UNKNOWN_USER`]
//!
//! Every strategy is a pure function of its input and can be tested alone.

use regex::{Regex, RegexBuilder};

use crate::error::RegistryError;
use crate::reader::RawRow;
use crate::timeline::UNKNOWN_USER;

/// How a username is pulled out of a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRule {
    /// Name of the directory containing the referenced file.
    ParentDir,
    /// Text following the last occurrence of the marker.
    AfterMarker(&'static str),
}

/// Column-based strategy, gated on a filename marker of the file family.
#[derive(Debug, Clone)]
pub struct ColumnStrategy {
    pub family: &'static str,
    pub column: &'static str,
    pub rule: ColumnRule,
}

impl ColumnStrategy {
    pub fn applies_to(&self, filename: &str) -> bool {
        filename
            .to_ascii_lowercase()
            .contains(&self.family.to_ascii_lowercase())
    }

    pub fn extract(&self, value: &str) -> Option<String> {
        let value = value.trim();
        let user = match self.rule {
            ColumnRule::ParentDir => parent_dir_name(value)?,
            ColumnRule::AfterMarker(marker) => value.rsplit_once(marker)?.1.trim(),
        };
        (!user.is_empty()).then(|| user.to_string())
    }
}

/// Filename-based strategy: capture group 1 is the username.
#[derive(Debug, Clone)]
pub struct FilenameStrategy {
    regex: Regex,
}

impl FilenameStrategy {
    pub fn new(pattern: &str) -> Result<Self, RegistryError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| RegistryError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { regex })
    }

    pub fn extract(&self, filename: &str) -> Option<String> {
        self.regex
            .captures(filename)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|user| !user.is_empty())
    }
}

/// Where a resolved user came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOrigin {
    Column,
    Filename,
    Sentinel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub value: String,
    pub origin: UserOrigin,
}

const FILENAME_PATTERNS: &[&str] = &[
    r"Users_([^_]+)_NTUSER\.DAT\.csv$",
    r"([^_]+)_NTUSER\.csv$",
    r"([^_]+)_Activity_PackageIDs\.csv$",
    r"([^_]+)_UsrClass\.csv$",
];

#[derive(Debug, Clone)]
pub struct UserResolver {
    column_rules: Vec<ColumnStrategy>,
    filename_rules: Vec<FilenameStrategy>,
}

impl UserResolver {
    pub fn new(column_rules: Vec<ColumnStrategy>, filename_rules: Vec<FilenameStrategy>) -> Self {
        Self {
            column_rules,
            filename_rules,
        }
    }

    /// Rules for the RECmd, RBCmd, BamDam and per-user registry exports.
    pub fn builtin() -> Result<Self, RegistryError> {
        let column_rules = vec![
            ColumnStrategy {
                family: "RECmd_Batch",
                column: "HivePath",
                rule: ColumnRule::ParentDir,
            },
            ColumnStrategy {
                family: "RBCmd_Output",
                column: "SourceName",
                rule: ColumnRule::ParentDir,
            },
            ColumnStrategy {
                family: "_BamDam__",
                column: "BatchKeyPath",
                rule: ColumnRule::AfterMarker("UserSettings\\"),
            },
        ];
        let filename_rules = FILENAME_PATTERNS
            .iter()
            .map(|p| FilenameStrategy::new(p))
            .collect::<Result<_, _>>()?;
        Ok(Self::new(column_rules, filename_rules))
    }

    /// Binds the resolver to one file, evaluating filename rules once.
    pub fn for_file(&self, filename: &str) -> FileUserResolver<'_> {
        FileUserResolver {
            column_rules: self
                .column_rules
                .iter()
                .filter(|r| r.applies_to(filename))
                .collect(),
            from_filename: self.filename_rules.iter().find_map(|r| r.extract(filename)),
        }
    }

    pub fn resolve(&self, row: &RawRow<'_>, filename: &str) -> ResolvedUser {
        self.for_file(filename).resolve(row)
    }
}

/// A [`UserResolver`] specialised to one filename.
#[derive(Debug)]
pub struct FileUserResolver<'a> {
    column_rules: Vec<&'a ColumnStrategy>,
    from_filename: Option<String>,
}

impl FileUserResolver<'_> {
    /// Total: always yields a user, falling back to the sentinel.
    pub fn resolve(&self, row: &RawRow<'_>) -> ResolvedUser {
        let from_column = self
            .column_rules
            .iter()
            .find_map(|r| row.non_empty(r.column).and_then(|v| r.extract(v)));
        if let Some(value) = from_column {
            return ResolvedUser {
                value,
                origin: UserOrigin::Column,
            };
        }

        match &self.from_filename {
            Some(value) => ResolvedUser {
                value: value.clone(),
                origin: UserOrigin::Filename,
            },
            None => ResolvedUser {
                value: UNKNOWN_USER.to_string(),
                origin: UserOrigin::Sentinel,
            },
        }
    }
}

/// Last directory component of a Windows or POSIX path.
fn parent_dir_name(path: &str) -> Option<&str> {
    let segments: Vec<&str> = path.split(['/', '\\']).collect();
    match segments.as_slice() {
        [.., parent, _] => Some(parent.trim()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Header;
    use rstest::rstest;

    #[rstest]
    #[case(r"C:\Users\bob\NTUSER.DAT", Some("bob"))]
    #[case("/mnt/image/Users/alice/NTUSER.DAT", Some("alice"))]
    #[case(r"C:\$Recycle.Bin\S-1-5-21-1001\$IABC.txt", Some("S-1-5-21-1001"))]
    #[case("NTUSER.DAT", None)]
    fn parent_dir_of_path(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(parent_dir_name(path), expected);
    }

    #[rstest]
    #[case("20240101_UserAssist__C_Users_bob_NTUSER.DAT.csv", Some("bob"))]
    #[case("20240101_RunMRU__C_Users_Carol_NTUSER.DAT.csv", Some("Carol"))]
    #[case("20240101_dave_NTUSER.csv", Some("dave"))]
    #[case("erin_Activity_PackageIDs.csv", Some("erin"))]
    #[case("frank_UsrClass.csv", Some("frank"))]
    #[case("20240101_Amcache_DriveBinaries.csv", None)]
    fn username_from_filename(#[case] filename: &str, #[case] expected: Option<&str>) {
        let resolver = UserResolver::builtin().unwrap();
        let bound = resolver.for_file(filename);
        assert_eq!(bound.from_filename.as_deref(), expected);
    }

    #[test]
    fn hive_path_column_wins_over_filename() {
        let resolver = UserResolver::builtin().unwrap();
        let header = Header::new(vec!["HivePath".into(), "LastWriteTimestamp".into()]);
        let row = RawRow::new(
            &header,
            vec![r"C:\Users\bob\NTUSER.DAT".into(), "2020-01-01".into()],
            2,
        );

        let user = resolver.resolve(&row, "x_RECmd_Batch_UserActivity_Output.csv");
        assert_eq!(user.value, "bob");
        assert_eq!(user.origin, UserOrigin::Column);
    }

    #[test]
    fn column_rule_is_gated_by_family() {
        let resolver = UserResolver::builtin().unwrap();
        let header = Header::new(vec!["HivePath".into()]);
        let row = RawRow::new(&header, vec![r"C:\Users\bob\NTUSER.DAT".into()], 2);

        let user = resolver.resolve(&row, "x_Amcache_DriveBinaries.csv");
        assert_eq!(user.origin, UserOrigin::Sentinel);
        assert_eq!(user.value, UNKNOWN_USER);
    }

    #[test]
    fn bam_key_path_yields_sid() {
        let resolver = UserResolver::builtin().unwrap();
        let header = Header::new(vec!["BatchKeyPath".into()]);
        let filename = "x_BamDam__C_Windows_System32_config_SYSTEM.csv";

        let row = RawRow::new(
            &header,
            vec![r"ControlSet001\Services\bam\State\UserSettings\S-1-5-21-42".into()],
            2,
        );
        assert_eq!(resolver.resolve(&row, filename).value, "S-1-5-21-42");

        let row = RawRow::new(&header, vec![r"ControlSet001\Services\bam".into()], 3);
        assert_eq!(resolver.resolve(&row, filename).origin, UserOrigin::Sentinel);
    }

    #[test]
    fn blank_column_falls_through_to_filename() {
        let resolver = UserResolver::builtin().unwrap();
        let header = Header::new(vec!["HivePath".into()]);
        let row = RawRow::new(&header, vec!["".into()], 2);

        // a RECmd export whose name also happens to carry a user
        let user = resolver.resolve(&row, "x_RECmd_Batch_gina_UsrClass.csv");
        assert_eq!(user.value, "gina");
        assert_eq!(user.origin, UserOrigin::Filename);
    }
}

//! Row projection: raw artifact rows in, canonical timeline events out.
//!
//! Single-timestamp schemas emit one event per row. Multi-timestamp schemas
//! group a row's parseable timestamps by value and emit one event per
//! distinct value, prefixed with the sorted labels of the columns that
//! share it, e.g. `[C1C3]`.

use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, warn};

use crate::description::DescriptionBuilder;
use crate::error::NormalizeError;
use crate::reader::{CsvFile, Header, RawRow};
use crate::schemas::{ArtifactSchema, TimeSpec};
use crate::timeline::{TimelineEvent, UNKNOWN_SYSTEM};
use crate::timestamp;
use crate::user::{FileUserResolver, UserOrigin, UserResolver};

/// Row and event counts for one file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionStats {
    pub bytes_in: u64,
    pub rows_in: usize,
    /// Rows without a single parseable timestamp.
    pub rows_dropped: usize,
    /// Records the CSV decoder rejected.
    pub rows_malformed: usize,
    pub events_out: usize,
    /// Rows whose user fell back to the sentinel.
    pub user_fallbacks: usize,
}

#[derive(Debug, Default, Clone)]
pub struct FileOutput {
    pub events: Vec<TimelineEvent>,
    pub stats: ProjectionStats,
}

/// Per-file state shared by every row of that file.
struct FileContext<'a> {
    filename: &'a str,
    schema: &'a ArtifactSchema,
    excluded: Vec<&'static str>,
    users: FileUserResolver<'a>,
}

pub struct RecordProjector<'a> {
    users: &'a UserResolver,
    descriptions: DescriptionBuilder,
}

impl<'a> RecordProjector<'a> {
    pub fn new(users: &'a UserResolver, descriptions: DescriptionBuilder) -> Self {
        Self {
            users,
            descriptions,
        }
    }

    /// Read and project one artifact file.
    pub fn project_file(
        &self,
        path: &Path,
        schema: &ArtifactSchema,
    ) -> Result<FileOutput, NormalizeError> {
        let csv = CsvFile::open(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let mut output = self.project(csv.header(), csv.rows(), &filename, schema, path)?;
        output.stats.bytes_in = csv.size();
        Ok(output)
    }

    /// Project decoded rows. Fails only when the header lacks a timestamp
    /// column the schema requires.
    pub fn project<'h, I>(
        &self,
        header: &Header,
        rows: I,
        filename: &str,
        schema: &ArtifactSchema,
        path: &Path,
    ) -> Result<FileOutput, NormalizeError>
    where
        I: IntoIterator<Item = Result<RawRow<'h>, csv::Error>>,
    {
        let missing = schema.time.missing_from(header);
        if !missing.is_empty() {
            return Err(NormalizeError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }

        let ctx = FileContext {
            filename,
            schema,
            excluded: schema.consumed_columns(),
            users: self.users.for_file(filename),
        };

        let mut output = FileOutput::default();
        for row in rows {
            output.stats.rows_in += 1;
            match row {
                Ok(row) => self.project_row(&ctx, &row, &mut output),
                Err(e) => {
                    output.stats.rows_malformed += 1;
                    warn!(file = %filename, error = %e, "Malformed record skipped");
                }
            }
        }
        output.stats.events_out = output.events.len();

        if output.stats.user_fallbacks > 0 {
            warn!(
                file = %filename,
                rows = output.stats.user_fallbacks,
                "Could not determine user, defaulted to Unknown_User"
            );
        }
        if output.stats.rows_in > 0 && output.events.is_empty() {
            warn!(file = %filename, "No valid timestamps found");
        }

        Ok(output)
    }

    fn project_row(&self, ctx: &FileContext<'_>, row: &RawRow<'_>, output: &mut FileOutput) {
        let times = match ctx.schema.time {
            TimeSpec::Single(column) => {
                let raw = row.get(column).unwrap_or_default();
                match timestamp::parse(raw) {
                    Some(ts) => vec![(ts, None)],
                    None => {
                        warn!(
                            file = %ctx.filename,
                            line = row.line(),
                            column,
                            value = raw,
                            "Unparseable timestamp, row dropped"
                        );
                        output.stats.rows_dropped += 1;
                        return;
                    }
                }
            }
            TimeSpec::Multi(fields) => {
                let groups = fan_out(row, fields);
                if groups.is_empty() {
                    warn!(
                        file = %ctx.filename,
                        line = row.line(),
                        "No parseable timestamp in row, row dropped"
                    );
                    output.stats.rows_dropped += 1;
                    return;
                }
                groups
                    .into_iter()
                    .map(|(ts, labels)| (ts, Some(labels)))
                    .collect()
            }
        };

        let source = ctx.schema.source.evaluate(row).into_owned();
        let system = match &ctx.schema.system {
            Some(field) => field.evaluate(row).into_owned(),
            None => UNKNOWN_SYSTEM.to_string(),
        };
        let user = match &ctx.schema.user {
            Some(field) => field.evaluate(row).into_owned(),
            None => {
                let resolved = ctx.users.resolve(row);
                if resolved.origin == UserOrigin::Sentinel {
                    output.stats.user_fallbacks += 1;
                }
                resolved.value
            }
        };
        let description = self.descriptions.build(row, &ctx.excluded);

        for (time, labels) in times {
            let description = match labels {
                Some(labels) => prefixed(&labels, &description),
                None => description.clone(),
            };
            output.events.push(TimelineEvent {
                time,
                source: source.clone(),
                system: system.clone(),
                user: user.clone(),
                description,
            });
        }
    }
}

/// Group a row's labeled timestamps by value.
///
/// Returns one `(time, "[labels]")` pair per distinct parsed value, in order
/// of first appearance. Labels within a group are sorted. Columns that are
/// blank or unparseable are left out.
pub fn fan_out(row: &RawRow<'_>, fields: &[(&str, &str)]) -> Vec<(NaiveDateTime, String)> {
    let mut groups: Vec<(NaiveDateTime, Vec<&str>)> = Vec::with_capacity(fields.len());

    for &(column, label) in fields {
        let Some(raw) = row.get(column) else { continue };
        let Some(ts) = timestamp::parse(raw) else {
            if !raw.trim().is_empty() {
                debug!(line = row.line(), column, value = raw, "Unparseable timestamp column");
            }
            continue;
        };
        match groups.iter_mut().find(|(t, _)| *t == ts) {
            Some((_, labels)) => labels.push(label),
            None => groups.push((ts, vec![label])),
        }
    }

    groups
        .into_iter()
        .map(|(ts, mut labels)| {
            labels.sort_unstable();
            (ts, format!("[{}]", labels.concat()))
        })
        .collect()
}

fn prefixed(labels: &str, description: &str) -> String {
    if description.is_empty() {
        labels.to_string()
    } else {
        format!("{labels} {description}")
    }
}

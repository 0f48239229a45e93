//! Run orchestration: walk, match, project, assemble.

use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};

use crate::assembler::{self, FileResult, RunReport};
use crate::description::DescriptionBuilder;
use crate::error::{NormalizeError, RegistryError};
use crate::matcher::{MatchOutcome, PatternMatcher};
use crate::normalizer::RecordProjector;
use crate::schemas::Registry;
use crate::timeline::MasterTimeline;
use crate::user::UserResolver;
use crate::walker;

pub struct Pipeline<'r> {
    matcher: PatternMatcher<'r>,
    users: UserResolver,
    descriptions: DescriptionBuilder,
    threads: Option<usize>,
}

impl<'r> Pipeline<'r> {
    pub fn new(
        registry: &'r Registry,
        users: UserResolver,
        descriptions: DescriptionBuilder,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            matcher: PatternMatcher::new(registry)?,
            users,
            descriptions,
            threads: None,
        })
    }

    /// Worker count for the `parallel` feature. Ignored otherwise.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Normalize every CSV file under `root` into one sorted timeline.
    pub fn run(&self, root: &Path) -> (MasterTimeline, RunReport) {
        let files = walker::csv_files(root);
        info!(root = %root.display(), files = files.len(), "Scanning input");

        let results = self.process_all(&files);
        let (timeline, report) = assembler::assemble(results);

        info!(
            attempted = report.files_attempted,
            processed = report.files_processed,
            skipped = report.files_skipped,
            failed = report.files_failed,
            rows = report.rows_in,
            dropped = report.rows_dropped,
            events = report.events_out,
            "Run complete"
        );
        (timeline, report)
    }

    #[cfg(feature = "parallel")]
    fn process_all(&self, files: &[PathBuf]) -> Vec<FileResult> {
        use rayon::prelude::*;
        use tracing::warn;

        let projector = RecordProjector::new(&self.users, self.descriptions);
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = self.threads {
            builder = builder.num_threads(n);
        }
        match builder.build() {
            // collect keeps walk order regardless of completion order
            Ok(pool) => pool.install(|| {
                files
                    .par_iter()
                    .enumerate()
                    .map(|(i, path)| self.process_file(&projector, path, i, files.len()))
                    .collect()
            }),
            Err(e) => {
                warn!(error = %e, "Could not build worker pool, processing sequentially");
                files
                    .iter()
                    .enumerate()
                    .map(|(i, path)| self.process_file(&projector, path, i, files.len()))
                    .collect()
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn process_all(&self, files: &[PathBuf]) -> Vec<FileResult> {
        let projector = RecordProjector::new(&self.users, self.descriptions);
        files
            .iter()
            .enumerate()
            .map(|(i, path)| self.process_file(&projector, path, i, files.len()))
            .collect()
    }

    /// `index` is the position of `path` in walk order, out of `total`.
    fn process_file(
        &self,
        projector: &RecordProjector<'_>,
        path: &Path,
        index: usize,
        total: usize,
    ) -> FileResult {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _span = info_span!("file", name = %filename, n = index + 1, of = total).entered();

        let schema = match self.matcher.resolve(&filename) {
            MatchOutcome::Matched(schema) => schema,
            MatchOutcome::Unmatched => {
                info!("No matching schema, skipped");
                return FileResult::Skipped {
                    path: path.to_path_buf(),
                    reason: "no matching schema".to_string(),
                };
            }
            MatchOutcome::Ambiguous(candidates) => {
                let err = NormalizeError::AmbiguousSchema {
                    filename,
                    candidates: candidates.iter().map(|c| c.to_string()).collect(),
                };
                error!(error = %err, "Schema configuration error, file failed");
                return FileResult::Failed {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                };
            }
        };

        match projector.project_file(path, schema) {
            Ok(output) => {
                info!(
                    schema = schema.name,
                    rows = output.stats.rows_in,
                    events = output.stats.events_out,
                    remaining = total - index - 1,
                    "Processed"
                );
                FileResult::Processed {
                    path: path.to_path_buf(),
                    output,
                }
            }
            Err(e) => {
                error!(schema = schema.name, error = %e, "File failed");
                FileResult::Failed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Build a pipeline over the built-in registry and user rules.
pub fn builtin(
    registry: &Registry,
    descriptions: DescriptionBuilder,
) -> Result<Pipeline<'_>, RegistryError> {
    Pipeline::new(registry, UserResolver::builtin()?, descriptions)
}

//! Aggregation of per-file results into the master timeline.

use serde::Serialize;
use std::path::PathBuf;

use crate::normalizer::{FileOutput, ProjectionStats};
use crate::timeline::{MasterTimeline, TimelineEvent};

/// A file that did not contribute, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNote {
    pub path: PathBuf,
    pub reason: String,
}

/// Counters and per-file notes for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub files_attempted: usize,
    /// Files whose schema was resolved and that were projected.
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub bytes_in: u64,
    pub rows_in: usize,
    pub rows_dropped: usize,
    pub rows_malformed: usize,
    pub events_out: usize,
    pub skipped: Vec<FileNote>,
    pub failed: Vec<FileNote>,
}

impl RunReport {
    /// True when at least one file matched a schema. Every failure happens
    /// after matching, so failed files count.
    pub fn any_matched(&self) -> bool {
        self.files_processed + self.files_failed > 0
    }
}

/// Outcome of one input file, in walk order.
#[derive(Debug)]
pub enum FileResult {
    Processed { path: PathBuf, output: FileOutput },
    Skipped { path: PathBuf, reason: String },
    Failed { path: PathBuf, reason: String },
}

#[derive(Debug, Default)]
pub struct TimelineAssembler {
    events: Vec<TimelineEvent>,
    report: RunReport,
}

impl TimelineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one file. Must be called in walk order.
    pub fn push(&mut self, result: FileResult) {
        self.report.files_attempted += 1;
        match result {
            FileResult::Processed { output, .. } => {
                self.report.files_processed += 1;
                self.add_stats(&output.stats);
                self.events.extend(output.events);
            }
            FileResult::Skipped { path, reason } => {
                self.report.files_skipped += 1;
                self.report.skipped.push(FileNote { path, reason });
            }
            FileResult::Failed { path, reason } => {
                self.report.files_failed += 1;
                self.report.failed.push(FileNote { path, reason });
            }
        }
    }

    fn add_stats(&mut self, stats: &ProjectionStats) {
        self.report.bytes_in += stats.bytes_in;
        self.report.rows_in += stats.rows_in;
        self.report.rows_dropped += stats.rows_dropped;
        self.report.rows_malformed += stats.rows_malformed;
    }

    /// Sort everything pushed so far into the master timeline.
    pub fn finish(self) -> (MasterTimeline, RunReport) {
        let timeline = MasterTimeline::from_unsorted(self.events);
        let mut report = self.report;
        report.events_out = timeline.len();
        (timeline, report)
    }
}

/// Concatenate per-file results in order and sort.
pub fn assemble<I>(results: I) -> (MasterTimeline, RunReport)
where
    I: IntoIterator<Item = FileResult>,
{
    let mut assembler = TimelineAssembler::new();
    for result in results {
        assembler.push(result);
    }
    assembler.finish()
}

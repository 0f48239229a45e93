//! tlnorm: normalize forensic artifact CSV exports into one timeline.
//!
//! Each export is classified by filename into an [`schemas::ArtifactSchema`],
//! its rows are projected into five-field [`timeline::TimelineEvent`]s, and
//! all events are merged into a sorted [`timeline::MasterTimeline`] that the
//! [`output`] sinks write out.
//!
//! ```no_run
//! use tlnorm::description::DescriptionBuilder;
//! use tlnorm::schemas::Registry;
//!
//! # fn main() -> anyhow::Result<()> {
//! let registry = Registry::builtin()?;
//! let pipeline = tlnorm::pipeline::builtin(&registry, DescriptionBuilder::default())?;
//! let (timeline, report) = pipeline.run("kape_out".as_ref());
//! println!("{} events from {} files", timeline.len(), report.files_processed);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod config;
pub mod description;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod schemas;
pub mod timeline;
pub mod timestamp;
pub mod user;
pub mod walker;

//! Output sinks for the master timeline.

pub mod flat;
pub mod postgres;

use tracing::{error, info};

pub use flat::{FlatFormat, FlatSink};
pub use postgres::PostgresSink;

use crate::error::SinkError;
use crate::timeline::MasterTimeline;

pub enum Sink {
    Flat(FlatSink),
    Postgres(PostgresSink),
}

impl Sink {
    pub fn name(&self) -> &'static str {
        match self {
            Sink::Flat(_) => "flat file",
            Sink::Postgres(_) => "postgres",
        }
    }

    pub fn write(&self, timeline: &MasterTimeline) -> Result<usize, SinkError> {
        match self {
            Sink::Flat(sink) => sink.write(timeline),
            Sink::Postgres(sink) => sink.write(timeline),
        }
    }
}

/// Outcome of one sink.
#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: &'static str,
    pub result: Result<usize, SinkError>,
}

/// Run every sink in order. A failing sink does not stop the others.
pub fn write_all(sinks: &[Sink], timeline: &MasterTimeline) -> Vec<SinkOutcome> {
    sinks
        .iter()
        .map(|sink| {
            let result = sink.write(timeline);
            match &result {
                Ok(rows) => info!(sink = sink.name(), rows, "Sink complete"),
                Err(e) => error!(sink = sink.name(), error = %e, "Sink failed"),
            }
            SinkOutcome {
                sink: sink.name(),
                result,
            }
        })
        .collect()
}

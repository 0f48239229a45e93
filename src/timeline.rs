//! Canonical timeline records.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

use crate::timestamp;

/// Sentinel used when the system cannot be determined.
pub const UNKNOWN_SYSTEM: &str = "Unknown_System";
/// Sentinel used when the user cannot be determined.
pub const UNKNOWN_USER: &str = "Unknown_User";

/// One canonical five-field timeline record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    #[serde(rename = "Time", serialize_with = "serialize_time")]
    pub time: NaiveDateTime,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "System")]
    pub system: String,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl TimelineEvent {
    /// Ordering key of the master timeline. Description is not part of it.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.system.cmp(&other.system))
            .then_with(|| self.user.cmp(&other.user))
    }

    /// The five output fields in column order.
    pub fn fields(&self) -> [String; 5] {
        [
            timestamp::format(&self.time),
            self.source.clone(),
            self.system.clone(),
            self.user.clone(),
            self.description.clone(),
        ]
    }
}

fn serialize_time<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&timestamp::format(ts))
}

/// Column naming used by a sink. Both layouts carry the same five fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Layout {
    /// Time, Source, System, User, Description
    #[default]
    Canonical,
    /// Date, Source, Host, User, Desc
    Legacy,
}

impl Layout {
    pub fn header(self) -> [&'static str; 5] {
        match self {
            Layout::Canonical => ["Time", "Source", "System", "User", "Description"],
            Layout::Legacy => ["Date", "Source", "Host", "User", "Desc"],
        }
    }
}

/// The sorted, immutable result of one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MasterTimeline {
    events: Vec<TimelineEvent>,
}

impl MasterTimeline {
    /// Stable-sorts `events` into timeline order.
    pub fn from_unsorted(mut events: Vec<TimelineEvent>) -> Self {
        #[cfg(feature = "parallel")]
        {
            use rayon::slice::ParallelSliceMut;
            events.par_sort_by(TimelineEvent::cmp_key);
        }
        #[cfg(not(feature = "parallel"))]
        events.sort_by(TimelineEvent::cmp_key);

        Self { events }
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimelineEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a MasterTimeline {
    type Item = &'a TimelineEvent;
    type IntoIter = std::slice::Iter<'a, TimelineEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

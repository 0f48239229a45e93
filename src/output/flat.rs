use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::description::sanitize;
use crate::error::SinkError;
use crate::timeline::{Layout, MasterTimeline, TimelineEvent};

/// File stem of the flat timeline.
pub const FILE_STEM: &str = "master_timeline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FlatFormat {
    /// Comma separated, RFC 4180 quoting
    #[default]
    Csv,
    /// Tab separated, never quoted
    Tsv,
    /// One JSON object per line
    Jsonl,
}

impl FlatFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FlatFormat::Csv => "csv",
            FlatFormat::Tsv => "tsv",
            FlatFormat::Jsonl => "jsonl",
        }
    }

    /// Field delimiter kept out of every written value. JSON lines have none
    /// of their own, so the tab default applies.
    pub fn delimiter(self) -> char {
        match self {
            FlatFormat::Csv => ',',
            FlatFormat::Tsv | FlatFormat::Jsonl => '\t',
        }
    }
}

pub enum Writer {
    Csv(csv::Writer<BufWriter<File>>, bool), // bool tracks if the header is still owed
    Tsv(csv::Writer<BufWriter<File>>, bool),
    Jsonl(BufWriter<File>),
}

impl Writer {
    /// Open `path` for appending. The header is owed only when the file is
    /// empty at open time.
    pub fn open(path: &Path, format: FlatFormat) -> Result<Self, SinkError> {
        let io_err = |source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        let needs_header = len == 0;
        if len > 0 {
            // appended records must start on a fresh line
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(len - 1)).map_err(io_err)?;
            file.read_exact(&mut last).map_err(io_err)?;
            if last[0] != b'\n' {
                file.write_all(b"\n").map_err(io_err)?;
            }
        }
        let buf = BufWriter::new(file);

        Ok(match format {
            FlatFormat::Csv => Writer::Csv(
                csv::WriterBuilder::new().has_headers(false).from_writer(buf),
                needs_header,
            ),
            FlatFormat::Tsv => Writer::Tsv(
                csv::WriterBuilder::new()
                    .has_headers(false)
                    .delimiter(b'\t')
                    .quote_style(csv::QuoteStyle::Never)
                    .from_writer(buf),
                needs_header,
            ),
            FlatFormat::Jsonl => Writer::Jsonl(buf),
        })
    }

    pub fn write_batch(
        &mut self,
        events: &[TimelineEvent],
        layout: Layout,
        path: &Path,
    ) -> Result<(), SinkError> {
        let csv_err = |source| SinkError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let delimiter = match self {
            Writer::Tsv(..) => '\t',
            _ => ',',
        };

        match self {
            Writer::Csv(writer, header_owed) | Writer::Tsv(writer, header_owed) => {
                if *header_owed {
                    writer.write_record(layout.header()).map_err(csv_err)?;
                    *header_owed = false;
                }
                for event in events {
                    let fields = event.fields();
                    writer
                        .write_record(fields.iter().map(|f| sanitize(f, delimiter).into_owned()))
                        .map_err(csv_err)?;
                }
            }
            Writer::Jsonl(writer) => {
                for event in events {
                    let line = match layout {
                        Layout::Canonical => serde_json::to_string(event)?,
                        Layout::Legacy => serde_json::to_string(&LegacyRecord::from(event))?,
                    };
                    writeln!(writer, "{line}").map_err(|source| SinkError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                }
            }
        }
        Ok(())
    }

    pub fn finish(self, path: &Path) -> Result<(), SinkError> {
        let io_err = |source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        };
        match self {
            Writer::Csv(mut writer, _) | Writer::Tsv(mut writer, _) => writer.flush().map_err(io_err),
            Writer::Jsonl(mut writer) => writer.flush().map_err(io_err),
        }
    }
}

/// JSON shape of the legacy layout.
#[derive(Serialize)]
struct LegacyRecord<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Source")]
    source: &'a str,
    #[serde(rename = "Host")]
    host: &'a str,
    #[serde(rename = "User")]
    user: &'a str,
    #[serde(rename = "Desc")]
    desc: &'a str,
}

impl<'a> From<&'a TimelineEvent> for LegacyRecord<'a> {
    fn from(event: &'a TimelineEvent) -> Self {
        Self {
            date: crate::timestamp::format(&event.time),
            source: &event.source,
            host: &event.system,
            user: &event.user,
            desc: &event.description,
        }
    }
}

/// Append-only flat-file sink writing `<dir>/master_timeline.<ext>`.
#[derive(Debug, Clone)]
pub struct FlatSink {
    path: PathBuf,
    format: FlatFormat,
    layout: Layout,
}

impl FlatSink {
    pub fn new(dir: &Path, format: FlatFormat, layout: Layout) -> Self {
        Self {
            path: dir.join(format!("{FILE_STEM}.{}", format.extension())),
            format,
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the timeline. Returns the number of events written.
    pub fn write(&self, timeline: &MasterTimeline) -> Result<usize, SinkError> {
        let mut writer = Writer::open(&self.path, self.format)?;
        writer.write_batch(timeline.events(), self.layout, &self.path)?;
        writer.finish(&self.path)?;
        Ok(timeline.len())
    }
}

//! Command line and environment configuration.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::logging::{LogFormat, LogLevel};
use crate::output::FlatFormat;
use crate::timeline::Layout;

/// Which sinks receive the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputType {
    Csv,
    Postgres,
    Both,
}

impl OutputType {
    pub fn wants_flat(self) -> bool {
        matches!(self, OutputType::Csv | OutputType::Both)
    }

    pub fn wants_postgres(self) -> bool {
        matches!(self, OutputType::Postgres | OutputType::Both)
    }

    fn as_str(self) -> &'static str {
        match self {
            OutputType::Csv => "csv",
            OutputType::Postgres => "postgres",
            OutputType::Both => "both",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Normalize EZTools/KAPE CSV exports into one master timeline",
    long_about = None
)]
pub struct Args {
    /// Folder containing the tool CSV exports (searched recursively)
    #[arg(short, long, env = "TLNORM_INPUT")]
    pub input: PathBuf,

    /// Folder for the flat timeline and the log file, created if missing
    #[arg(short, long, env = "TLNORM_OUTPUT")]
    pub output: PathBuf,

    #[arg(short = 't', long = "type", value_enum, env = "TLNORM_TYPE")]
    pub output_type: OutputType,

    /// PostgreSQL URL, required for `postgres` and `both`
    #[arg(short, long, env = "DATABASE_URL", hide_env_values = true)]
    pub db_url: Option<String>,

    #[arg(long, value_enum, default_value_t = FlatFormat::Csv, env = "TLNORM_FORMAT")]
    pub format: FlatFormat,

    #[arg(long, value_enum, default_value_t = Layout::Canonical, env = "TLNORM_LAYOUT")]
    pub layout: Layout,

    /// Worker threads (only with the `parallel` feature)
    #[arg(long, env = "TLNORM_THREADS")]
    pub threads: Option<usize>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info, env = "TLNORM_LOG_LEVEL")]
    pub log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "TLNORM_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[arg(long)]
    pub benchmark: bool,
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub output_type: OutputType,
    pub db_url: Option<String>,
    pub format: FlatFormat,
    pub layout: Layout,
    pub threads: Option<usize>,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    pub benchmark: bool,
}

impl Args {
    /// Validate the arguments and create the output folder.
    pub fn into_config(self) -> Result<RunConfig, ConfigError> {
        let db_url = self.db_url.filter(|url| !url.trim().is_empty());
        if self.output_type.wants_postgres() && db_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl(
                self.output_type.as_str().to_string(),
            ));
        }

        if !self.input.is_dir() {
            return Err(ConfigError::MissingInput(self.input));
        }

        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }

        std::fs::create_dir_all(&self.output).map_err(|source| ConfigError::OutputDir {
            path: self.output.clone(),
            source,
        })?;

        Ok(RunConfig {
            input: self.input,
            output: self.output,
            output_type: self.output_type,
            db_url,
            format: self.format,
            layout: self.layout,
            threads: self.threads,
            log_level: self.log_level,
            log_format: self.log_format,
            benchmark: self.benchmark,
        })
    }
}

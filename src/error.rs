//! Error types for tlnorm.
//!
//! Each layer owns one enum. Per-file and per-row failures never leave the
//! pipeline as errors: they are logged and recorded in the run report.

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the schema table itself, detected when it is built.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate schema name: {0}")]
    DuplicateName(String),

    #[error("schemas '{first}' and '{second}' share the pattern '{pattern}'")]
    DuplicatePattern {
        first: String,
        second: String,
        pattern: String,
    },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("schema '{0}' declares an empty timestamp list")]
    EmptyTimeSpec(String),
}

/// Failure to normalize one input file. The file contributes zero events.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no header row")]
    EmptyFile { path: PathBuf },

    #[error("timestamp column(s) {missing:?} not found in {path}")]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("{filename} matches several equally specific schemas: {candidates:?}")]
    AmbiguousSchema {
        filename: String,
        candidates: Vec<String>,
    },
}

/// Failure of one output sink. Other sinks still run.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to start database runtime: {0}")]
    Runtime(std::io::Error),
}

/// Invalid command line or environment configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("--db-url is required when --type is '{0}'")]
    MissingDatabaseUrl(String),

    #[error("input folder '{0}' does not exist")]
    MissingInput(PathBuf),

    #[error("--threads must be at least 1")]
    ZeroThreads,

    #[error("failed to create output folder '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

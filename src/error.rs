// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can stop a run. Each class aborts the pipeline; none is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("empty result: {0}")]
    EmptyResult(EmptyReason),

    #[error("rendering chart failed: {0}")]
    Render(String),

    #[error("writing table to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading payload from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON payload: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed CSV payload: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("payload is not an array of records")]
    NotAnArray,

    #[error("required column `{column}` is missing")]
    MissingColumn { column: &'static str },

    #[error("row {row}: unparsable week_ending `{value}`")]
    InvalidDate { row: usize, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The source returned zero rows for the window and region.
    NoRows,
    /// Every observation fell under the per-observation floor.
    NothingAboveFloor,
    /// Every week was dropped by the zero-row policy.
    NoWeeks,
    /// No variant reached the aggregate floor.
    NoVariants,
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            EmptyReason::NoRows => "source returned no rows for the window and region",
            EmptyReason::NothingAboveFloor => "no observation reached the per-observation floor",
            EmptyReason::NoWeeks => "every week had a zero total and was dropped",
            EmptyReason::NoVariants => "no variant reached the aggregate floor",
        };
        f.write_str(msg)
    }
}

impl Error {
    /// Wrap any drawing-backend failure, keeping only its message.
    pub(crate) fn render(err: impl std::fmt::Display) -> Self {
        Error::Render(err.to_string())
    }
}

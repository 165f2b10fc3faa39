// src/fetch/mod.rs

use crate::config::SourceKind;
use crate::error::{EmptyReason, Error, FetchError, Result};
use chrono::NaiveDate;
use std::{fs, path::PathBuf};
use tracing::{debug, info};
use url::Url;

pub mod http;
pub mod payload;

pub use http::SocrataClient;
pub use payload::{decode_csv, decode_json};

pub const JSON_ENDPOINT: &str = "https://data.cdc.gov/resource/jr58-6ysp.json";
pub const CSV_ENDPOINT: &str = "https://data.cdc.gov/resource/jr58-6ysp.csv";

/// One (week, variant) row exactly as the dataset reports it. Parsing of the
/// date and share happens during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    pub week_ending: String,
    pub variant: String,
    pub region: Option<String>,
    pub share: Option<String>,
}

/// Time window, region and row cap for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub region: String,
    pub cutoff: NaiveDate,
    pub limit: u32,
}

impl Query {
    /// SoQL `$where` expression.
    pub fn where_clause(&self) -> String {
        format!(
            "week_ending >= '{}' AND usa_or_hhsregion = '{}'",
            self.cutoff.format("%Y-%m-%d"),
            self.region.replace('\'', "''")
        )
    }

    pub fn url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("$limit", &self.limit.to_string())
            .append_pair("$where", &self.where_clause());
        url
    }
}

/// A source of raw observations for a query.
pub trait Fetcher {
    fn fetch(&self, query: &Query) -> Result<Vec<RawObservation>>;

    /// Short name for logs.
    fn describe(&self) -> String;
}

/// The dataset's JSON representation.
pub struct JsonFetcher {
    client: SocrataClient,
    endpoint: Url,
}

impl JsonFetcher {
    pub fn new(client: SocrataClient, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl Fetcher for JsonFetcher {
    #[tracing::instrument(level = "info", skip(self), fields(endpoint = %self.endpoint))]
    fn fetch(&self, query: &Query) -> Result<Vec<RawObservation>> {
        let body = self.client.get_text(&self.endpoint, query)?;
        finish(decode_json(&body)?, query)
    }

    fn describe(&self) -> String {
        format!("json {}", self.endpoint)
    }
}

/// The dataset's CSV representation.
pub struct CsvFetcher {
    client: SocrataClient,
    endpoint: Url,
}

impl CsvFetcher {
    pub fn new(client: SocrataClient, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl Fetcher for CsvFetcher {
    #[tracing::instrument(level = "info", skip(self), fields(endpoint = %self.endpoint))]
    fn fetch(&self, query: &Query) -> Result<Vec<RawObservation>> {
        let body = self.client.get_text(&self.endpoint, query)?;
        finish(decode_csv(&body)?, query)
    }

    fn describe(&self) -> String {
        format!("csv {}", self.endpoint)
    }
}

/// A payload saved to disk earlier. The date window is not re-applied: the
/// file is taken as the server's answer to the query.
pub struct FileFetcher {
    path: PathBuf,
    format: SourceKind,
}

impl FileFetcher {
    /// `.csv` files decode as CSV, everything else as JSON.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let format = if is_csv {
            SourceKind::Csv
        } else {
            SourceKind::Json
        };
        Self { path, format }
    }

    pub fn with_format(path: impl Into<PathBuf>, format: SourceKind) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

impl Fetcher for FileFetcher {
    #[tracing::instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    fn fetch(&self, query: &Query) -> Result<Vec<RawObservation>> {
        let body = fs::read_to_string(&self.path).map_err(|source| FetchError::Read {
            path: self.path.clone(),
            source,
        })?;
        let rows = match self.format {
            SourceKind::Json => decode_json(&body)?,
            SourceKind::Csv => decode_csv(&body)?,
        };
        finish(rows, query)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Drop rows for other regions and refuse an empty answer.
fn finish(mut rows: Vec<RawObservation>, query: &Query) -> Result<Vec<RawObservation>> {
    let before = rows.len();
    rows.retain(|r| r.region.as_deref().map_or(true, |reg| reg == query.region));
    if rows.len() != before {
        debug!(
            dropped = before - rows.len(),
            region = %query.region,
            "dropped rows for other regions"
        );
    }
    if rows.is_empty() {
        return Err(Error::EmptyResult(EmptyReason::NoRows));
    }
    info!(rows = rows.len(), "fetched observations");
    Ok(rows)
}

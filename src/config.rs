// src/config.rs

use crate::error::{Error, Result};
use crate::fetch::{Query, CSV_ENDPOINT, JSON_ENDPOINT};
use crate::process::ZeroRowPolicy;
use chrono::{Duration as ChronoDuration, NaiveDate};
use clap::{Parser, ValueEnum};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Longest accepted lookback, about a century.
pub const MAX_WEEKS: u32 = 5200;

/// Which representation of the dataset to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Json,
    Csv,
}

impl SourceKind {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            SourceKind::Json => JSON_ENDPOINT,
            SourceKind::Csv => CSV_ENDPOINT,
        }
    }
}

/// The three materiality cut-offs, each applied at a different stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Per-observation floor, applied before aggregation.
    pub observation_floor: f64,
    /// Minimum column sum across the window for a variant to be charted.
    pub aggregate_floor: f64,
    /// Segments must exceed this to carry an inline label.
    pub label_floor: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            observation_floor: 0.01,
            aggregate_floor: 0.01,
            label_floor: 0.05,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "variantshare",
    version,
    about = "Chart recent SARS-CoV-2 variant proportions from the CDC variant-share dataset"
)]
pub struct Args {
    /// Payload format to request from the dataset
    #[arg(long, value_enum, default_value = "json", env = "VARIANTSHARE_SOURCE")]
    pub source: SourceKind,

    /// Override the dataset resource URL
    #[arg(long, env = "VARIANTSHARE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Read a saved JSON/CSV payload instead of calling the API
    #[arg(long, env = "VARIANTSHARE_INPUT")]
    pub input: Option<PathBuf>,

    #[arg(long, default_value = "USA", env = "VARIANTSHARE_REGION")]
    pub region: String,

    /// Lookback window in weeks
    #[arg(long, default_value_t = 26, env = "VARIANTSHARE_WEEKS")]
    pub weeks: u32,

    /// Row cap passed as `$limit`
    #[arg(long, default_value_t = 1000, env = "VARIANTSHARE_LIMIT")]
    pub limit: u32,

    #[arg(long, default_value_t = 30, env = "VARIANTSHARE_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Chart file; `.png` selects the bitmap backend, anything else SVG
    #[arg(
        short,
        long,
        default_value = "variant_proportions.svg",
        env = "VARIANTSHARE_OUTPUT"
    )]
    pub output: PathBuf,

    /// Also write the final proportion table as CSV
    #[arg(long, env = "VARIANTSHARE_TABLE_OUT")]
    pub table_out: Option<PathBuf>,

    /// What to do with weeks whose total share is zero after filtering
    #[arg(long, value_enum, default_value = "drop", env = "VARIANTSHARE_ZERO_ROWS")]
    pub zero_rows: ZeroRowPolicy,

    #[arg(long, default_value_t = 0.01)]
    pub observation_floor: f64,

    #[arg(long, default_value_t = 0.01)]
    pub aggregate_floor: f64,

    #[arg(long, default_value_t = 0.05)]
    pub label_floor: f64,

    #[arg(long, default_value_t = 2800)]
    pub width: u32,

    #[arg(long, default_value_t = 1200)]
    pub height: u32,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    pub endpoint: Url,
    pub input: Option<PathBuf>,
    pub region: String,
    pub weeks: u32,
    pub limit: u32,
    pub timeout: Duration,
    pub output: PathBuf,
    pub table_out: Option<PathBuf>,
    pub zero_rows: ZeroRowPolicy,
    pub thresholds: Thresholds,
    pub size: (u32, u32),
}

impl Config {
    /// Defaults matching the command line with no flags.
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            endpoint: Url::parse(source.default_endpoint())
                .expect("built-in endpoint is valid"),
            input: None,
            region: "USA".to_string(),
            weeks: 26,
            limit: 1000,
            timeout: Duration::from_secs(30),
            output: PathBuf::from("variant_proportions.svg"),
            table_out: None,
            zero_rows: ZeroRowPolicy::Drop,
            thresholds: Thresholds::default(),
            size: (2800, 1200),
        }
    }

    /// Server-side filter for a run started on `today`.
    pub fn query(&self, today: NaiveDate) -> Result<Query> {
        let cutoff = today
            .checked_sub_signed(ChronoDuration::weeks(i64::from(self.weeks)))
            .ok_or_else(|| {
                Error::Config(format!(
                    "a {}-week window before {} is out of date range",
                    self.weeks, today
                ))
            })?;
        Ok(Query {
            region: self.region.clone(),
            cutoff,
            limit: self.limit,
        })
    }
}

impl TryFrom<Args> for Config {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self> {
        let endpoint_str = args
            .endpoint
            .as_deref()
            .unwrap_or_else(|| args.source.default_endpoint());
        let endpoint = Url::parse(endpoint_str)
            .map_err(|e| Error::Config(format!("endpoint `{}`: {}", endpoint_str, e)))?;

        for (name, value) in [
            ("observation-floor", args.observation_floor),
            ("aggregate-floor", args.aggregate_floor),
            ("label-floor", args.label_floor),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be in [0, 1), got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("weeks", u64::from(args.weeks)),
            ("limit", u64::from(args.limit)),
            ("timeout-secs", args.timeout_secs),
            ("width", u64::from(args.width)),
            ("height", u64::from(args.height)),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be positive", name)));
            }
        }

        if args.weeks > MAX_WEEKS {
            return Err(Error::Config(format!(
                "weeks must be at most {}, got {}",
                MAX_WEEKS, args.weeks
            )));
        }

        if args.region.trim().is_empty() {
            return Err(Error::Config("region must not be empty".into()));
        }

        Ok(Config {
            source: args.source,
            endpoint,
            input: args.input,
            region: args.region,
            weeks: args.weeks,
            limit: args.limit,
            timeout: Duration::from_secs(args.timeout_secs),
            output: args.output,
            table_out: args.table_out,
            zero_rows: args.zero_rows,
            thresholds: Thresholds {
                observation_floor: args.observation_floor,
                aggregate_floor: args.aggregate_floor,
                label_floor: args.label_floor,
            },
            size: (args.width, args.height),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Config> {
        let args = Args::try_parse_from(argv).expect("arguments should parse");
        Config::try_from(args)
    }

    #[test]
    fn defaults_match_dataset() {
        let cfg = parse(&["variantshare"]).unwrap();
        assert_eq!(cfg.source, SourceKind::Json);
        assert_eq!(cfg.endpoint.as_str(), JSON_ENDPOINT);
        assert_eq!(cfg.region, "USA");
        assert_eq!(cfg.weeks, 26);
        assert_eq!(cfg.limit, 1000);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.zero_rows, ZeroRowPolicy::Drop);
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert_eq!(cfg.size, (2800, 1200));
    }

    #[test]
    fn csv_source_switches_endpoint() {
        let cfg = parse(&["variantshare", "--source", "csv"]).unwrap();
        assert_eq!(cfg.endpoint.as_str(), CSV_ENDPOINT);
    }

    #[test]
    fn query_window_is_lookback_weeks() {
        let cfg = parse(&["variantshare", "--weeks", "2"]).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let q = cfg.query(today).unwrap();
        assert_eq!(q.cutoff, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(q.region, "USA");
        assert_eq!(q.limit, 1000);
    }

    #[test]
    fn rejects_window_beyond_max_weeks() {
        let err = parse(&["variantshare", "--weeks", "4000000000"]).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("weeks")));
        assert!(parse(&["variantshare", "--weeks", "5200"]).is_ok());
    }

    #[test]
    fn query_out_of_date_range_is_config_error() {
        let mut cfg = Config::new(SourceKind::Json);
        cfg.weeks = u32::MAX;
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(matches!(cfg.query(today), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_floor() {
        let err = parse(&["variantshare", "--label-floor", "1.5"]).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("label-floor")));
    }

    #[test]
    fn rejects_zero_timeout_and_bad_endpoint() {
        assert!(matches!(
            parse(&["variantshare", "--timeout-secs", "0"]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse(&["variantshare", "--endpoint", "not a url"]),
            Err(Error::Config(_))
        ));
    }
}

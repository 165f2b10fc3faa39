// src/pipeline.rs

use crate::chart::{self, ChartOptions, LayoutOptions};
use crate::config::{Config, SourceKind};
use crate::error::{Error, Result};
use crate::fetch::{CsvFetcher, FileFetcher, Fetcher, JsonFetcher, RawObservation, SocrataClient};
use crate::process::{normalize, select_and_order, ProportionTable};
use chrono::{NaiveDate, Utc};
use std::{fs::File, io::BufWriter, path::Path, path::PathBuf, time::Instant};
use tracing::info;

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub observations: usize,
    pub weeks: usize,
    /// Stack order, bottom first.
    pub variants: Vec<String>,
    pub latest_week: Option<NaiveDate>,
    pub output: PathBuf,
}

/// Pick the data source: a saved payload when `input` is set, otherwise the
/// configured HTTP representation.
pub fn build_fetcher(config: &Config) -> Result<Box<dyn Fetcher>> {
    if let Some(path) = &config.input {
        return Ok(Box::new(FileFetcher::new(path)));
    }
    let client = SocrataClient::new(config.timeout)?;
    let endpoint = config.endpoint.clone();
    Ok(match config.source {
        SourceKind::Json => Box::new(JsonFetcher::new(client, endpoint)),
        SourceKind::Csv => Box::new(CsvFetcher::new(client, endpoint)),
    })
}

/// Normalize, then select and order: raw rows in, chart-ready table out.
pub fn build_table(observations: &[RawObservation], config: &Config) -> Result<ProportionTable> {
    let normalized = normalize(
        observations,
        config.thresholds.observation_floor,
        config.zero_rows,
    )?;
    select_and_order(&normalized, config.thresholds.aggregate_floor)
}

pub fn chart_options(config: &Config) -> ChartOptions {
    ChartOptions {
        width: config.size.0,
        height: config.size.1,
        layout: LayoutOptions {
            label_floor: config.thresholds.label_floor,
            lookback_weeks: config.weeks,
            observation_floor: config.thresholds.observation_floor,
        },
    }
}

/// Write the table as CSV to `path`.
pub fn export_table(table: &ProportionTable, path: &Path) -> Result<()> {
    let export_err = |source: csv::Error| Error::Export {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|e| export_err(csv::Error::from(e)))?;
    table.write_csv(BufWriter::new(file)).map_err(export_err)?;
    info!(path = %path.display(), "wrote proportion table");
    Ok(())
}

/// Fetch, reshape and render once, for a window ending today (UTC).
pub fn run(config: &Config) -> Result<RunSummary> {
    let fetcher = build_fetcher(config)?;
    run_with(config, fetcher.as_ref(), Utc::now().date_naive())
}

/// `run` with an explicit source and reference date.
pub fn run_with(config: &Config, fetcher: &dyn Fetcher, today: NaiveDate) -> Result<RunSummary> {
    let start = Instant::now();
    let query = config.query(today)?;
    info!(
        source = %fetcher.describe(),
        cutoff = %query.cutoff,
        region = %query.region,
        limit = query.limit,
        "fetching"
    );

    let observations = fetcher.fetch(&query)?;
    let table = build_table(&observations, config)?;

    if let Some(path) = &config.table_out {
        export_table(&table, path)?;
    }
    chart::render(&table, &chart_options(config), &config.output)?;

    info!(elapsed = ?start.elapsed(), "run complete");
    Ok(RunSummary {
        observations: observations.len(),
        weeks: table.num_weeks(),
        variants: table.variants().to_vec(),
        latest_week: table.latest_week(),
        output: config.output.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::fetch::Query;
    use crate::process::ZeroRowPolicy;
    use std::fs;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,variantshare=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    struct StaticFetcher(Vec<RawObservation>);

    impl Fetcher for StaticFetcher {
        fn fetch(&self, _query: &Query) -> Result<Vec<RawObservation>> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".into()
        }
    }

    fn obs(week: &str, variant: &str, share: &str) -> RawObservation {
        RawObservation {
            week_ending: format!("{}T00:00:00.000", week),
            variant: variant.to_string(),
            region: Some("USA".to_string()),
            share: Some(share.to_string()),
        }
    }

    fn sample() -> Vec<RawObservation> {
        vec![
            obs("2024-05-04", "JN.1", "0.55"),
            obs("2024-05-04", "KP.2", "0.30"),
            obs("2024-05-04", "KP.3", "0.14"),
            obs("2024-05-04", "BA.2.86", "0.005"),
            obs("2024-05-11", "JN.1", "0.003"),
            obs("2024-05-11", "KP.2", "0.004"),
            obs("2024-05-18", "JN.1", "0.40"),
            obs("2024-05-18", "KP.2", "0.35"),
            obs("2024-05-18", "KP.3", "0.25"),
        ]
    }

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::new(SourceKind::Json);
        config.output = dir.join("chart.svg");
        config.table_out = Some(dir.join("table.csv"));
        config.size = (1200, 700);
        config
    }

    #[test]
    fn run_renders_chart_and_table() {
        init_test_logging();
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();

        let summary = run_with(&config, &StaticFetcher(sample()), today).unwrap();

        assert_eq!(summary.observations, 9);
        // the week with only sub-1% rows is dropped
        assert_eq!(summary.weeks, 2);
        assert_eq!(summary.variants, vec!["KP.3", "KP.2", "JN.1"]);
        assert_eq!(summary.latest_week, NaiveDate::from_ymd_opt(2024, 5, 18));

        let svg = fs::read_to_string(&config.output).unwrap();
        assert!(svg.contains("Most recent data: 2024-05-18"));
        assert!(svg.contains("JN.1 (40.0%)"));

        let table = fs::read_to_string(dir.path().join("table.csv")).unwrap();
        assert!(table.starts_with("week_ending,KP.3,KP.2,JN.1\n2024-05-04,"));
        assert_eq!(table.lines().count(), 3);
    }

    #[test]
    fn zero_fill_keeps_the_empty_week() {
        let dir = tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.zero_rows = ZeroRowPolicy::ZeroFill;
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();

        let summary = run_with(&config, &StaticFetcher(sample()), today).unwrap();
        assert_eq!(summary.weeks, 3);
        let table = fs::read_to_string(dir.path().join("table.csv")).unwrap();
        assert!(table.contains("\n2024-05-11,0,0,0\n"));
    }

    #[test]
    fn identical_input_gives_identical_table_bytes() {
        let config = Config::new(SourceKind::Json);
        let mut first = Vec::new();
        let mut second = Vec::new();
        build_table(&sample(), &config)
            .unwrap()
            .write_csv(&mut first)
            .unwrap();
        build_table(&sample(), &config)
            .unwrap()
            .write_csv(&mut second)
            .unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_payload_stops_before_rendering() {
        let dir = tempdir().unwrap();
        let payload = dir.path().join("payload.json");
        fs::write(&payload, "<html>rate limited</html>").unwrap();
        let mut config = config_in(dir.path());
        config.input = Some(payload);

        let err = run(&config).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Json { .. })));
        assert!(!config.output.exists());
        assert!(!dir.path().join("table.csv").exists());
    }

    #[test]
    fn offline_csv_payload_runs_end_to_end() {
        let dir = tempdir().unwrap();
        let payload = dir.path().join("payload.csv");
        fs::write(
            &payload,
            "week_ending,variant,share,usa_or_hhsregion\n\
             2024-05-04T00:00:00.000,JN.1,0.7,USA\n\
             2024-05-04T00:00:00.000,KP.2,0.3,USA\n\
             2024-05-04T00:00:00.000,KP.2,0.9,4\n",
        )
        .unwrap();
        let mut config = config_in(dir.path());
        config.input = Some(payload);

        let summary = run(&config).unwrap();
        assert_eq!(summary.observations, 2);
        assert_eq!(summary.variants, vec!["KP.2", "JN.1"]);
        assert!(config.output.exists());
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let table = build_table(&sample(), &Config::new(SourceKind::Json)).unwrap();
        let err = export_table(&table, &dir.path().join("nope").join("t.csv")).unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use variantshare::{
    config::{Args, Config},
    pipeline,
};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::try_from(Args::parse()).context("reading configuration")?;

    // ─── 3) fetch → normalize → select → render ──────────────────────
    let summary = pipeline::run(&config)
        .inspect_err(|e| error!(error = %e, "run failed"))
        .context("building variant chart")?;

    info!(
        observations = summary.observations,
        weeks = summary.weeks,
        variants = summary.variants.len(),
        latest = ?summary.latest_week,
        output = %summary.output.display(),
        "all done"
    );
    Ok(())
}

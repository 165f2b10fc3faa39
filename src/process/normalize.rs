// src/process/normalize.rs

use super::{date_parser::parse_week_ending, utils::parse_share, ProportionTable};
use crate::error::{EmptyReason, Error, ParseError, Result};
use crate::fetch::RawObservation;
use chrono::NaiveDate;
use clap::ValueEnum;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// How to treat a week whose shares were all filtered out, leaving a zero
/// total that cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ZeroRowPolicy {
    /// Remove the week from the table.
    #[default]
    Drop,
    /// Keep the week as an all-zero row.
    ZeroFill,
}

/// Turn raw observations into a week × variant table whose rows sum to 1.0.
///
/// Shares under `observation_floor` are discarded before aggregation;
/// duplicate (week, variant) rows are summed. Columns come out in variant
/// name order, rows in date order.
pub fn normalize(
    observations: &[RawObservation],
    observation_floor: f64,
    zero_rows: ZeroRowPolicy,
) -> Result<ProportionTable> {
    let mut weeks_seen: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut sums: BTreeMap<NaiveDate, BTreeMap<&str, f64>> = BTreeMap::new();
    let mut missing = 0usize;
    let mut below_floor = 0usize;

    for (row, obs) in observations.iter().enumerate() {
        let week = parse_week_ending(&obs.week_ending).ok_or_else(|| ParseError::InvalidDate {
            row,
            value: obs.week_ending.clone(),
        })?;
        weeks_seen.insert(week);

        let Some(share) = parse_share(obs.share.as_deref()) else {
            missing += 1;
            continue;
        };
        if share < observation_floor {
            below_floor += 1;
            continue;
        }
        *sums
            .entry(week)
            .or_default()
            .entry(obs.variant.as_str())
            .or_insert(0.0) += share;
    }
    debug!(missing, below_floor, "filtered observations");

    if sums.is_empty() {
        return Err(Error::EmptyResult(EmptyReason::NothingAboveFloor));
    }

    let variants: Vec<&str> = sums
        .values()
        .flat_map(|m| m.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut weeks = Vec::with_capacity(weeks_seen.len());
    let mut rows = Vec::with_capacity(weeks_seen.len());
    for week in weeks_seen {
        let mut row: Vec<f64> = match sums.get(&week) {
            Some(cells) => variants
                .iter()
                .map(|v| cells.get(v).copied().unwrap_or(0.0))
                .collect(),
            None => vec![0.0; variants.len()],
        };
        let total: f64 = row.iter().sum();

        if total > 0.0 {
            row.iter_mut().for_each(|v| *v /= total);
        } else {
            match zero_rows {
                ZeroRowPolicy::Drop => {
                    warn!(%week, "week has zero total share after filtering; dropping");
                    continue;
                }
                ZeroRowPolicy::ZeroFill => {
                    warn!(%week, "week has zero total share after filtering; keeping as empty bar");
                }
            }
        }
        weeks.push(week);
        rows.push(row);
    }

    if weeks.is_empty() {
        return Err(Error::EmptyResult(EmptyReason::NoWeeks));
    }

    info!(
        weeks = weeks.len(),
        variants = variants.len(),
        "normalized proportions"
    );
    Ok(ProportionTable::new(
        weeks,
        variants.into_iter().map(str::to_string).collect(),
        rows,
    ))
}

// src/fetch/payload.rs

use super::RawObservation;
use crate::error::{ParseError, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

/// One element of the JSON array. Socrata omits null fields entirely, so
/// everything is optional here and checked afterwards.
#[derive(Debug, Deserialize)]
struct JsonRecord {
    week_ending: Option<String>,
    variant: Option<String>,
    usa_or_hhsregion: Option<String>,
    share: Option<Value>,
}

/// Decode a JSON array-of-objects payload.
pub fn decode_json(body: &str) -> Result<Vec<RawObservation>> {
    let value: Value = serde_json::from_str(body).map_err(|source| ParseError::Json { source })?;
    if !value.is_array() {
        return Err(ParseError::NotAnArray.into());
    }
    let records: Vec<JsonRecord> =
        serde_json::from_value(value).map_err(|source| ParseError::Json { source })?;

    let mut saw_share = false;
    let mut out = Vec::with_capacity(records.len());
    for rec in records {
        let week_ending = rec.week_ending.ok_or(ParseError::MissingColumn {
            column: "week_ending",
        })?;
        let variant = rec
            .variant
            .ok_or(ParseError::MissingColumn { column: "variant" })?;
        let share = rec.share.map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        });
        saw_share |= share.is_some();
        out.push(RawObservation {
            week_ending,
            variant,
            region: rec.usa_or_hhsregion,
            share,
        });
    }

    if !out.is_empty() && !saw_share {
        return Err(ParseError::MissingColumn { column: "share" }.into());
    }
    trace!(rows = out.len(), "decoded JSON payload");
    Ok(out)
}

/// Decode a CSV payload with a header row naming the dataset columns.
pub fn decode_csv(body: &str) -> Result<Vec<RawObservation>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|source| ParseError::Csv { source })?
        .clone();
    let position = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(ParseError::MissingColumn { column: name })
    };
    let week_idx = position("week_ending")?;
    let variant_idx = position("variant")?;
    let share_idx = position("share")?;
    let region_idx = headers.iter().position(|h| h == "usa_or_hhsregion");

    let mut out = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|source| ParseError::Csv { source })?;
        let field = |idx: usize| record.get(idx).filter(|s| !s.is_empty()).map(str::to_string);
        // blank key cells read the same as a JSON row without the key
        let week_ending = field(week_idx).ok_or(ParseError::MissingColumn {
            column: "week_ending",
        })?;
        let variant = field(variant_idx).ok_or(ParseError::MissingColumn { column: "variant" })?;
        out.push(RawObservation {
            week_ending,
            variant,
            region: region_idx.and_then(|idx| field(idx)),
            share: field(share_idx),
        });
    }
    trace!(rows = out.len(), "decoded CSV payload");
    Ok(out)
}

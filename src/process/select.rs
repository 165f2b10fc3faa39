// src/process/select.rs

use super::ProportionTable;
use crate::error::{EmptyReason, Error, Result};
use tracing::{debug, info};

/// Keep variants whose share summed over every week reaches
/// `aggregate_floor`, then order them by most-recent-week share, ascending.
///
/// The resulting column order is the stack order: first column at the bottom
/// of each bar, the currently dominant variant on top. Ties keep the
/// incoming (name) order. Rows are not renormalized afterwards.
pub fn select_and_order(table: &ProportionTable, aggregate_floor: f64) -> Result<ProportionTable> {
    let mut keep: Vec<usize> = (0..table.num_variants())
        .filter(|&c| {
            let total = table.column_sum(c);
            let kept = total >= aggregate_floor;
            if !kept {
                debug!(variant = %table.variants()[c], total, "below aggregate floor");
            }
            kept
        })
        .collect();

    if keep.is_empty() {
        return Err(Error::EmptyResult(EmptyReason::NoVariants));
    }

    keep.sort_by(|&a, &b| table.latest_share(a).total_cmp(&table.latest_share(b)));

    info!(
        kept = keep.len(),
        dropped = table.num_variants() - keep.len(),
        "selected variants"
    );
    Ok(table.project(&keep))
}

// src/process/table.rs

use chrono::NaiveDate;
use csv::WriterBuilder;
use std::io::Write;

/// Week × variant matrix of shares. Rows are chronological and unique,
/// columns are unique; column order is meaningful (it is the stack order
/// once the table has been through `select_and_order`).
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionTable {
    weeks: Vec<NaiveDate>,
    variants: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ProportionTable {
    pub fn new(weeks: Vec<NaiveDate>, variants: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(weeks.len(), rows.len());
        debug_assert!(rows.iter().all(|r| r.len() == variants.len()));
        debug_assert!(weeks.windows(2).all(|w| w[0] < w[1]));
        Self {
            weeks,
            variants,
            rows,
        }
    }

    pub fn weeks(&self) -> &[NaiveDate] {
        &self.weeks
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, week_idx: usize) -> &[f64] {
        &self.rows[week_idx]
    }

    pub fn value(&self, week_idx: usize, variant_idx: usize) -> f64 {
        self.rows[week_idx][variant_idx]
    }

    /// Look a cell up by key.
    #[cfg(test)]
    pub fn get(&self, week: NaiveDate, variant: &str) -> Option<f64> {
        let r = self.weeks.binary_search(&week).ok()?;
        let c = self.variants.iter().position(|v| v == variant)?;
        Some(self.rows[r][c])
    }

    pub fn num_weeks(&self) -> usize {
        self.weeks.len()
    }

    pub fn num_variants(&self) -> usize {
        self.variants.len()
    }

    pub fn row_sum(&self, week_idx: usize) -> f64 {
        self.rows[week_idx].iter().sum()
    }

    pub fn column_sum(&self, variant_idx: usize) -> f64 {
        self.rows.iter().map(|r| r[variant_idx]).sum()
    }

    /// Most recent week in the table, i.e. the "most recent data" date.
    pub fn latest_week(&self) -> Option<NaiveDate> {
        self.weeks.last().copied()
    }

    pub fn latest_row(&self) -> Option<&[f64]> {
        self.rows.last().map(Vec::as_slice)
    }

    /// Share of a variant in the most recent week, 0.0 for an empty table.
    pub fn latest_share(&self, variant_idx: usize) -> f64 {
        self.latest_row().map_or(0.0, |r| r[variant_idx])
    }

    /// New table with only `columns`, in the given order.
    pub fn project(&self, columns: &[usize]) -> Self {
        let variants = columns.iter().map(|&c| self.variants[c].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| columns.iter().map(|&c| r[c]).collect())
            .collect();
        Self {
            weeks: self.weeks.clone(),
            variants,
            rows,
        }
    }

    /// Write as CSV: `week_ending,<variant…>` then one line per week.
    /// Values use the shortest representation that round-trips, so identical
    /// tables always produce identical bytes.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = WriterBuilder::new().from_writer(writer);

        let mut header = Vec::with_capacity(self.variants.len() + 1);
        header.push("week_ending");
        header.extend(self.variants.iter().map(String::as_str));
        wtr.write_record(&header)?;

        for (week, row) in self.weeks.iter().zip(&self.rows) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(week.format("%Y-%m-%d").to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

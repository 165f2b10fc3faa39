// src/chart/layout.rs

use crate::process::ProportionTable;

/// Fraction of a week's slot taken by its bar.
pub const BAR_WIDTH: f64 = 0.8;

/// Everything the renderer draws, in data coordinates: x is the bar index,
/// y is the share (0.0–1.0).
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub title: Vec<String>,
    pub bars: Vec<Bar>,
    pub inline_labels: Vec<InlineLabel>,
    /// (bar index, label) for every other bar.
    pub ticks: Vec<(usize, String)>,
    /// Top of the stack first.
    pub legend: Vec<LegendEntry>,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub x: usize,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Column in the table, also the palette index.
    pub series: usize,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineLabel {
    pub series: usize,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub series: usize,
    pub label: String,
}

/// Text and thresholds that shape the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Segments strictly above this get an inline label.
    pub label_floor: f64,
    /// Only used for the title.
    pub lookback_weeks: u32,
    /// Only used for the title.
    pub observation_floor: f64,
}

impl ChartLayout {
    /// Lay out a table whose column order is the stack order.
    pub fn build(table: &ProportionTable, opts: &LayoutOptions) -> Self {
        let variants = table.variants();

        let mut bars = Vec::with_capacity(table.num_weeks());
        let mut inline_labels = Vec::new();
        let mut y_max: f64 = 1.0;
        for (x, row) in table.rows().iter().enumerate() {
            let mut bottom = 0.0;
            let mut segments = Vec::with_capacity(row.len());
            for (series, &value) in row.iter().enumerate() {
                if value > 0.0 {
                    segments.push(Segment {
                        series,
                        y0: bottom,
                        y1: bottom + value,
                    });
                }
                if value > opts.label_floor {
                    inline_labels.push(InlineLabel {
                        series,
                        x: x as f64,
                        y: bottom + value / 2.0,
                        text: variants[series].clone(),
                    });
                }
                bottom += value;
            }
            y_max = y_max.max(bottom);
            bars.push(Bar { x, segments });
        }

        let ticks = table
            .weeks()
            .iter()
            .enumerate()
            .step_by(2)
            .map(|(i, week)| (i, week.format("%b %d").to_string()))
            .collect();

        let legend = (0..variants.len())
            .rev()
            .map(|series| LegendEntry {
                series,
                label: legend_label(&variants[series], table.latest_share(series)),
            })
            .collect();

        let mut title = vec![format!(
            "SARS-CoV-2 Variant Proportions (Last {} Weeks, ≥{}% Share)",
            opts.lookback_weeks,
            percent(opts.observation_floor)
        )];
        if let Some(latest) = table.latest_week() {
            title.push(format!("Most recent data: {}", latest.format("%Y-%m-%d")));
        }

        Self {
            title,
            bars,
            inline_labels,
            ticks,
            legend,
            y_max,
        }
    }
}

/// `"JN.1 (42.3%)"`
pub fn legend_label(variant: &str, latest_share: f64) -> String {
    format!("{} ({:.1}%)", variant, latest_share * 100.0)
}

/// Percentage without trailing zeros: 0.01 → "1", 0.025 → "2.5".
fn percent(fraction: f64) -> String {
    let s = format!("{:.2}", fraction * 100.0);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

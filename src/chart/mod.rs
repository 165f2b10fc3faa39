// src/chart/mod.rs

use crate::error::{Error, Result};
use crate::process::ProportionTable;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{Palette, Palette99};
use std::path::Path;
use tracing::info;

pub mod layout;

pub use layout::{ChartLayout, LayoutOptions, BAR_WIDTH};

const LEGEND_WIDTH: u32 = 320;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub layout: LayoutOptions,
}

/// Draw the stacked bar chart for an ordered table into `path`.
/// A `.png` path uses the bitmap backend, anything else is written as SVG.
pub fn render(table: &ProportionTable, opts: &ChartOptions, path: &Path) -> Result<()> {
    let layout = ChartLayout::build(table, &opts.layout);
    let size = (opts.width, opts.height);

    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        draw(BitMapBackend::new(path, size).into_drawing_area(), &layout)?;
    } else {
        draw(SVGBackend::new(path, size).into_drawing_area(), &layout)?;
    }

    info!(
        path = %path.display(),
        bars = layout.bars.len(),
        series = layout.legend.len(),
        "wrote chart"
    );
    Ok(())
}

/// Same chart as `render`, returned as an SVG document.
pub fn render_svg(table: &ProportionTable, opts: &ChartOptions) -> Result<String> {
    let layout = ChartLayout::build(table, &opts.layout);
    let mut buf = String::new();
    draw(
        SVGBackend::with_string(&mut buf, (opts.width, opts.height)).into_drawing_area(),
        &layout,
    )?;
    Ok(buf)
}

fn draw<DB>(root: DrawingArea<DB, Shift>, layout: &ChartLayout) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(Error::render)?;

    let (width, _) = root.dim_in_pixel();
    let title_height = 30 + 36 * layout.title.len() as i32;
    let (title_area, body) = root.split_vertically(title_height);
    let legend_width = LEGEND_WIDTH.min(width / 3);
    let (plot_area, legend_area) = body.split_horizontally((width - legend_width) as i32);

    draw_title(&title_area, layout)?;
    draw_bars(&plot_area, layout)?;
    draw_legend(&legend_area, layout)?;

    root.present().map_err(Error::render)?;
    Ok(())
}

fn draw_title<DB>(area: &DrawingArea<DB, Shift>, layout: &ChartLayout) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (width, _) = area.dim_in_pixel();
    for (i, line) in layout.title.iter().enumerate() {
        let size = if i == 0 { 32.0 } else { 24.0 };
        let style = FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        area.draw(&Text::new(
            line.as_str(),
            ((width / 2) as i32, 16 + 36 * i as i32),
            style,
        ))
        .map_err(Error::render)?;
    }
    Ok(())
}

fn draw_bars<DB>(area: &DrawingArea<DB, Shift>, layout: &ChartLayout) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = layout.bars.len().max(1);
    let half = BAR_WIDTH / 2.0;

    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 110)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..layout.y_max)
        .map_err(Error::render)?;

    // week labels are drawn below, rotated; the mesh only places the tick marks
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|_| String::new())
        .y_labels(11)
        .y_label_formatter(&|v| format!("{:.0}%", v * 100.0))
        .x_desc("Week Ending")
        .y_desc("Proportion (%)")
        .axis_desc_style(FontDesc::new(FontFamily::SansSerif, 20.0, FontStyle::Normal))
        .label_style(FontDesc::new(FontFamily::SansSerif, 15.0, FontStyle::Normal))
        .bold_line_style(&BLACK.mix(0.15))
        .light_line_style(&WHITE)
        .draw()
        .map_err(Error::render)?;

    chart
        .draw_series(layout.bars.iter().flat_map(|bar| {
            let x = bar.x as f64;
            bar.segments.iter().map(move |seg| {
                Rectangle::new(
                    [(x - half, seg.y0), (x + half, seg.y1)],
                    Palette99::pick(seg.series).filled(),
                )
            })
        }))
        .map_err(Error::render)?;

    // plotters only rotates in quarter turns; anchored at the end so the
    // text hangs below the axis
    let (base_x, base_y) = area.get_base_pixel();
    let tick_style = FontDesc::new(FontFamily::SansSerif, 15.0, FontStyle::Normal)
        .transform(FontTransform::Rotate270)
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Center));
    for (x, label) in &layout.ticks {
        let (px, py) = chart.backend_coord(&(*x as f64, 0.0));
        area.draw(&Text::new(
            label.as_str(),
            (px - base_x, py - base_y + 10),
            tick_style.clone(),
        ))
        .map_err(Error::render)?;
    }

    // rotated to read bottom-to-top, centred in the segment
    let label_style = FontDesc::new(FontFamily::SansSerif, 13.0, FontStyle::Normal)
        .transform(FontTransform::Rotate270)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart
        .draw_series(
            layout
                .inline_labels
                .iter()
                .map(|l| Text::new(l.text.clone(), (l.x, l.y), label_style.clone())),
        )
        .map_err(Error::render)?;

    Ok(())
}

fn draw_legend<DB>(area: &DrawingArea<DB, Shift>, layout: &ChartLayout) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let heading = FontDesc::new(FontFamily::SansSerif, 20.0, FontStyle::Bold).color(&BLACK);
    area.draw(&Text::new("Variants", (12, 28), heading))
        .map_err(Error::render)?;

    let entry_style = FontDesc::new(FontFamily::SansSerif, 16.0, FontStyle::Normal)
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    for (i, entry) in layout.legend.iter().enumerate() {
        let y = 72 + 26 * i as i32;
        area.draw(&Rectangle::new(
            [(12, y - 8), (32, y + 8)],
            Palette99::pick(entry.series).filled(),
        ))
        .map_err(Error::render)?;
        area.draw(&Text::new(
            entry.label.as_str(),
            (42, y),
            entry_style.clone(),
        ))
        .map_err(Error::render)?;
    }
    Ok(())
}

//! Chart rendering on top of `plotters`.
//!
//! The renderer is deliberately thin: callers hand it ordered series, axis
//! bounds and an explicit [`ChartStyle`], and get a PNG on disk. Nothing in
//! here owns statistics or range policy.

use crate::range::AxisRange;
use anyhow::{Context, Result};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::Path;

pub use plotters::style::RGBColor;

/// Matplotlib "tab" palette, matching the colors of the original reports.
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
];

/// Color of analytic reference lines.
pub const REFERENCE_COLOR: RGBColor = RGBColor(0, 0, 0);

pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Immutable rendering configuration threaded through every chart call.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub single_size: (u32, u32),
    pub grid_size: (u32, u32),
    pub comparison_size: (u32, u32),
    pub stroke_width: u32,
    pub marker_size: i32,
    pub band_alpha: f64,
    pub font_family: &'static str,
    pub caption_size: u32,
    pub panel_caption_size: u32,
    pub label_size: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            single_size: (1000, 600),
            grid_size: (1800, 1200),
            comparison_size: (1200, 800),
            stroke_width: 2,
            marker_size: 4,
            band_alpha: 0.25,
            font_family: "sans-serif",
            caption_size: 30,
            panel_caption_size: 20,
            label_size: 16,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum MarkerShape {
    Circle,
    Triangle,
}

/// One (x, mean, std) series drawn as a mean line with a shaded ±std band.
pub struct BandSeries {
    pub label: String,
    pub color: RGBColor,
    pub points: Vec<(f64, f64, f64)>,
}

/// A fitted or analytic overlay drawn as a dashed line.
pub struct OverlayLine {
    pub label: String,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

/// One error-bar entry at a categorical x position. `tick` is the axis
/// label under the position, `label` the legend entry.
pub struct ErrorPoint {
    pub tick: String,
    pub label: String,
    pub color: RGBColor,
    pub mean: f64,
    pub std_dev: f64,
}

/// Raw per-ordinal samples for one source.
pub struct RawSeries {
    pub label: String,
    pub color: RGBColor,
    pub marker: MarkerShape,
    pub points: Vec<(f64, f64)>,
}

/// One cell of a grid image.
pub struct GridPanel {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub y_range: AxisRange,
    pub content: PanelContent,
    pub annotation: Option<String>,
}

pub enum PanelContent {
    Raw(Vec<RawSeries>),
    Band(Vec<BandSeries>),
}

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn clamp(v: f64, range: AxisRange) -> f64 {
    v.clamp(range.min, range.max)
}

/// X extent covered by band series and overlays, padded so single-point
/// series still get a drawable range.
fn x_extent(series: &[BandSeries], overlays: &[OverlayLine]) -> AxisRange {
    let xs = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.0))
        .chain(overlays.iter().flat_map(|o| o.points.iter().map(|p| p.0)));
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for x in xs {
        lo = lo.min(x);
        hi = hi.max(x);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return AxisRange::new(0.0, 1.0);
    }
    if lo == hi {
        return AxisRange::new(lo - 0.5, hi + 0.5);
    }
    AxisRange::new(lo, hi)
}

/// Render a standalone chart of mean±std series with optional overlays.
#[allow(clippy::too_many_arguments)]
pub fn band_chart(
    path: &Path,
    style: &ChartStyle,
    size: (u32, u32),
    title: &str,
    x_desc: &str,
    y_desc: &str,
    y_range: AxisRange,
    series: &[BandSeries],
    overlays: &[OverlayLine],
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).context("fill chart background")?;
    draw_band_panel(
        &root,
        style,
        style.caption_size,
        title,
        x_desc,
        y_desc,
        y_range,
        series,
        overlays,
        None,
    )?;
    root.present()
        .with_context(|| format!("write {}", path.display()))?;
    info!("saved plot to {}", path.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_band_panel(
    area: &Panel<'_>,
    style: &ChartStyle,
    caption_size: u32,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    y_range: AxisRange,
    series: &[BandSeries],
    overlays: &[OverlayLine],
    annotation: Option<&str>,
) -> Result<()> {
    let x_range = x_extent(series, overlays);
    let mut chart = ChartBuilder::on(area)
        .caption(title, (style.font_family, caption_size))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(x_range.min..x_range.max, y_range.min..y_range.max)
        .context("build chart axes")?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style((style.font_family, style.label_size).into_font())
        .light_line_style(RGBColor(230, 230, 230))
        .draw()
        .context("draw chart mesh")?;

    for s in series {
        let band: Vec<(f64, f64)> = s
            .points
            .iter()
            .map(|&(x, m, sd)| (x, clamp(m + sd, y_range)))
            .chain(
                s.points
                    .iter()
                    .rev()
                    .map(|&(x, m, sd)| (x, clamp(m - sd, y_range))),
            )
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(
                band,
                s.color.mix(style.band_alpha),
            )))
            .context("draw std band")?;
    }

    for s in series {
        let color = s.color;
        chart
            .draw_series(LineSeries::new(
                s.points.iter().map(|&(x, m, _)| (x, clamp(m, y_range))),
                color.stroke_width(style.stroke_width),
            ))
            .context("draw mean line")?
            .label(s.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
        chart
            .draw_series(s.points.iter().map(|&(x, m, _)| {
                Circle::new((x, clamp(m, y_range)), style.marker_size, color.filled())
            }))
            .context("draw mean markers")?;
    }

    for o in overlays {
        let color = o.color;
        chart
            .draw_series(DashedLineSeries::new(
                o.points.iter().map(|&(x, y)| (x, clamp(y, y_range))),
                6,
                4,
                color.stroke_width(style.stroke_width),
            ))
            .context("draw overlay line")?
            .label(o.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
    }

    if !series.is_empty() || !overlays.is_empty() {
        chart
            .configure_series_labels()
            .border_style(BLACK.mix(0.4))
            .background_style(WHITE.mix(0.85))
            .label_font((style.font_family, style.label_size).into_font())
            .draw()
            .context("draw legend")?;
    }

    if let Some(text) = annotation {
        area.draw(&Text::new(
            text.to_string(),
            (75, 45),
            (style.font_family, style.label_size).into_font(),
        ))
        .context("draw annotation")?;
    }

    Ok(())
}

fn draw_raw_panel(
    area: &Panel<'_>,
    style: &ChartStyle,
    panel: &GridPanel,
    series: &[RawSeries],
) -> Result<()> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in series.iter().flat_map(|s| s.points.iter()) {
        lo = lo.min(p.0);
        hi = hi.max(p.0);
    }
    if !lo.is_finite() {
        lo = 0.0;
        hi = 1.0;
    } else if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let y_range = panel.y_range;

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (style.font_family, style.panel_caption_size))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(lo..hi, y_range.min..y_range.max)
        .context("build panel axes")?;

    chart
        .configure_mesh()
        .x_desc(&panel.x_desc)
        .y_desc(&panel.y_desc)
        .label_style((style.font_family, style.label_size).into_font())
        .light_line_style(RGBColor(230, 230, 230))
        .draw()
        .context("draw panel mesh")?;

    for s in series {
        let color = s.color;
        chart
            .draw_series(LineSeries::new(
                s.points.iter().map(|&(x, y)| (x, clamp(y, y_range))),
                color.stroke_width(style.stroke_width),
            ))
            .context("draw raw series")?
            .label(s.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
        match s.marker {
            MarkerShape::Circle => {
                chart
                    .draw_series(s.points.iter().map(|&(x, y)| {
                        Circle::new((x, clamp(y, y_range)), style.marker_size, color.filled())
                    }))
                    .context("draw raw markers")?;
            }
            MarkerShape::Triangle => {
                chart
                    .draw_series(s.points.iter().map(|&(x, y)| {
                        TriangleMarker::new(
                            (x, clamp(y, y_range)),
                            style.marker_size + 1,
                            color.filled(),
                        )
                    }))
                    .context("draw raw markers")?;
            }
        }
    }

    if !series.is_empty() {
        chart
            .configure_series_labels()
            .border_style(BLACK.mix(0.4))
            .background_style(WHITE.mix(0.85))
            .label_font((style.font_family, style.label_size).into_font())
            .draw()
            .context("draw panel legend")?;
    }

    if let Some(text) = panel.annotation.as_deref() {
        area.draw(&Text::new(
            text.to_string(),
            (75, 45),
            (style.font_family, style.label_size).into_font(),
        ))
        .context("draw panel annotation")?;
    }

    Ok(())
}

/// Render up to six panels as a 2×3 grid under a shared title. Unused cells
/// stay blank.
pub fn panel_grid(
    path: &Path,
    style: &ChartStyle,
    title: &str,
    panels: &[GridPanel],
) -> Result<()> {
    let root = BitMapBackend::new(path, style.grid_size).into_drawing_area();
    root.fill(&WHITE).context("fill grid background")?;
    let body = root
        .titled(title, (style.font_family, style.caption_size).into_font())
        .context("draw grid title")?;
    let cells = body.split_evenly((2, 3));

    for (panel, cell) in panels.iter().zip(cells.iter()) {
        match &panel.content {
            PanelContent::Raw(series) => draw_raw_panel(cell, style, panel, series)?,
            PanelContent::Band(series) => draw_band_panel(
                cell,
                style,
                style.panel_caption_size,
                &panel.title,
                &panel.x_desc,
                &panel.y_desc,
                panel.y_range,
                series,
                &[],
                panel.annotation.as_deref(),
            )?,
        }
    }

    root.present()
        .with_context(|| format!("write {}", path.display()))?;
    info!("saved plot to {}", path.display());
    Ok(())
}

/// Render an error-bar chart over categorical x positions.
#[allow(clippy::too_many_arguments)]
pub fn error_bar_chart(
    path: &Path,
    style: &ChartStyle,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    y_range: AxisRange,
    points: &[ErrorPoint],
) -> Result<()> {
    if points.is_empty() {
        return Ok(());
    }
    let root = BitMapBackend::new(path, style.single_size).into_drawing_area();
    root.fill(&WHITE).context("fill chart background")?;

    let ticks: Vec<String> = points.iter().map(|p| p.tick.clone()).collect();
    let x_max = points.len() as f64 - 0.5;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (style.font_family, style.caption_size))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(-0.5f64..x_max, y_range.min..y_range.max)
        .context("build chart axes")?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(points.len())
        .x_label_formatter(&|x: &f64| {
            let nearest = x.round();
            if (x - nearest).abs() > 0.05 || nearest < 0.0 {
                return String::new();
            }
            ticks.get(nearest as usize).cloned().unwrap_or_default()
        })
        .disable_x_mesh()
        .label_style((style.font_family, style.label_size).into_font())
        .light_line_style(RGBColor(230, 230, 230))
        .draw()
        .context("draw chart mesh")?;

    for (i, p) in points.iter().enumerate() {
        let x = i as f64;
        let color = p.color;
        chart
            .draw_series(std::iter::once(ErrorBar::new_vertical(
                x,
                clamp(p.mean - p.std_dev, y_range),
                clamp(p.mean, y_range),
                clamp(p.mean + p.std_dev, y_range),
                color.filled(),
                12,
            )))
            .context("draw error bar")?
            .label(p.label.clone())
            .legend(move |(x, y)| Circle::new((x + 9, y), 4, color.filled()));
        chart
            .draw_series(std::iter::once(Circle::new(
                (x, clamp(p.mean, y_range)),
                style.marker_size + 2,
                color.filled(),
            )))
            .context("draw mean marker")?;
    }

    chart
        .configure_series_labels()
        .border_style(BLACK.mix(0.4))
        .background_style(WHITE.mix(0.85))
        .label_font((style.font_family, style.label_size).into_font())
        .draw()
        .context("draw legend")?;

    root.present()
        .with_context(|| format!("write {}", path.display()))?;
    info!("saved plot to {}", path.display());
    Ok(())
}

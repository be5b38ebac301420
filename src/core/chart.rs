use crate::core::aggregate::{AggregatedTable, HwqSeries};
use crate::error::{PlotError, Result};
use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

/// Fixed look of the figure. Pixel size is derived from inches and DPI.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub caption_px: u32,
    pub label_px: u32,
    pub marker_px: u32,
    pub cap_px: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            title: "time vs streams for different GPU_MAX_HW_QUEUES (1000 kernel launches)".to_string(),
            x_label: "number of streams".to_string(),
            y_label: "execution time (ms)".to_string(),
            width_in: 8.0,
            height_in: 5.0,
            dpi: 200,
            caption_px: 34,
            label_px: 26,
            marker_px: 7,
            cap_px: 12,
        }
    }
}

impl ChartStyle {
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = f64::from(self.dpi);
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }
}

/// Legend text for one hardware-queue setting.
pub fn legend_label(gpu_max_hw_queues: i64) -> String {
    format!("GPU_MAX_HW_QUEUES={gpu_max_hw_queues}")
}

/// Legend entries in drawing order, one per series.
pub fn legend_labels(series: &[HwqSeries]) -> Vec<String> {
    series.iter().map(|s| legend_label(s.gpu_max_hw_queues)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisRanges {
    pub x: Range<f64>,
    pub y: Range<f64>,
}

/// Data extents with padding. Degenerate spans are widened so plotters
/// always gets a non-empty range.
pub fn axis_ranges(series: &[HwqSeries]) -> AxisRanges {
    let points = series
        .iter()
        .flat_map(|s| s.points.iter())
        .filter(|p| p.mean_time_ms.is_finite());

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min: f64 = 0.0;
    let mut y_max = f64::NEG_INFINITY;
    for p in points {
        let x = p.key.num_streams as f64;
        let err = p.error_half_width();
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(p.mean_time_ms - err);
        y_max = y_max.max(p.mean_time_ms + err);
    }

    let x = if x_min > x_max {
        0.0..1.0
    } else if x_min == x_max {
        x_min - 1.0..x_max + 1.0
    } else {
        let pad = (x_max - x_min) * 0.05;
        x_min - pad..x_max + pad
    };

    let y = if y_max <= y_min {
        y_min..y_min + 1.0
    } else {
        let head = (y_max - y_min) * 0.1;
        let low = if y_min < 0.0 { y_min - head } else { y_min };
        low..y_max + head
    };

    AxisRanges { x, y }
}

/// Vertical bar around one mean: `low..=high` with the mean in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorSpan {
    pub x: f64,
    pub low: f64,
    pub mean: f64,
    pub high: f64,
}

/// Points drawn on the line; groups with no usable sample are left out.
pub fn line_points(series: &HwqSeries) -> Vec<(f64, f64)> {
    series
        .points
        .iter()
        .filter(|p| p.mean_time_ms.is_finite())
        .map(|p| (p.key.num_streams as f64, p.mean_time_ms))
        .collect()
}

/// Error bars for a series. Points whose std is absent or zero get none.
pub fn error_spans(series: &HwqSeries) -> Vec<ErrorSpan> {
    series
        .points
        .iter()
        .filter(|p| p.mean_time_ms.is_finite() && p.error_half_width() > 0.0)
        .map(|p| {
            let err = p.error_half_width();
            ErrorSpan {
                x: p.key.num_streams as f64,
                low: p.mean_time_ms - err,
                mean: p.mean_time_ms,
                high: p.mean_time_ms + err,
            }
        })
        .collect()
}

fn render_err<E: Display>(err: E) -> PlotError {
    PlotError::Render(err.to_string())
}

fn format_tick(v: &f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn is_svg(out: &Path) -> bool {
    out.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Draw one error-barred line per hwq value and write the figure to `out`.
///
/// `.svg` outputs go through the SVG backend; anything else is rasterised
/// and encoded from the extension (PNG for `.png`).
pub fn render_chart(
    table: &AggregatedTable,
    out: &Path,
    legend_title: &str,
    style: &ChartStyle,
) -> Result<()> {
    let series = table.series();
    let size = style.pixel_size();
    info!(
        "rendering {} series to {} ({}x{})",
        series.len(),
        out.display(),
        size.0,
        size.1
    );

    if is_svg(out) {
        let root = SVGBackend::new(out, size).into_drawing_area();
        draw(&root, &series, legend_title, style)
    } else {
        let root = BitMapBackend::new(out, size).into_drawing_area();
        draw(&root, &series, legend_title, style)
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &[HwqSeries],
    legend_title: &str,
    style: &ChartStyle,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;

    let ranges = axis_ranges(series);
    debug!("axis ranges x={:?} y={:?}", ranges.x, ranges.y);

    let mut chart = ChartBuilder::on(root)
        .caption(&style.title, ("sans-serif", style.caption_px))
        .margin(30)
        .x_label_area_size(80)
        .y_label_area_size(110)
        .build_cartesian_2d(ranges.x, ranges.y)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(style.x_label.as_str())
        .y_desc(style.y_label.as_str())
        .x_label_formatter(&format_tick)
        .label_style(("sans-serif", style.label_px))
        .axis_desc_style(("sans-serif", style.label_px))
        .bold_line_style(BLACK.mix(0.25))
        .light_line_style(BLACK.mix(0.08))
        .draw()
        .map_err(render_err)?;

    // Title row of the legend: a labelled series with nothing to draw.
    chart
        .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())
        .map_err(render_err)?
        .label(legend_title)
        .legend(|(x, y)| EmptyElement::at((x, y)));

    let marker = style.marker_px;
    let cap = style.cap_px;
    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let xy = line_points(s);

        chart
            .draw_series(LineSeries::new(xy.iter().copied(), color.stroke_width(3)))
            .map_err(render_err)?
            .label(legend_label(s.gpu_max_hw_queues))
            .legend(move |(x, y)| {
                EmptyElement::at((x, y))
                    + PathElement::new(vec![(-20, 0), (20, 0)], color.stroke_width(3))
                    + Circle::new((0, 0), marker, color.filled())
            });

        chart
            .draw_series(xy.iter().map(|&p| Circle::new(p, marker, color.filled())))
            .map_err(render_err)?;

        chart
            .draw_series(error_spans(s).into_iter().map(|e| {
                ErrorBar::new_vertical(e.x, e.low, e.mean, e.high, color.stroke_width(2), cap)
            }))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", style.label_px))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::aggregate;
    use crate::core::record::RunRecord;

    fn table() -> AggregatedTable {
        aggregate(&[
            RunRecord::new(1, 2, 10.0),
            RunRecord::new(1, 2, 20.0),
            RunRecord::new(1, 8, 30.0),
            RunRecord::new(4, 2, 15.0),
            RunRecord::new(8, 4, 5.0),
        ])
    }

    #[test]
    fn test_fixed_resolution() {
        assert_eq!(ChartStyle::default().pixel_size(), (1600, 1000));
    }

    #[test]
    fn test_one_legend_entry_per_hwq() {
        let t = table();
        let labels = legend_labels(&t.series());
        assert_eq!(labels.len(), t.hwq_values().len());
        assert_eq!(
            labels,
            vec![
                "GPU_MAX_HW_QUEUES=1",
                "GPU_MAX_HW_QUEUES=4",
                "GPU_MAX_HW_QUEUES=8"
            ]
        );
    }

    #[test]
    fn test_axis_ranges_cover_error_bars() {
        let r = axis_ranges(&table().series());
        assert!(r.x.start < 2.0 && r.x.end > 8.0);
        assert_eq!(r.y.start, 0.0);
        // (1,2): 15 + 7.07
        assert!(r.y.end > 30.0);
    }

    #[test]
    fn test_axis_ranges_degenerate() {
        let empty = axis_ranges(&[]);
        assert_eq!(empty.x, 0.0..1.0);
        assert_eq!(empty.y, 0.0..1.0);

        let single = aggregate(&[RunRecord::new(2, 4, 3.0)]);
        let r = axis_ranges(&single.series());
        assert_eq!(r.x, 3.0..5.0);
        assert!(r.y.end > 3.0);
    }

    #[test]
    fn test_error_bars_only_for_nonzero_std() {
        let t = aggregate(&[
            RunRecord::new(1, 1, 5.0),
            RunRecord::new(1, 2, 9.0),
            RunRecord::new(1, 2, 9.0),
            RunRecord::new(1, 4, 10.0),
            RunRecord::new(1, 4, 20.0),
        ]);
        let series = t.series();
        assert_eq!(series.len(), 1);

        let spans = error_spans(&series[0]);
        assert_eq!(spans.len(), 1);
        let span = spans[0];
        assert_eq!(span.x, 4.0);
        assert!((span.mean - 15.0).abs() < 1e-12);
        assert!((span.high - span.mean - 50f64.sqrt()).abs() < 1e-12);
        assert!((span.mean - span.low - 50f64.sqrt()).abs() < 1e-12);

        assert_eq!(line_points(&series[0]).len(), 3);
    }

    #[test]
    fn test_all_missing_group_not_drawn() {
        let t = aggregate(&[RunRecord::new(2, 1, 3.0), RunRecord::new(2, 8, f64::NAN)]);
        let series = t.series();
        assert_eq!(line_points(&series[0]), vec![(1.0, 3.0)]);
        assert!(error_spans(&series[0]).is_empty());
        let r = axis_ranges(&series);
        assert_eq!(r.x, 0.0..2.0);
    }

    #[test]
    fn test_svg_detection() {
        assert!(is_svg(Path::new("plot.SVG")));
        assert!(!is_svg(Path::new("plot.png")));
        assert!(!is_svg(Path::new("plot")));
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(&4.0), "4");
        assert_eq!(format_tick(&2.5), "2.5");
    }
}

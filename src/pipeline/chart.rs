//! Chart previews of one numeric column, rendered to SVG with plotters.
//!
//! Charts are a side channel: they read the cleaned table and never modify
//! it. Missing and non-finite values are left out of every chart kind.
//!
//! - **Bar**: one bar per row, x = row position
//! - **Line**: values joined in row order
//! - **Histogram**: [`HISTOGRAM_BINS`] fixed-width bins over `[min, max]`

use crate::config::{ChartKind, ChartRequest};
use crate::dataset::{Column, Dataset};
use crate::error::ConvertError;
use crate::output::{ChartPreview, HistogramBin};
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;
use tracing::debug;

/// Bin count used for histograms.
pub const HISTOGRAM_BINS: usize = 20;

/// Divisor used when raw values span more than an f64 axis can hold.
const AXIS_SCALE: f64 = 1e10;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

/// Pick the column a chart request refers to.
///
/// Returns `Ok(None)` when the table has no numeric column at all, in which
/// case no chart can be offered and the request is skipped.
pub fn resolve_column<'a>(
    ds: &'a Dataset,
    request: &ChartRequest,
) -> Result<Option<&'a Column>, ConvertError> {
    let numeric = ds.numeric_columns();
    let Some(&first) = numeric.first() else {
        return Ok(None);
    };
    let Some(ref name) = request.column else {
        return Ok(Some(first));
    };

    let column = ds.column(name).ok_or_else(|| ConvertError::UnknownColumn {
        name: name.clone(),
        available: ds.column_names().join(", "),
    })?;
    if !column.kind().is_numeric() {
        return Err(ConvertError::NonNumericColumn {
            name: name.clone(),
            kind: column.kind().to_string(),
        });
    }
    Ok(Some(column))
}

/// Render `column` as the requested chart kind.
pub fn render_chart(
    column: &Column,
    kind: ChartKind,
    size: (u32, u32),
) -> Result<ChartPreview, ConvertError> {
    let points: Vec<(usize, f64)> = column
        .numeric_values()
        .into_iter()
        .filter(|(_, v)| v.is_finite())
        .collect();

    // Values whose axis span would overflow an f64 are drawn in scaled units.
    let scale = axis_scale(points.iter().map(|(_, v)| *v));
    let plotted: Vec<(usize, f64)> = points.iter().map(|&(i, v)| (i, v / scale)).collect();
    let axis_label = if scale == 1.0 {
        column.name().to_string()
    } else {
        format!("{} (×{:e})", column.name(), scale)
    };

    let mut svg = String::new();
    let mut bins = Vec::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;
        let caption = format!("{}: {}", kind, column.name());

        match kind {
            ChartKind::Bar => draw_bar(&root, &caption, &axis_label, column.len(), &plotted)?,
            ChartKind::Line => draw_line(&root, &caption, &axis_label, column.len(), &plotted)?,
            ChartKind::Histogram => {
                let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
                bins = histogram(&values, HISTOGRAM_BINS);
                let drawn: Vec<HistogramBin> = bins
                    .iter()
                    .map(|b| HistogramBin {
                        start: b.start / scale,
                        end: b.end / scale,
                        count: b.count,
                    })
                    .collect();
                draw_histogram(&root, &caption, &axis_label, &drawn)?;
            }
        }
        root.present().map_err(chart_err)?;
    }

    debug!(
        "Rendered {} chart of '{}' ({} points, {} bytes SVG)",
        kind,
        column.name(),
        points.len(),
        svg.len()
    );
    Ok(ChartPreview {
        kind,
        column: column.name().to_string(),
        points: points.len(),
        bins,
        svg,
    })
}

/// Split `values` into `bins` equal-width bins over their range.
///
/// The last bin is closed on the right so the maximum is counted. A single
/// distinct value is centred in `[v - 0.5, v + 0.5]`; no values at all give
/// `[0, 1]` with every count zero.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let bins = bins.max(1);
    let (lo, hi) = match min_max(values.iter().copied()) {
        None => (0.0, 1.0),
        Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
        Some(range) => range,
    };
    // Divide before subtracting so spans near f64::MAX do not overflow.
    let n = bins as f64;
    let width = hi / n - lo / n;
    let edge = |i: usize| match i {
        0 => lo,
        i if i == bins => hi,
        i => lo + width * i as f64,
    };

    let mut counts = vec![0usize; bins];
    for &v in values {
        let index = ((v / width - lo / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: edge(i),
            end: edge(i + 1),
            count,
        })
        .collect()
}

// ── Drawing ──────────────────────────────────────────────────────────────

type Area<'a> = DrawingArea<SVGBackend<'a>, plotters::coord::Shift>;

fn chart_err(e: impl Display) -> ConvertError {
    ConvertError::Chart(e.to_string())
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Divisor applied before drawing: 1, or [`AXIS_SCALE`] when the padded
/// axis span of `values` would not fit in an f64.
fn axis_scale(values: impl Iterator<Item = f64>) -> f64 {
    match min_max(values) {
        Some((lo, hi)) if !((hi.max(0.0) - lo.min(0.0)) * 1.25).is_finite() => AXIS_SCALE,
        _ => 1.0,
    }
}

/// Axis range with 5 % padding; optionally pinned to include zero.
fn padded_range(
    values: impl Iterator<Item = f64>,
    include_zero: bool,
) -> Result<Range<f64>, ConvertError> {
    let (mut lo, mut hi) = min_max(values).unwrap_or((0.0, 1.0));
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if lo == hi {
        let half = (lo.abs() * 0.05).max(0.5);
        lo = (lo - half).max(f64::MIN);
        hi = (hi + half).min(f64::MAX);
    }
    let pad = hi * 0.05 - lo * 0.05;
    let range = (lo - pad).max(f64::MIN)..(hi + pad).min(f64::MAX);
    if !(range.end - range.start).is_finite() {
        return Err(ConvertError::Chart(format!(
            "axis range {:e}..{:e} is too wide to draw",
            range.start, range.end
        )));
    }
    Ok(range)
}

fn draw_bar(
    root: &Area<'_>,
    caption: &str,
    y_desc: &str,
    rows: usize,
    points: &[(usize, f64)],
) -> Result<(), ConvertError> {
    let x_range = 0.0..rows.max(1) as f64;
    let y_range = padded_range(points.iter().map(|(_, v)| *v), true)?;

    let mut chart = ChartBuilder::on(root)
        .caption(caption, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc("row")
        .y_desc(y_desc)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(points.iter().map(|&(i, v)| {
            let x = i as f64;
            Rectangle::new([(x + 0.1, 0.0), (x + 0.9, v)], BLUE.filled())
        }))
        .map_err(chart_err)?;
    Ok(())
}

fn draw_line(
    root: &Area<'_>,
    caption: &str,
    y_desc: &str,
    rows: usize,
    points: &[(usize, f64)],
) -> Result<(), ConvertError> {
    let x_range = 0.0..rows.saturating_sub(1).max(1) as f64;
    let y_range = padded_range(points.iter().map(|(_, v)| *v), false)?;

    let mut chart = ChartBuilder::on(root)
        .caption(caption, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc("row")
        .y_desc(y_desc)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(
            points.iter().map(|&(i, v)| (i as f64, v)),
            &BLUE,
        ))
        .map_err(chart_err)?;
    Ok(())
}

fn draw_histogram(
    root: &Area<'_>,
    caption: &str,
    x_desc: &str,
    bins: &[HistogramBin],
) -> Result<(), ConvertError> {
    let x_range = padded_range(bins.iter().flat_map(|b| [b.start, b.end]), false)?;
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(root)
        .caption(caption, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, 0.0..(max_count as f64 + 1.0))
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("count")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            bins.iter()
                .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], SKY_BLUE.filled())),
        )
        .map_err(chart_err)?;
    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLACK.stroke_width(1))
        }))
        .map_err(chart_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;

    fn numbers(values: &[Option<f64>]) -> Dataset {
        Dataset::from_rows(
            vec!["v".into(), "label".into()],
            values
                .iter()
                .map(|v| {
                    vec![
                        v.map_or(Cell::Missing, Cell::Float),
                        Cell::Text("x".into()),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn histogram_has_twenty_equal_bins() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let bins = histogram(&values, HISTOGRAM_BINS);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[19].end, 100.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 101);
        // 100.0 lands in the closed last bin.
        assert_eq!(bins[19].count, 6);
    }

    #[test]
    fn histogram_single_value_is_centred() {
        let bins = histogram(&[3.0, 3.0], 20);
        assert_eq!(bins[0].start, 2.5);
        assert_eq!(bins[19].end, 3.5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn histogram_of_nothing() {
        let bins = histogram(&[], 20);
        assert_eq!(bins.len(), 20);
        assert!(bins.iter().all(|b| b.count == 0));
        assert_eq!(bins[19].end, 1.0);
    }

    #[test]
    fn resolve_defaults_to_first_numeric() {
        let ds = numbers(&[Some(1.0)]);
        let col = resolve_column(&ds, &ChartRequest::default()).unwrap().unwrap();
        assert_eq!(col.name(), "v");
    }

    #[test]
    fn resolve_rejects_text_column() {
        let ds = numbers(&[Some(1.0)]);
        let req = ChartRequest {
            kind: ChartKind::Line,
            column: Some("label".into()),
        };
        let err = resolve_column(&ds, &req).unwrap_err();
        assert!(matches!(err, ConvertError::NonNumericColumn { .. }));
    }

    #[test]
    fn resolve_rejects_unknown_column() {
        let ds = numbers(&[Some(1.0)]);
        let req = ChartRequest {
            kind: ChartKind::Bar,
            column: Some("nope".into()),
        };
        assert!(matches!(
            resolve_column(&ds, &req).unwrap_err(),
            ConvertError::UnknownColumn { .. }
        ));
    }

    #[test]
    fn resolve_without_numeric_columns_is_none() {
        let ds = Dataset::from_rows(vec!["t".into()], vec![vec![Cell::Text("a".into())]]).unwrap();
        let req = ChartRequest {
            kind: ChartKind::Bar,
            column: Some("t".into()),
        };
        assert!(resolve_column(&ds, &req).unwrap().is_none());
    }

    #[test]
    fn renders_every_kind_to_svg() {
        let ds = numbers(&[Some(1.0), None, Some(4.0), Some(2.5)]);
        let col = ds.column("v").unwrap();
        for kind in [ChartKind::Bar, ChartKind::Line, ChartKind::Histogram] {
            let chart = render_chart(col, kind, (320, 240)).unwrap();
            assert!(chart.svg.contains("<svg"), "{kind}: no svg root");
            assert_eq!(chart.points, 3, "{kind}: missing value should be skipped");
            assert_eq!(chart.kind, kind);
            assert_eq!(chart.bins.is_empty(), kind != ChartKind::Histogram);
        }
    }

    #[test]
    fn chart_does_not_touch_dataset() {
        let ds = numbers(&[Some(1.0), Some(2.0)]);
        let before = ds.clone();
        let col = ds.column("v").unwrap();
        render_chart(col, ChartKind::Histogram, (320, 240)).unwrap();
        assert_eq!(ds, before);
    }

    #[test]
    fn histogram_spanning_the_whole_f64_range() {
        let bins = histogram(&[-1e308, 1e308], 20);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[19].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(bins[0].start, -1e308);
        assert_eq!(bins[19].end, 1e308);
        assert!(bins.iter().all(|b| b.start.is_finite() && b.end.is_finite()));
    }

    #[test]
    fn renders_extreme_magnitudes() {
        let ds = numbers(&[Some(-1e308), Some(1e308)]);
        let col = ds.column("v").unwrap();
        for kind in [ChartKind::Bar, ChartKind::Line, ChartKind::Histogram] {
            let chart = render_chart(col, kind, (320, 240)).unwrap();
            assert!(chart.svg.contains("<svg"), "{kind}: no svg root");
            assert_eq!(chart.points, 2);
        }
    }

    #[test]
    fn padded_range_stays_finite() {
        let range = padded_range([-4e307, 4e307].into_iter(), true).unwrap();
        assert!(range.start.is_finite() && range.end.is_finite());
        assert!(range.start < -4e307 && range.end > 4e307);

        let single = padded_range([f64::MAX].into_iter(), false).unwrap();
        assert!(single.start < single.end);

        let too_wide = padded_range([f64::MIN, f64::MAX].into_iter(), false);
        assert!(matches!(too_wide, Err(ConvertError::Chart(_))));
    }

    #[test]
    fn axis_scale_only_for_overflowing_spans() {
        assert_eq!(axis_scale([1.0, 4.0].into_iter()), 1.0);
        assert_eq!(axis_scale([-1e308, 1e308].into_iter()), AXIS_SCALE);
    }
}

/// Chart layer: turn a table into backend-neutral marks, then draw them.
///
/// ```text
///   Table ──► Chart::build ──► Chart { axes, Vec<Series> }
///                                 │
///                  ┌──────────────┴──────────────┐
///                  ▼                             ▼
///          export (plotters)             ui::plot (egui_plot)
///          .png / .jpg / .svg            native window
/// ```
pub mod export;
pub mod stats;

use std::ops::Range;

use crate::color::{generate_palette, Rgb};
use crate::config::ChartKind;
use crate::data::model::{Column, Table};
use crate::error::{PlotError, Result};
use stats::{bin_edges, box_stats, finite_extent, histogram, BoxStats, HISTOGRAM_BINS};

/// Total width of one group of bars, in category units.
const BAR_GROUP_WIDTH: f64 = 0.5;

/// Width of a box, in category units.
pub const BOX_WIDTH: f64 = 0.5;

/// Fraction of the data span added on each side of an axis.
const AXIS_MARGIN: f64 = 0.05;

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

/// Optional texts; absent ones are left out of the chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: Option<String>,
    pub range: Range<f64>,
    /// Tick labels for integer positions; empty for a numeric axis.
    pub categories: Vec<String>,
}

impl Axis {
    /// Text for a tick at `value`.
    pub fn tick_label(&self, value: f64) -> String {
        if self.categories.is_empty() {
            return format_number(value);
        }
        let pos = value.round();
        if (value - pos).abs() > 1e-6 || pos < 0.0 {
            return String::new();
        }
        self.categories
            .get(pos as usize)
            .cloned()
            .unwrap_or_default()
    }
}

/// Axis-aligned rectangle in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    /// NaN `y` values break the line.
    Line(Vec<(f64, f64)>),
    /// Band between `lower` and `upper`, sharing x coordinates.
    Area {
        lower: Vec<(f64, f64)>,
        upper: Vec<(f64, f64)>,
    },
    Bars { rects: Vec<Rect>, horizontal: bool },
    Box { position: f64, stats: BoxStats },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Rgb,
    pub mark: Mark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

/// Runs of finite points, split wherever `y` is NaN.
pub fn segments(points: &[(f64, f64)]) -> impl Iterator<Item = &[(f64, f64)]> {
    points
        .split(|(x, y)| !x.is_finite() || !y.is_finite())
        .filter(|run| !run.is_empty())
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

impl Chart {
    /// Lay out `table` as a chart of the given kind.
    ///
    /// Only numeric columns are plotted; the others are skipped with a
    /// warning. Rows run along the x axis (the y axis for `barh`).
    pub fn build(table: &Table, kind: ChartKind, labels: Labels) -> Result<Chart> {
        let columns: Vec<(&str, Vec<f64>)> = table
            .columns
            .iter()
            .filter_map(|c| match c.numeric() {
                Some(values) => Some((c.name.as_str(), values)),
                None => {
                    log::warn!("skipping non-numeric column {:?}", c.name);
                    None
                }
            })
            .collect();
        if columns.is_empty() {
            return Err(PlotError::NoNumericData);
        }

        let colors = generate_palette(columns.len());
        let n_rows = table.n_rows();
        let mut categories = Vec::new();

        // one mark per column; a box with nothing to summarise is None
        let marks: Vec<Option<Mark>> = match kind {
            ChartKind::Line => {
                let (xs, ticks) = row_positions(table.index.as_ref(), n_rows);
                categories = ticks;
                columns
                    .iter()
                    .map(|(_, ys)| {
                        Some(Mark::Line(
                            xs.iter().copied().zip(ys.iter().copied()).collect(),
                        ))
                    })
                    .collect()
            }
            ChartKind::Area => {
                let (xs, ticks) = row_positions(table.index.as_ref(), n_rows);
                categories = ticks;
                let mut base = vec![0.0; n_rows];
                columns
                    .iter()
                    .map(|(_, ys)| {
                        let lower: Vec<(f64, f64)> =
                            xs.iter().copied().zip(base.iter().copied()).collect();
                        for (b, y) in base.iter_mut().zip(ys) {
                            if y.is_finite() {
                                *b += y;
                            }
                        }
                        let upper = xs.iter().copied().zip(base.iter().copied()).collect();
                        Some(Mark::Area { lower, upper })
                    })
                    .collect()
            }
            ChartKind::Bar | ChartKind::HorizontalBar => {
                categories = row_labels(table.index.as_ref(), n_rows);
                let horizontal = kind == ChartKind::HorizontalBar;
                let width = BAR_GROUP_WIDTH / columns.len() as f64;
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, (_, ys))| {
                        let offset = -BAR_GROUP_WIDTH / 2.0 + width * i as f64;
                        let rects = ys
                            .iter()
                            .enumerate()
                            .filter(|(_, v)| v.is_finite())
                            .map(|(row, &v)| {
                                let a0 = row as f64 + offset;
                                let (v0, v1) = (v.min(0.0), v.max(0.0));
                                if horizontal {
                                    Rect {
                                        x0: v0,
                                        x1: v1,
                                        y0: a0,
                                        y1: a0 + width,
                                    }
                                } else {
                                    Rect {
                                        x0: a0,
                                        x1: a0 + width,
                                        y0: v0,
                                        y1: v1,
                                    }
                                }
                            })
                            .collect();
                        Some(Mark::Bars { rects, horizontal })
                    })
                    .collect()
            }
            ChartKind::Histogram => {
                let all = columns.iter().flat_map(|(_, ys)| ys.iter().copied());
                let edges = bin_edges(all, HISTOGRAM_BINS).unwrap_or_default();
                columns
                    .iter()
                    .map(|(_, ys)| {
                        let rects = histogram(ys, &edges)
                            .into_iter()
                            .enumerate()
                            .map(|(bin, count)| Rect {
                                x0: edges[bin],
                                x1: edges[bin + 1],
                                y0: 0.0,
                                y1: count as f64,
                            })
                            .collect();
                        Some(Mark::Bars {
                            rects,
                            horizontal: false,
                        })
                    })
                    .collect()
            }
            ChartKind::BoxPlot => {
                categories = columns.iter().map(|(name, _)| name.to_string()).collect();
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, (name, ys))| match box_stats(ys) {
                        Some(stats) => Some(Mark::Box {
                            position: i as f64,
                            stats,
                        }),
                        None => {
                            log::warn!("column {name:?} has no values to summarise");
                            None
                        }
                    })
                    .collect()
            }
        };

        let series: Vec<Series> = columns
            .iter()
            .zip(colors)
            .zip(marks)
            .filter_map(|(((name, _), color), mark)| {
                Some(Series {
                    name: name.to_string(),
                    color,
                    mark: mark?,
                })
            })
            .collect();

        let (x_span, y_span) = extent(&series, kind);
        let (mut x, mut y) = (
            Axis {
                label: labels.x_label,
                range: padded(x_span),
                categories: Vec::new(),
            },
            Axis {
                label: labels.y_label,
                range: padded(y_span),
                categories: Vec::new(),
            },
        );
        if kind == ChartKind::HorizontalBar {
            y.categories = categories;
        } else {
            x.categories = categories;
        }

        Ok(Chart {
            kind,
            title: labels.title,
            x,
            y,
            series,
        })
    }

    /// Box plots label their categories on the axis instead.
    pub fn shows_legend(&self) -> bool {
        self.kind != ChartKind::BoxPlot
    }
}

/// X coordinates for rows: the index values when they are all numbers,
/// otherwise row positions labelled by the index.
fn row_positions(index: Option<&Column>, n_rows: usize) -> (Vec<f64>, Vec<String>) {
    if let Some(values) = index.and_then(Column::numeric) {
        if values.iter().all(|v| v.is_finite()) {
            return (values, Vec::new());
        }
    }
    let positions = (0..n_rows).map(|i| i as f64).collect();
    let labels = match index {
        Some(_) => row_labels(index, n_rows),
        None => Vec::new(),
    };
    (positions, labels)
}

/// Category labels for rows: the index values, or the row positions.
fn row_labels(index: Option<&Column>, n_rows: usize) -> Vec<String> {
    match index {
        Some(col) => col.values.iter().map(|v| v.to_string()).collect(),
        None => (0..n_rows).map(|i| i.to_string()).collect(),
    }
}

/// Data extent of all marks, as `(x, y)` spans.
fn extent(series: &[Series], kind: ChartKind) -> (Option<(f64, f64)>, Option<(f64, f64)>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for s in series {
        match &s.mark {
            Mark::Line(points) => {
                for (x, y) in points {
                    xs.push(*x);
                    ys.push(*y);
                }
            }
            Mark::Area { lower, upper } => {
                for (x, y) in lower.iter().chain(upper) {
                    xs.push(*x);
                    ys.push(*y);
                }
            }
            Mark::Bars { rects, .. } => {
                for r in rects {
                    xs.extend([r.x0, r.x1]);
                    ys.extend([r.y0, r.y1]);
                }
            }
            Mark::Box { position, stats } => {
                let half = BOX_WIDTH / 2.0;
                xs.extend([position - half, position + half]);
                ys.extend([stats.lower_whisker, stats.upper_whisker]);
                ys.extend(stats.outliers.iter().copied());
            }
        }
    }
    // bars grow from zero
    match kind {
        ChartKind::Bar | ChartKind::Histogram => ys.push(0.0),
        ChartKind::HorizontalBar => xs.push(0.0),
        _ => {}
    }
    (finite_extent(xs), finite_extent(ys))
}

fn padded(span: Option<(f64, f64)>) -> Range<f64> {
    match span {
        None => 0.0..1.0,
        Some((lo, hi)) if lo == hi => (lo - 0.5)..(hi + 0.5),
        Some((lo, hi)) => {
            let pad = (hi - lo) * AXIS_MARGIN;
            (lo - pad)..(hi + pad)
        }
    }
}

/// Compact tick text: integers without decimals, others trimmed.
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let magnitude = v.abs();
    if !(1e-3..1e6).contains(&magnitude) {
        return format!("{v:.2e}");
    }
    let text = format!("{v:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

use std::path::Path;
use std::sync::OnceLock;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use super::{segments, Chart, Mark, BOX_WIDTH};
use crate::color::Rgb;
use crate::config::ChartKind;
use crate::error::{PlotError, Result};

/// Size of exported images, in pixels.
pub const FIGURE_SIZE: (u32, u32) = (1200, 800);

/// Plotting-area background, a light blue-grey with white grid lines.
const BACKGROUND: RGBColor = RGBColor(234, 234, 242);

const FONT: &str = "sans-serif";

/// Text face for every label, shipped with the binary so exports do not
/// depend on the fonts installed on the host.
static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Register [`FONT_DATA`] under [`FONT`] once per process.
fn register_fonts() -> std::result::Result<(), String> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT, FontStyle::Normal, FONT_DATA).map_err(|_| "invalid font data".to_string())
        })
        .clone()
}

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Vector output through the SVG backend.
    Svg,
    /// Raster output, encoded by the `image` crate from the extension.
    Raster,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> ExportFormat {
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if is_svg {
            ExportFormat::Svg
        } else {
            ExportFormat::Raster
        }
    }
}

/// Draw the chart into `path`. The drawing area lives only for this call.
pub fn save(chart: &Chart, path: &Path) -> Result<()> {
    let export_err = |e: &dyn std::fmt::Display| PlotError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    register_fonts().map_err(|e| export_err(&e))?;

    match ExportFormat::from_path(path) {
        ExportFormat::Svg => {
            let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
            draw(&root, chart).map_err(|e| export_err(&e))?;
            root.present().map_err(|e| export_err(&e))?;
        }
        ExportFormat::Raster => {
            let (width, height) = FIGURE_SIZE;
            let mut buffer = vec![0u8; width as usize * height as usize * 3];
            {
                let root =
                    BitMapBackend::with_buffer(&mut buffer, FIGURE_SIZE).into_drawing_area();
                draw(&root, chart).map_err(|e| export_err(&e))?;
                root.present().map_err(|e| export_err(&e))?;
            }
            image::save_buffer(path, &buffer, width, height, image::ColorType::Rgb8).map_err(
                |source| PlotError::Image {
                    path: path.to_path_buf(),
                    source,
                },
            )?;
        }
    }

    log::info!("chart written to {}", path.display());
    Ok(())
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

type DrawResult<DB> =
    std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &Chart) -> DrawResult<DB> {
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(20).x_label_area_size(60).y_label_area_size(90);
    if let Some(title) = &chart.title {
        builder.caption(title, (FONT, 30));
    }
    let mut ctx = builder.build_cartesian_2d(chart.x.range.clone(), chart.y.range.clone())?;
    ctx.plotting_area().fill(&BACKGROUND)?;

    let x_fmt = |v: &f64| chart.x.tick_label(*v);
    let y_fmt = |v: &f64| chart.y.tick_label(*v);
    {
        let mut mesh = ctx.configure_mesh();
        mesh.light_line_style(TRANSPARENT)
            .bold_line_style(WHITE.stroke_width(1))
            .axis_style(TRANSPARENT)
            .set_all_tick_mark_size(2)
            .label_style((FONT, 18))
            .axis_desc_style((FONT, 22))
            .x_labels(tick_count(&chart.x.categories))
            .y_labels(tick_count(&chart.y.categories))
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt);
        if let Some(label) = &chart.x.label {
            mesh.x_desc(label);
        }
        if let Some(label) = &chart.y.label {
            mesh.y_desc(label);
        }
        mesh.draw()?;
    }

    let fill_alpha = match chart.kind {
        ChartKind::Histogram => 0.5,
        _ => 0.85,
    };

    for series in &chart.series {
        let color = rgb(series.color);
        match &series.mark {
            Mark::Line(points) => {
                for (i, run) in segments(points).enumerate() {
                    let line = LineSeries::new(run.iter().copied(), color.stroke_width(2));
                    let drawn = ctx.draw_series(line)?;
                    if i == 0 {
                        drawn.label(&series.name).legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                        });
                    }
                }
            }
            Mark::Area { lower, upper } => {
                let outline: Vec<(f64, f64)> =
                    upper.iter().chain(lower.iter().rev()).copied().collect();
                ctx.draw_series(std::iter::once(Polygon::new(outline, color.mix(0.6).filled())))?
                    .label(&series.name)
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 6), (x + 20, y + 6)], color.mix(0.6).filled())
                    });
                ctx.draw_series(LineSeries::new(upper.iter().copied(), color.stroke_width(1)))?;
            }
            Mark::Bars { rects, .. } => {
                ctx.draw_series(rects.iter().map(|r| {
                    Rectangle::new([(r.x0, r.y0), (r.x1, r.y1)], color.mix(fill_alpha).filled())
                }))?
                .label(&series.name)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 6), (x + 20, y + 6)], color.mix(fill_alpha).filled())
                });
            }
            Mark::Box { position, stats } => {
                let (p, half, cap) = (*position, BOX_WIDTH / 2.0, BOX_WIDTH / 4.0);
                let style = color.stroke_width(2);
                let (left, right) = (p - half, p + half);
                ctx.draw_series(std::iter::once(Rectangle::new(
                    [(left, stats.q1), (right, stats.q3)],
                    color.mix(0.3).filled(),
                )))?;
                let strokes = [
                    vec![
                        (left, stats.q1),
                        (right, stats.q1),
                        (right, stats.q3),
                        (left, stats.q3),
                        (left, stats.q1),
                    ],
                    vec![(left, stats.median), (right, stats.median)],
                    vec![(p, stats.q3), (p, stats.upper_whisker)],
                    vec![(p, stats.q1), (p, stats.lower_whisker)],
                    vec![(p - cap, stats.upper_whisker), (p + cap, stats.upper_whisker)],
                    vec![(p - cap, stats.lower_whisker), (p + cap, stats.lower_whisker)],
                ];
                ctx.draw_series(strokes.into_iter().map(|s| PathElement::new(s, style)))?;
                ctx.draw_series(
                    stats
                        .outliers
                        .iter()
                        .map(|&v| Circle::new((p, v), 4, color.stroke_width(1))),
                )?;
            }
        }
    }

    if chart.shows_legend() {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(BLACK.mix(0.2))
            .background_style(WHITE.mix(0.8))
            .label_font((FONT, 18))
            .draw()?;
    }

    Ok(())
}

/// Ask for one label per category, or a handful on a numeric axis.
fn tick_count(categories: &[String]) -> usize {
    if categories.is_empty() {
        10
    } else {
        categories.len().min(40) + 1
    }
}

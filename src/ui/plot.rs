use eframe::egui::{Color32, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, MarkerShape, Plot, PlotPoints,
    Points,
};

use crate::chart::{segments, Chart, Mark, BOX_WIDTH};
use crate::color::Rgb;
use crate::config::ChartKind;

// ---------------------------------------------------------------------------
// Chart plot (central panel)
// ---------------------------------------------------------------------------

fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

/// Render the chart in the central panel.
pub fn chart_plot(ui: &mut Ui, chart: &Chart) {
    let mut plot = Plot::new("chart")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .include_x(chart.x.range.start)
        .include_x(chart.x.range.end)
        .include_y(chart.y.range.start)
        .include_y(chart.y.range.end);

    if chart.shows_legend() {
        plot = plot.legend(Legend::default());
    }
    if let Some(label) = &chart.x.label {
        plot = plot.x_axis_label(label.clone());
    }
    if let Some(label) = &chart.y.label {
        plot = plot.y_axis_label(label.clone());
    }
    if !chart.x.categories.is_empty() {
        let axis = chart.x.clone();
        plot = plot.x_axis_formatter(move |mark, _range| axis.tick_label(mark.value));
    }
    if !chart.y.categories.is_empty() {
        let axis = chart.y.clone();
        plot = plot.y_axis_formatter(move |mark, _range| axis.tick_label(mark.value));
    }

    // stacked areas are filled down to zero, so paint the tallest first
    let ordered: Vec<_> = if chart.kind == ChartKind::Area {
        chart.series.iter().rev().collect()
    } else {
        chart.series.iter().collect()
    };

    plot.show(ui, |plot_ui| {
        for series in ordered {
            let color = color32(series.color);
            let name = series.name.as_str();

            match &series.mark {
                Mark::Line(points) => {
                    for run in segments(points) {
                        let points: PlotPoints = run.iter().map(|&(x, y)| [x, y]).collect();
                        plot_ui.line(Line::new(points).name(name).color(color).width(1.5));
                    }
                }
                Mark::Area { upper, .. } => {
                    let points: PlotPoints = upper.iter().map(|&(x, y)| [x, y]).collect();
                    plot_ui.line(
                        Line::new(points)
                            .name(name)
                            .color(color)
                            .width(1.0)
                            .fill(0.0),
                    );
                }
                Mark::Bars { rects, horizontal } => {
                    let bars: Vec<Bar> = rects
                        .iter()
                        .map(|r| {
                            if *horizontal {
                                Bar::new((r.y0 + r.y1) / 2.0, r.x1 - r.x0)
                                    .width(r.y1 - r.y0)
                                    .base_offset(r.x0)
                            } else {
                                Bar::new((r.x0 + r.x1) / 2.0, r.y1 - r.y0)
                                    .width(r.x1 - r.x0)
                                    .base_offset(r.y0)
                            }
                        })
                        .collect();
                    let mut bar_chart = BarChart::new(bars).name(name).color(color);
                    if *horizontal {
                        bar_chart = bar_chart.horizontal();
                    }
                    plot_ui.bar_chart(bar_chart);
                }
                Mark::Box { position, stats } => {
                    let spread = BoxSpread::new(
                        stats.lower_whisker,
                        stats.q1,
                        stats.median,
                        stats.q3,
                        stats.upper_whisker,
                    );
                    let elem = BoxElem::new(*position, spread)
                        .name(name)
                        .box_width(BOX_WIDTH)
                        .whisker_width(BOX_WIDTH / 2.0);
                    plot_ui.box_plot(BoxPlot::new(vec![elem]).color(color));

                    if !stats.outliers.is_empty() {
                        let points: PlotPoints =
                            stats.outliers.iter().map(|&v| [*position, v]).collect();
                        plot_ui.points(
                            Points::new(points)
                                .shape(MarkerShape::Circle)
                                .radius(3.0)
                                .color(color),
                        );
                    }
                }
            }
        }
    });
}

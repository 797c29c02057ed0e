use eframe::egui;

use crate::chart::Chart;
use crate::error::{PlotError, Result};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ChartApp {
    pub chart: Chart,
}

impl ChartApp {
    pub fn new(chart: Chart) -> Self {
        Self { chart }
    }
}

impl eframe::App for ChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: title ----
        if let Some(title) = &self.chart.title {
            egui::TopBottomPanel::top("title").show(ctx, |ui| {
                ui.vertical_centered(|ui| ui.heading(title));
            });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_plot(ui, &self.chart);
        });
    }
}

/// Open a window showing `chart` and block until it is closed. The window
/// and its graphics context are torn down before this returns.
pub fn show(chart: Chart, window_title: &str) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    log::debug!("opening chart window {window_title:?}");
    eframe::run_native(
        window_title,
        options,
        Box::new(move |_cc| Ok(Box::new(ChartApp::new(chart)))),
    )
    .map_err(|e| PlotError::Window(e.to_string()))
}

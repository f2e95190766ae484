use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct BatteryPlotterApp {
    pub state: AppState,
}

impl BatteryPlotterApp {
    /// Start with files passed on the command line already loaded.
    pub fn with_files(files: Vec<std::path::PathBuf>) -> Self {
        let mut app = Self::default();
        if !files.is_empty() {
            app.state.set_files(files);
        }
        app
    }
}

impl eframe::App for BatteryPlotterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selections ----
        egui::SidePanel::left("settings_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: data preview ----
        egui::TopBottomPanel::bottom("data_preview")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                table::data_preview(ui, &mut self.state);
            });

        // ---- Central panel: chart preview ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_preview(ui, &self.state);
        });
    }
}

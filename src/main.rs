mod app;
mod state;
mod ui;

use std::path::PathBuf;

use app::BatteryPlotterApp;
use clap::Parser;
use eframe::egui;

/// Interactive preview of battery test exports.
#[derive(Parser)]
#[command(name = "battery-plotter", version)]
struct Args {
    /// Export files or directories to open on start
    files: Vec<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Battery Graph Preview",
        options,
        Box::new(move |_cc| Ok(Box::new(BatteryPlotterApp::with_files(args.files)))),
    )
}

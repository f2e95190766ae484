pub mod panels;
pub mod plot;
pub mod table;

use eframe::egui::Color32;

/// Convert a chart colour string to an egui colour.
pub fn color32(color: &str) -> Color32 {
    match battery_plotter::color::parse_hex(color) {
        Some(rgb) => Color32::from_rgb(rgb.red, rgb.green, rgb.blue),
        None => Color32::TRANSPARENT,
    }
}

use eframe::egui::{self, RichText, Ui};
use egui_plot::{Line, Plot, PlotPoints, Points};

use battery_plotter::chart::{DisplayMode, DragMode, Trace, YAxis};

use crate::state::AppState;
use crate::ui::color32;

// ---------------------------------------------------------------------------
// Chart preview (central panel)
// ---------------------------------------------------------------------------

/// Render the composed chart: left-axis traces on top, right-axis traces
/// below, sharing the x range.
pub fn chart_preview(ui: &mut Ui, state: &AppState) {
    let chart = match &state.chart {
        Some(chart) => chart,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open battery exports to preview a graph  (File → Open files…)");
            });
            return;
        }
    };
    let layout = &chart.layout;

    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(&layout.title.text);
    });
    if let Some(note) = chart.note() {
        ui.label(RichText::new(note.replace("<br>", "\n")).italics());
    }

    let height = (ui.available_height() / 2.0 - 4.0).max(80.0);
    let zoom = layout.dragmode == DragMode::Zoom;

    for (id, axis, title) in [
        ("left_axis", YAxis::Left, &layout.yaxis.title),
        ("right_axis", YAxis::Right, &layout.yaxis2.title),
    ] {
        Plot::new(id)
            .height(height)
            .legend(egui_plot::Legend::default())
            .x_axis_label(layout.xaxis.title.text.as_str())
            .y_axis_label(title.text.as_str())
            .link_axis("battery_x", egui::Vec2b::new(true, false))
            .link_cursor("battery_x", egui::Vec2b::new(true, false))
            .allow_drag(!zoom)
            .allow_boxed_zoom(zoom)
            .allow_scroll(true)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                for trace in chart.traces_on(axis).filter(|t| !t.is_placeholder()) {
                    let name = trace.name.clone().unwrap_or_default();
                    let color = color32(&trace.line.color);

                    if matches!(trace.mode, DisplayMode::Lines | DisplayMode::LinesAndMarkers) {
                        let line = Line::new(points(trace))
                            .name(&name)
                            .color(color)
                            .width(1.5);
                        plot_ui.line(line);
                    }
                    if matches!(trace.mode, DisplayMode::Markers | DisplayMode::LinesAndMarkers) {
                        let radius = trace.marker.as_ref().map_or(2.0, |m| m.size as f32 / 2.0);
                        let dots = Points::new(points(trace))
                            .name(&name)
                            .color(color)
                            .radius(radius);
                        plot_ui.points(dots);
                    }
                }
            });
    }
}

/// Numeric (x, y) pairs of a trace. Text x values fall back to the row
/// position; rows without a numeric y are dropped.
fn points(trace: &Trace) -> PlotPoints {
    let numeric_x = trace.x.iter().any(|v| v.as_f64().is_some());
    trace
        .x
        .iter()
        .zip(&trace.y)
        .enumerate()
        .filter_map(|(i, (x, y))| {
            let x = if numeric_x { x.as_f64()? } else { i as f64 };
            Some([x, y.as_f64()?])
        })
        .collect()
}

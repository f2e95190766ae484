use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use battery_plotter::chart::XInteraction;
use battery_plotter::data::CapacitySource;
use battery_plotter::{PlotSettings, PlotStyle, SheetKind};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – chart selections
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Chart");
    ui.separator();

    if state.loaded.is_empty() {
        ui.label("No files loaded.");
        skipped_list(ui, state);
        return;
    }

    // Clone what we need so we can mutate state inside the loops.
    let columns = state.available_columns.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- X axis ----
            ui.strong("X-axis column");
            let current_x = state.settings.x_column.clone();
            egui::ComboBox::from_id_salt("x_column")
                .selected_text(&current_x)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &columns {
                        if ui.selectable_label(current_x == *col, col).clicked() {
                            state.settings.x_column = col.clone();
                            state.settings.x_label = col.clone();
                            state.dirty = true;
                        }
                    }
                });
            if ui
                .checkbox(&mut state.settings.discrete_x, "Discrete x (markers)")
                .changed()
            {
                state.dirty = true;
            }
            ui.separator();

            // ---- Y axes ----
            column_picker(ui, state, &columns, false);
            column_picker(ui, state, &columns, true);
            ui.separator();

            derived_columns(ui, state);
            ui.separator();

            labels(ui, state);
            ui.separator();

            // ---- Style / interaction ----
            ui.strong("Plot style");
            ui.horizontal(|ui: &mut Ui| {
                let before = state.settings.plot_style;
                ui.radio_value(&mut state.settings.plot_style, PlotStyle::Lines, "Lines");
                ui.radio_value(&mut state.settings.plot_style, PlotStyle::Dots, "Dots");
                state.dirty |= before != state.settings.plot_style;
            });

            ui.strong("X-axis interaction");
            ui.horizontal(|ui: &mut Ui| {
                let before = state.settings.x_interaction;
                for mode in [XInteraction::RangeSlider, XInteraction::DragZoom] {
                    ui.radio_value(&mut state.settings.x_interaction, mode, mode.label());
                }
                state.dirty |= before != state.settings.x_interaction;
            });
            ui.separator();

            // ---- Finalize ----
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Finalize & Save as HTML").clicked() {
                    state.finalize();
                }
                if ui.button("Discard").clicked() {
                    state.discard();
                }
            });

            skipped_list(ui, state);
        });

    // Rebuild the chart after any selection change.
    if state.dirty {
        state.rebuild();
    }
}

/// Checkbox list of columns for one y axis.
fn column_picker(ui: &mut Ui, state: &mut AppState, columns: &[String], right_axis: bool) {
    let selected = if right_axis {
        &state.settings.right_columns
    } else {
        &state.settings.left_columns
    };
    let title = if right_axis { "Right Y-axis" } else { "Left Y-axis" };
    let header_text = format!("{title}  ({}/{})", selected.len(), columns.len());
    let selected = selected.clone();

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            for col in columns {
                let mut checked = selected.contains(col);
                if ui.checkbox(&mut checked, col).changed() {
                    state.toggle_column(right_axis, col);
                }
            }
        });
}

fn derived_columns(ui: &mut Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(RichText::new("Derived Columns").strong())
        .id_salt("derived")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let mut normalized = state.settings.derived.normalized_capacity.is_some();
            if ui
                .checkbox(&mut normalized, "Add Normalized Capacity (mAh/g)")
                .changed()
            {
                state.set_normalized_enabled(normalized);
            }

            if normalized {
                let mut changed = false;
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("Active material mass (g):");
                    changed |= ui
                        .add(
                            egui::DragValue::new(&mut state.normalized.active_mass_g)
                                .range(0.0001..=1.0e6)
                                .speed(0.001)
                                .max_decimals(4),
                        )
                        .changed();
                });
                for source in [CapacitySource::Discharge, CapacitySource::Charge] {
                    changed |= ui
                        .radio_value(&mut state.normalized.source, source, source.column())
                        .changed();
                }
                if changed {
                    state.sync_normalized();
                }
            }

            if ui
                .checkbox(
                    &mut state.settings.derived.coulombic_efficiency,
                    "Add Coulombic Efficiency",
                )
                .changed()
            {
                state.dirty = true;
            }
        });
}

fn labels(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Labels");
    let settings: &mut PlotSettings = &mut state.settings;
    let mut changed = false;

    egui::Grid::new("labels_grid")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            for (name, value) in [
                ("Graph title", &mut settings.graph_title),
                ("X-axis label", &mut settings.x_label),
                ("Left Y-axis label", &mut settings.left_label),
                ("Right Y-axis label", &mut settings.right_label),
            ] {
                ui.label(name);
                changed |= ui.text_edit_singleline(value).changed();
                ui.end_row();
            }
        });

    ui.label("Notes");
    changed |= ui.text_edit_multiline(&mut settings.notes).changed();

    state.dirty |= changed;
}

fn skipped_list(ui: &mut Ui, state: &AppState) {
    if state.skipped.is_empty() {
        return;
    }
    ui.separator();
    ui.strong("Skipped files");
    for message in &state.skipped {
        ui.label(RichText::new(message).color(Color32::YELLOW));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open files…").clicked() {
                open_files_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open export folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Load settings…").clicked() {
                load_settings_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save settings…").clicked() {
                save_settings_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label("Data source:");
        let mut kind = state.settings.sheet_kind;
        ui.radio_value(&mut kind, SheetKind::Channel, SheetKind::Channel.label());
        ui.radio_value(&mut kind, SheetKind::Statistics, SheetKind::Statistics.label());
        state.set_sheet_kind(kind);

        ui.separator();

        if !state.files.is_empty() {
            ui.label(format!(
                "{} of {} files loaded",
                state.loaded.len(),
                state.files.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GREEN
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open battery exports")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "parquet", "pq"],
        )
        .add_filter("Excel", &["xlsx", "xlsm", "xlsb", "xls"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_files();

    if let Some(paths) = files {
        log::info!("Opening {} file(s)", paths.len());
        state.set_files(paths);
    }
}

pub fn open_folder_dialog(state: &mut AppState) {
    if let Some(dir) = rfd::FileDialog::new()
        .set_title("Open export folder")
        .pick_folder()
    {
        state.set_files(vec![dir]);
    }
}

fn load_settings_dialog(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Load plot settings")
        .add_filter("JSON", &["json"])
        .pick_file()
    else {
        return;
    };

    match PlotSettings::from_json_file(&path) {
        Ok(settings) => {
            log::info!("Loaded settings from {}", path.display());
            state.apply_settings(settings);
        }
        Err(e) => {
            log::error!("Failed to load settings: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn save_settings_dialog(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save plot settings")
        .add_filter("JSON", &["json"])
        .set_file_name("plot_settings.json")
        .save_file()
    else {
        return;
    };

    if let Err(e) = state.settings.save_json_file(&path) {
        log::error!("Failed to save settings: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}

use eframe::egui::{self, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::state::AppState;

/// Rows shown in the preview table.
const PREVIEW_ROWS: usize = 200;

/// Render the first rows of one dataset, as charted (derived columns included).
pub fn data_preview(ui: &mut Ui, state: &mut AppState) {
    if state.datasets.is_empty() {
        ui.label("No data loaded.");
        return;
    }
    if state.preview_dataset >= state.datasets.len() {
        state.preview_dataset = 0;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Data preview:");
        let selected = &state.datasets[state.preview_dataset].label;
        egui::ComboBox::from_id_salt("preview_dataset")
            .selected_text(selected.as_str())
            .show_ui(ui, |ui: &mut Ui| {
                for (i, dataset) in state.datasets.iter().enumerate() {
                    ui.selectable_value(&mut state.preview_dataset, i, &dataset.label);
                }
            });

        let table = &state.datasets[state.preview_dataset].table;
        ui.label(format!(
            "{} rows × {} columns",
            table.len(),
            table.columns().len()
        ));
    });

    let table = &state.datasets[state.preview_dataset].table;
    let columns = table.columns();
    let n_rows = table.len().min(PREVIEW_ROWS);

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(TableColumn::auto().at_least(60.0), columns.len())
            .header(20.0, |mut header| {
                for column in columns {
                    header.col(|ui| {
                        ui.strong(&column.name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, n_rows, |mut row| {
                    let i = row.index();
                    for column in columns {
                        row.col(|ui| {
                            ui.label(column.values[i].to_string());
                        });
                    }
                });
            });
    });
}

use std::path::PathBuf;

use battery_plotter::chart::{save_html, ChartSpec};
use battery_plotter::data::{Dataset, LoadedFile, NormalizedCapacity};
use battery_plotter::pipeline::dataset_columns;
use battery_plotter::{Pipeline, PlotSettings, SheetKind};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Files picked by the user, in pick order.
    pub files: Vec<PathBuf>,

    /// Files that loaded with the current sheet kind.
    pub loaded: Vec<LoadedFile>,

    /// Datasets with derived columns, as charted.
    pub datasets: Vec<Dataset>,

    /// Sorted union of the datasets' column names.
    pub available_columns: Vec<String>,

    /// Every selection the chart is built from.
    pub settings: PlotSettings,

    /// Normalized-capacity parameters, kept while the option is switched off.
    pub normalized: NormalizedCapacity,

    /// Last composed chart.
    pub chart: Option<ChartSpec>,

    /// Dataset shown in the data preview table.
    pub preview_dataset: usize,

    /// Non-fatal diagnostics for skipped files.
    pub skipped: Vec<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Set by widgets; the chart is rebuilt once per frame when set.
    pub dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            loaded: Vec::new(),
            datasets: Vec::new(),
            available_columns: Vec::new(),
            settings: PlotSettings::default(),
            normalized: NormalizedCapacity {
                source: Default::default(),
                active_mass_g: 1.0,
            },
            chart: None,
            preview_dataset: 0,
            skipped: Vec::new(),
            status_message: None,
            dirty: false,
        }
    }
}

impl AppState {
    /// Replace the file set and reload everything.
    pub fn set_files(&mut self, files: Vec<PathBuf>) {
        self.files = files;
        self.reload();
    }

    /// Switch between channel and statistics sheets.
    pub fn set_sheet_kind(&mut self, kind: SheetKind) {
        if self.settings.sheet_kind != kind {
            self.settings.sheet_kind = kind;
            self.reload();
        }
    }

    /// Adopt settings loaded from disk, keeping their column selections.
    pub fn apply_settings(&mut self, settings: PlotSettings) {
        let reload = settings.sheet_kind != self.settings.sheet_kind;
        if let Some(normalized) = &settings.derived.normalized_capacity {
            self.normalized = normalized.clone();
        }
        self.settings = settings;
        if reload {
            self.load_files();
        }
        self.rebuild();
    }

    /// Load all files with the current sheet kind, then rebuild the chart.
    pub fn reload(&mut self) {
        self.load_files();

        // Selections from another sheet kind rarely make sense here.
        self.settings.x_column.clear();
        self.settings.left_columns.clear();
        self.settings.right_columns.clear();
        self.settings.left_label.clear();
        self.settings.right_label.clear();
        self.settings.x_label.clear();

        self.rebuild();
    }

    fn load_files(&mut self) {
        let pipeline = Pipeline::new(self.settings.clone());
        let outcome = pipeline.load(self.files.clone());

        self.skipped = outcome
            .skipped
            .iter()
            .map(|s| format!("Skipping {}: {}", s.path.display(), s.error))
            .collect();
        self.loaded = outcome.loaded;
        self.preview_dataset = 0;
    }

    /// Toggle normalized capacity on or off.
    pub fn set_normalized_enabled(&mut self, enabled: bool) {
        self.settings.derived.normalized_capacity = enabled.then(|| self.normalized.clone());
        self.dirty = true;
    }

    /// Push edited normalized-capacity parameters into the settings.
    pub fn sync_normalized(&mut self) {
        if self.settings.derived.normalized_capacity.is_some() {
            self.settings.derived.normalized_capacity = Some(self.normalized.clone());
        }
        self.dirty = true;
    }

    /// Recompute derived columns and the chart from the loaded files.
    pub fn rebuild(&mut self) {
        self.dirty = false;

        if self.loaded.is_empty() {
            self.datasets.clear();
            self.available_columns.clear();
            self.chart = None;
            if !self.files.is_empty() {
                self.status_message = Some("Error: none of the selected files could be loaded".into());
            }
            return;
        }

        let pipeline = Pipeline::new(self.settings.clone());
        self.datasets = pipeline.prepare(&self.loaded);
        self.available_columns = dataset_columns(&self.datasets);

        let needs_labels = self.settings.x_column.is_empty();
        self.settings.fill_defaults(&self.available_columns);
        if needs_labels {
            self.settings.x_label = self.settings.x_column.clone();
            let (left, right) = self.settings.suggested_axis_labels();
            self.settings.left_label = left;
            self.settings.right_label = right;
        }

        match Pipeline::new(self.settings.clone()).compose(&self.datasets) {
            Ok(chart) => {
                self.chart = Some(chart);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to compose chart: {e}");
                self.chart = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Toggle a column in the left or right selection.
    pub fn toggle_column(&mut self, right_axis: bool, column: &str) {
        let selected = if right_axis {
            &mut self.settings.right_columns
        } else {
            &mut self.settings.left_columns
        };
        if let Some(pos) = selected.iter().position(|c| c == column) {
            selected.remove(pos);
        } else {
            selected.push(column.to_string());
        }
        self.dirty = true;
    }

    /// Drop the current chart without writing anything.
    pub fn discard(&mut self) {
        self.chart = None;
        self.status_message = Some("Graph discarded".into());
    }

    /// Write the current chart as HTML into the output directory.
    pub fn finalize(&mut self) {
        let Some(chart) = &self.chart else {
            self.status_message = Some("Error: nothing to save yet".into());
            return;
        };

        match save_html(chart, &self.settings.output_dir, &self.settings.graph_title) {
            Ok(path) => {
                let shown = std::fs::canonicalize(&path).unwrap_or(path);
                self.status_message = Some(format!("Graph saved to: {}", shown.display()));
            }
            Err(e) => {
                log::error!("Failed to save graph: {e:#}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::{
    ChartRequest, DisplayMode, DisplayModes, XAxisRole, XInteraction, CYCLE_INDEX, DEFAULT_TITLE,
};
use crate::chart::export::DEFAULT_OUTPUT_DIR;
use crate::data::DerivedColumns;

pub const DEFAULT_X_COLUMN: &str = "Test_Time(s)";
pub const DEFAULT_LEFT_COLUMN: &str = "Current(A)";
pub const DEFAULT_RIGHT_COLUMN: &str = "Voltage(V)";

// ---------------------------------------------------------------------------
// Sheet kind / plot style
// ---------------------------------------------------------------------------

/// Which family of sheets to read from each export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    /// Raw time-series channel data.
    #[default]
    Channel,
    /// Per-cycle summary statistics.
    Statistics,
}

impl SheetKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SheetKind::Channel => "Channel_1-",
            SheetKind::Statistics => "Statistics_1-",
        }
    }

    /// Cycle-index charts read statistics sheets, everything else channel data.
    pub fn for_x_column(x_column: &str) -> Self {
        if x_column == CYCLE_INDEX {
            SheetKind::Statistics
        } else {
            SheetKind::Channel
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SheetKind::Channel => "Channel",
            SheetKind::Statistics => "Statistics",
        }
    }
}

/// Line or dot rendering, applied to every selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotStyle {
    #[default]
    Lines,
    Dots,
}

impl PlotStyle {
    pub fn mode(self) -> DisplayMode {
        match self {
            PlotStyle::Lines => DisplayMode::Lines,
            PlotStyle::Dots => DisplayMode::Markers,
        }
    }
}

// ---------------------------------------------------------------------------
// PlotSettings
// ---------------------------------------------------------------------------

/// User selections for one chart, threaded through load → derive → compose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub sheet_kind: SheetKind,
    pub x_column: String,
    /// Treat the x column as a discrete counter even when it is not
    /// `Cycle_Index` (markers instead of lines).
    pub discrete_x: bool,
    pub left_columns: Vec<String>,
    pub right_columns: Vec<String>,
    pub plot_style: PlotStyle,
    pub x_interaction: XInteraction,
    pub graph_title: String,
    pub x_label: String,
    pub left_label: String,
    pub right_label: String,
    pub notes: String,
    pub derived: DerivedColumns,
    pub output_dir: PathBuf,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            sheet_kind: SheetKind::default(),
            x_column: String::new(),
            discrete_x: false,
            left_columns: Vec::new(),
            right_columns: Vec::new(),
            plot_style: PlotStyle::default(),
            x_interaction: XInteraction::default(),
            graph_title: DEFAULT_TITLE.to_string(),
            x_label: String::new(),
            left_label: String::new(),
            right_label: String::new(),
            notes: String::new(),
            derived: DerivedColumns::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl PlotSettings {
    /// Read settings from a JSON file. Absent fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).context("reading settings file")?;
        serde_json::from_str(&text).context("parsing settings JSON")
    }

    pub fn save_json_file(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing settings")?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    /// Fill unset column selections from the columns on offer.
    ///
    /// x: `Test_Time(s)` if available, else the first column. Left and right
    /// default to `Current(A)` and `Voltage(V)` the same way.
    pub fn fill_defaults(&mut self, available: &[String]) {
        let Some(first) = available.first() else {
            return;
        };
        let pick = |preferred: &str| {
            if available.iter().any(|c| c == preferred) {
                preferred.to_string()
            } else {
                first.clone()
            }
        };

        if self.x_column.is_empty() {
            self.x_column = pick(DEFAULT_X_COLUMN);
        }
        if self.left_columns.is_empty() {
            self.left_columns = vec![pick(DEFAULT_LEFT_COLUMN)];
        }
        if self.right_columns.is_empty() {
            self.right_columns = vec![pick(DEFAULT_RIGHT_COLUMN)];
        }
    }

    /// Suggested (left, right) axis labels for the current selection.
    pub fn suggested_axis_labels(&self) -> (String, String) {
        let current = |cols: &[String]| cols.iter().any(|c| c == DEFAULT_LEFT_COLUMN);
        let left = if current(&self.left_columns) {
            "Current (µA)"
        } else {
            "Current (A)"
        };
        let right = if current(&self.right_columns) {
            "Current (µA)"
        } else {
            "Voltage (V)"
        };
        (left.to_string(), right.to_string())
    }

    /// The composer request described by these settings.
    pub fn chart_request(&self) -> ChartRequest {
        let mode = self.plot_style.mode();
        ChartRequest {
            x_column: self.x_column.clone(),
            left_columns: self.left_columns.clone(),
            right_columns: self.right_columns.clone(),
            modes: DisplayModes::uniform(
                self.left_columns.iter().chain(&self.right_columns),
                mode,
            ),
            graph_title: self.graph_title.clone(),
            x_label: self.x_label.clone(),
            left_label: self.left_label.clone(),
            right_label: self.right_label.clone(),
            interaction: self.x_interaction,
            notes: self.notes.clone(),
            x_role: self.discrete_x.then_some(XAxisRole::CycleIndex),
        }
    }
}

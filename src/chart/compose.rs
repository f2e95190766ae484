use std::collections::HashMap;

use crate::color::ColorPair;
use crate::data::scale::scale_columns;
use crate::data::{require_columns, CellValue, ColumnError, Dataset, Table};

use super::spec::{
    Annotation, ChartSpec, DisplayMode, Layout, Legend, MarkerStyle, RangeSlider, Title, Trace,
    XAxisLayout, XInteraction, YAxis, YAxisLayout,
};

/// Graph title used when none is given.
pub const DEFAULT_TITLE: &str = "Battery Data";

/// Name of the discrete cycle-counter column in statistics sheets.
pub const CYCLE_INDEX: &str = "Cycle_Index";

/// Marker size used when plotting against the cycle index.
pub const CYCLE_MARKER_SIZE: u32 = 10;

// ---------------------------------------------------------------------------
// X-axis semantics and display modes
// ---------------------------------------------------------------------------

/// Whether the x column is continuous (time) or a discrete cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XAxisRole {
    #[default]
    Continuous,
    CycleIndex,
}

impl XAxisRole {
    pub fn infer(x_column: &str) -> Self {
        if x_column == CYCLE_INDEX {
            XAxisRole::CycleIndex
        } else {
            XAxisRole::Continuous
        }
    }

    pub fn default_mode(self) -> DisplayMode {
        match self {
            XAxisRole::Continuous => DisplayMode::Lines,
            XAxisRole::CycleIndex => DisplayMode::Markers,
        }
    }

    pub fn marker_size(self) -> Option<u32> {
        match self {
            XAxisRole::Continuous => None,
            XAxisRole::CycleIndex => Some(CYCLE_MARKER_SIZE),
        }
    }
}

/// Per-column display modes with a role-dependent default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayModes {
    by_column: HashMap<String, DisplayMode>,
}

impl DisplayModes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same mode for every listed column.
    pub fn uniform<'a>(columns: impl IntoIterator<Item = &'a String>, mode: DisplayMode) -> Self {
        DisplayModes {
            by_column: columns.into_iter().map(|c| (c.clone(), mode)).collect(),
        }
    }

    pub fn set(&mut self, column: impl Into<String>, mode: DisplayMode) {
        self.by_column.insert(column.into(), mode);
    }

    /// Mode for a column. `original` is the selected name, `resolved` its name
    /// after unit scaling; the original name takes precedence.
    pub fn mode_for(&self, original: &str, resolved: &str, role: XAxisRole) -> DisplayMode {
        self.by_column
            .get(original)
            .or_else(|| self.by_column.get(resolved))
            .copied()
            .unwrap_or_else(|| role.default_mode())
    }
}

// ---------------------------------------------------------------------------
// Chart request
// ---------------------------------------------------------------------------

/// Everything the composer needs besides the datasets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartRequest {
    pub x_column: String,
    pub left_columns: Vec<String>,
    pub right_columns: Vec<String>,
    pub modes: DisplayModes,
    pub graph_title: String,
    pub x_label: String,
    pub left_label: String,
    pub right_label: String,
    pub interaction: XInteraction,
    pub notes: String,
    /// Overrides the role inferred from the x column name.
    pub x_role: Option<XAxisRole>,
}

impl ChartRequest {
    pub fn new(x_column: impl Into<String>) -> Self {
        ChartRequest {
            x_column: x_column.into(),
            ..Default::default()
        }
    }

    pub fn x_role(&self) -> XAxisRole {
        self.x_role.unwrap_or_else(|| XAxisRole::infer(&self.x_column))
    }

    /// All columns a dataset must have for this request.
    pub fn required_columns(&self) -> Vec<String> {
        std::iter::once(&self.x_column)
            .chain(&self.left_columns)
            .chain(&self.right_columns)
            .cloned()
            .collect()
    }

    /// Drop repeated selections and y columns that are not in every dataset.
    pub fn retain_present(&mut self, datasets: &[Dataset]) {
        let present = |c: &String| datasets.iter().all(|d| d.table.has_column(c));
        self.left_columns = unique(&self.left_columns);
        self.right_columns = unique(&self.right_columns);
        self.left_columns.retain(present);
        self.right_columns.retain(present);
    }
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Build a dual-axis chart from labelled datasets.
///
/// Every dataset must contain the x column and all selected y columns;
/// otherwise [`ColumnError::MissingColumns`] is returned and nothing is
/// built. The datasets themselves are never modified: unit scaling runs on
/// one working copy per dataset and axis group.
pub fn compose(datasets: &[Dataset], request: &ChartRequest) -> Result<ChartSpec, ColumnError> {
    let required = request.required_columns();
    for dataset in datasets {
        require_columns(dataset, &required)?;
    }

    // A repeated name would be looked up again after its first rename.
    let left_columns = unique(&request.left_columns);
    let right_columns = unique(&request.right_columns);

    let role = request.x_role();
    let mut traces = Vec::new();
    let mut left_names: Vec<String> = Vec::new();
    let mut right_names: Vec<String> = Vec::new();
    let mut colors = ColorPair::for_dataset(0);

    for (index, dataset) in datasets.iter().enumerate() {
        colors = ColorPair::for_dataset(index);
        let x = x_values(&dataset.table, &request.x_column);

        let left = axis_traces(
            dataset,
            &x,
            &left_columns,
            request,
            role,
            colors.left,
            YAxis::Left,
        );
        extend_unique(&mut left_names, left.names);
        traces.extend(left.traces);

        if right_columns.is_empty() {
            traces.push(Trace::placeholder(YAxis::Right));
        } else {
            let right = axis_traces(
                dataset,
                &x,
                &right_columns,
                request,
                role,
                colors.right,
                YAxis::Right,
            );
            extend_unique(&mut right_names, right.names);
            traces.extend(right.traces);
        }
    }

    let interaction = request.interaction;
    let mut yaxis2 = YAxisLayout::colored(axis_title(&request.right_label, &right_names), colors.right);
    yaxis2.overlaying = Some("y");
    yaxis2.side = Some("right");

    let layout = Layout {
        title: Title::plain(non_empty_or(&request.graph_title, DEFAULT_TITLE)),
        xaxis: XAxisLayout {
            title: Title::plain(non_empty_or(&request.x_label, &request.x_column)),
            rangeslider: RangeSlider {
                visible: interaction.range_slider_visible(),
            },
        },
        yaxis: YAxisLayout::colored(axis_title(&request.left_label, &left_names), colors.left),
        yaxis2,
        dragmode: interaction.drag_mode(),
        hovermode: "x unified",
        legend: Legend { x: 0.01, y: 0.99 },
        annotations: if request.notes.trim().is_empty() {
            Vec::new()
        } else {
            vec![Annotation::note(&request.notes)]
        },
    };

    log::debug!(
        "Composed chart '{}' with {} traces from {} datasets",
        layout.title.text,
        traces.len(),
        datasets.len()
    );

    Ok(ChartSpec {
        data: traces,
        layout,
    })
}

struct AxisTraces {
    traces: Vec<Trace>,
    names: Vec<String>,
}

/// Scale one axis group on its own copy of the table and build its traces.
fn axis_traces(
    dataset: &Dataset,
    x: &[CellValue],
    columns: &[String],
    request: &ChartRequest,
    role: XAxisRole,
    color: &str,
    axis: YAxis,
) -> AxisTraces {
    let mut working = dataset.table.clone();
    let names = scale_columns(&mut working, columns);

    let traces = columns
        .iter()
        .zip(&names)
        .map(|(original, resolved)| {
            let y = working
                .column(resolved)
                .map(|c| c.values.clone())
                .unwrap_or_default();
            let mut trace = Trace::scatter(
                format!("{}: {resolved}", dataset.label),
                x.to_vec(),
                y,
                request.modes.mode_for(original, resolved, role),
                color,
                axis,
            );
            trace.marker = role.marker_size().map(|size| MarkerStyle { size });
            trace
        })
        .collect();

    AxisTraces { traces, names }
}

fn x_values(table: &Table, x_column: &str) -> Vec<CellValue> {
    table
        .column(x_column)
        .map(|c| c.values.clone())
        .unwrap_or_default()
}

/// Column names in first-appearance order, repeats dropped.
fn unique(columns: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(columns.len());
    extend_unique(&mut kept, columns.to_vec());
    kept
}

fn extend_unique(target: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !target.contains(&name) {
            target.push(name);
        }
    }
}

/// Explicit title, else the joined column names, else a single space.
fn axis_title(explicit: &str, names: &[String]) -> String {
    if !explicit.is_empty() {
        explicit.to_string()
    } else if !names.is_empty() {
        names.join(" / ")
    } else {
        " ".to_string()
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

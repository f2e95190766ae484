use super::model::{CellValue, Table};

/// Columns whose largest magnitude is below this are shown in micro-units.
pub const MICRO_THRESHOLD: f64 = 0.01;

/// Factor applied to micro-scaled values.
pub const MICRO_FACTOR: f64 = 1e6;

/// Marker appended to the name of a micro-scaled column.
pub const MICRO_SUFFIX: &str = " (µ)";

/// What [`scale_column`] did to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnScaling {
    Unchanged { name: String },
    Rescaled { from: String, to: String },
}

impl ColumnScaling {
    /// Name of the column after scaling.
    pub fn name(&self) -> &str {
        match self {
            ColumnScaling::Unchanged { name } => name,
            ColumnScaling::Rescaled { to, .. } => to,
        }
    }
}

/// Largest absolute numeric value of a column, ignoring missing cells.
/// `None` when the column is absent or holds no numbers.
pub fn max_abs(table: &Table, column: &str) -> Option<f64> {
    table
        .column(column)?
        .values
        .iter()
        .filter_map(CellValue::as_f64)
        .map(f64::abs)
        .reduce(f64::max)
}

/// Rescale one column of `table` to micro-units when all its values are tiny.
pub fn scale_column(table: &mut Table, column: &str) -> ColumnScaling {
    let unchanged = ColumnScaling::Unchanged {
        name: column.to_string(),
    };

    match max_abs(table, column) {
        Some(max) if max < MICRO_THRESHOLD => {}
        _ => return unchanged,
    }

    let Some(target) = table.column_mut(column) else {
        return unchanged;
    };
    for cell in &mut target.values {
        if let CellValue::Number(v) = cell {
            *v *= MICRO_FACTOR;
        }
    }

    let scaled = format!("{column}{MICRO_SUFFIX}");
    table.rename_column(column, &scaled);
    log::debug!("Scaled '{column}' to micro-units as '{scaled}'");

    ColumnScaling::Rescaled {
        from: column.to_string(),
        to: scaled,
    }
}

/// Scale each of `columns` in place and return their resulting names, in
/// input order.
pub fn scale_columns(table: &mut Table, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| scale_column(table, column).name().to_string())
        .collect()
}

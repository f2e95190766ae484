use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a measurement table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring what spreadsheet exports contain.
///
/// Serializes untagged, so a column of cells becomes a plain JSON array of
/// numbers / strings / booleans with `null` for missing cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Missing,
}

impl CellValue {
    /// Numeric view of the cell. NaN counts as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Number(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Build a cell from an optional number, mapping `None` and NaN to missing.
    pub fn from_f64(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => CellValue::Number(v),
            _ => CellValue::Missing,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Missing => write!(f, ""),
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Table – columnar storage addressed by name
// ---------------------------------------------------------------------------

/// One named column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    /// Convenience constructor for a fully numeric column.
    pub fn numeric(name: impl Into<String>, values: &[f64]) -> Self {
        Column::new(name, values.iter().map(|&v| CellValue::Number(v)).collect())
    }

    /// Numeric view of every cell (`None` for missing or non-numeric cells).
    pub fn numbers(&self) -> Vec<Option<f64>> {
        self.values.iter().map(CellValue::as_f64).collect()
    }
}

/// An ordered set of equally long, uniquely named columns.
///
/// Row positions carry no identity: merging re-indexes rows sequentially.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a header row and data rows.
    ///
    /// Short rows are padded with missing cells, long rows are truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let n_rows = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(n_rows)))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.values.push(cells.next().unwrap_or(CellValue::Missing));
            }
        }

        Table { columns, n_rows }
    }

    /// Build a table from columns. Columns shorter than the longest one are
    /// padded with missing cells; a repeated name replaces the earlier column.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let n_rows = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let mut table = Table {
            columns: Vec::with_capacity(columns.len()),
            n_rows,
        };
        for column in columns {
            table.insert_column(column);
        }
        table
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Ordered list of column names.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Insert a column, replacing any existing column with the same name in
    /// place. The column is padded or truncated to the table's row count,
    /// unless the table has no columns yet, in which case it defines it.
    pub fn insert_column(&mut self, mut column: Column) {
        if self.columns.is_empty() && self.n_rows == 0 {
            self.n_rows = column.values.len();
        }
        column.values.resize(self.n_rows, CellValue::Missing);

        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Rename a column. Returns `false` when `from` does not exist.
    /// An existing column named `to` is dropped first.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.has_column(from);
        }
        if !self.has_column(from) {
            return false;
        }
        self.columns.retain(|c| c.name != to);
        if let Some(column) = self.column_mut(from) {
            column.name = to.to_string();
        }
        true
    }

    /// Stack tables vertically.
    ///
    /// The result has the union of all column names in first-appearance order;
    /// cells for columns a part does not have are missing. Row order follows
    /// the order of `parts`.
    pub fn concat(parts: Vec<Table>) -> Table {
        let mut names: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for part in &parts {
            for column in &part.columns {
                if seen.insert(column.name.clone()) {
                    names.push(column.name.clone());
                }
            }
        }

        let n_rows: usize = parts.iter().map(Table::len).sum();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(n_rows)))
            .collect();

        for mut part in parts {
            let part_rows = part.n_rows;
            for column in &mut columns {
                match part.columns.iter_mut().find(|c| c.name == column.name) {
                    Some(source) => column.values.append(&mut source.values),
                    None => column
                        .values
                        .extend(std::iter::repeat(CellValue::Missing).take(part_rows)),
                }
            }
        }

        Table { columns, n_rows }
    }
}

// ---------------------------------------------------------------------------
// Dataset – a labelled table
// ---------------------------------------------------------------------------

/// A table together with the label shown in legends.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub table: Table,
}

impl Dataset {
    pub fn new(label: impl Into<String>, table: Table) -> Self {
        Dataset {
            label: label.into(),
            table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let table = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![num(1.0), num(2.0)], vec![num(3.0)]],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("b").unwrap().values[1], CellValue::Missing);
    }

    #[test]
    fn test_concat_sums_rows_and_preserves_cells() {
        let first = Table::from_columns(vec![
            Column::numeric("Test_Time(s)", &[0.0, 1.0, 2.0]),
            Column::numeric("Voltage(V)", &[3.7, 3.8, 3.9]),
        ]);
        let second = Table::from_columns(vec![
            Column::numeric("Test_Time(s)", &[3.0, 4.0]),
            Column::numeric("Voltage(V)", &[4.0, 4.1]),
        ]);

        let merged = Table::concat(vec![first, second]);

        assert_eq!(merged.len(), 5);
        assert_eq!(
            merged.column("Voltage(V)").unwrap().numbers(),
            vec![Some(3.7), Some(3.8), Some(3.9), Some(4.0), Some(4.1)]
        );
        assert_eq!(
            merged.column("Test_Time(s)").unwrap().values[3],
            CellValue::Number(3.0)
        );
    }

    #[test]
    fn test_concat_unions_columns_with_missing_cells() {
        let first = Table::from_columns(vec![Column::numeric("a", &[1.0])]);
        let second = Table::from_columns(vec![
            Column::numeric("b", &[2.0]),
            Column::numeric("a", &[3.0]),
        ]);

        let merged = Table::concat(vec![first, second]);

        assert_eq!(merged.column_names(), vec!["a", "b"]);
        assert_eq!(merged.column("a").unwrap().numbers(), vec![Some(1.0), Some(3.0)]);
        assert_eq!(merged.column("b").unwrap().numbers(), vec![None, Some(2.0)]);
    }

    #[test]
    fn test_insert_column_replaces_existing() {
        let mut table = Table::from_columns(vec![Column::numeric("a", &[1.0, 2.0])]);
        table.insert_column(Column::numeric("a", &[5.0]));
        assert_eq!(table.column_names(), vec!["a"]);
        assert_eq!(table.column("a").unwrap().numbers(), vec![Some(5.0), None]);
    }

    #[test]
    fn test_rename_column() {
        let mut table = Table::from_columns(vec![Column::numeric("a", &[1.0])]);
        assert!(table.rename_column("a", "a (µ)"));
        assert!(!table.rename_column("missing", "x"));
        assert_eq!(table.column_names(), vec!["a (µ)"]);
    }

    #[test]
    fn test_nan_is_missing() {
        assert!(CellValue::Number(f64::NAN).is_missing());
        assert_eq!(CellValue::Number(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::from_f64(Some(f64::NAN)), CellValue::Missing);
    }

    #[test]
    fn test_cells_serialize_as_plain_json() {
        let cells = vec![
            CellValue::Number(1.5),
            CellValue::Text("a".into()),
            CellValue::Missing,
        ];
        assert_eq!(serde_json::to_string(&cells).unwrap(), r#"[1.5,"a",null]"#);
    }
}

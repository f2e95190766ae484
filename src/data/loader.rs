use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::LoadError;
use super::model::{CellValue, Column, Table};

// ---------------------------------------------------------------------------
// Sheet sources
// ---------------------------------------------------------------------------

/// Anything that exposes named sheets which parse into [`Table`]s.
pub trait SheetSource {
    /// All sheet names, in the source's own enumeration order.
    fn sheet_names(&self) -> Vec<String>;

    /// Parse one sheet. The first row is the header row.
    fn read_sheet(&mut self, name: &str) -> Result<Table>;
}

/// Open the sheet source for a path.  Dispatch by extension.
///
/// Supported sources:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – spreadsheet workbook
/// * `.csv` / `.parquet` – a single sheet named after the file stem
/// * a directory – one sheet per `.csv` / `.parquet` file inside it
pub fn open_source(path: &Path) -> Result<Box<dyn SheetSource>> {
    if path.is_dir() {
        return Ok(Box::new(DirectorySource::open(path)?));
    }

    match extension(path).as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Box::new(WorkbookSource::open(path)?)),
        "csv" | "parquet" | "pq" => Ok(Box::new(SingleSheetSource::new(path))),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every sheet of `path` whose name starts with `sheet_prefix` and
/// merge them into one table.
///
/// Returns the merged table and its column names.
pub fn load_table(path: &Path, sheet_prefix: &str) -> Result<(Table, Vec<String>), LoadError> {
    let file = path.display().to_string();
    let mut source = open_source(path).map_err(|source| LoadError::DataLoad {
        file: file.clone(),
        source,
    })?;
    load_from_source(source.as_mut(), &file, sheet_prefix)
}

/// Same as [`load_table`] for an already opened source.
///
/// Matching sheets are concatenated in enumeration order; rows are
/// re-indexed sequentially.
pub fn load_from_source(
    source: &mut dyn SheetSource,
    file: &str,
    sheet_prefix: &str,
) -> Result<(Table, Vec<String>), LoadError> {
    let sheet_names = source.sheet_names();
    let targets: Vec<&String> = sheet_names
        .iter()
        .filter(|name| name.starts_with(sheet_prefix))
        .collect();

    if targets.is_empty() {
        return Err(LoadError::NoMatchingSheet {
            file: file.to_string(),
            prefix: sheet_prefix.to_string(),
            available: sheet_names.clone(),
        });
    }

    log::debug!("{file}: merging sheets {targets:?}");

    let mut parts = Vec::with_capacity(targets.len());
    for name in targets {
        let table = source
            .read_sheet(name)
            .with_context(|| format!("parsing sheet '{name}'"))
            .map_err(|source| LoadError::DataLoad {
                file: file.to_string(),
                source,
            })?;
        parts.push(table);
    }

    let merged = Table::concat(parts);
    let columns = merged.column_names();
    Ok((merged, columns))
}

// ---------------------------------------------------------------------------
// Spreadsheet workbooks
// ---------------------------------------------------------------------------

/// A workbook read through calamine.
pub struct WorkbookSource {
    sheets: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path).context("opening workbook")?;
        Ok(WorkbookSource { sheets })
    }
}

impl SheetSource for WorkbookSource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Table> {
        let range = self
            .sheets
            .worksheet_range(name)
            .with_context(|| format!("reading worksheet '{name}'"))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(Table::new());
        };

        let headers = unique_headers(header_row.iter().map(|c| c.to_string()).collect());
        let body: Vec<Vec<CellValue>> = rows
            .map(|row| row.iter().map(workbook_cell).collect())
            .collect();

        Ok(Table::from_rows(headers, body))
    }
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::from_f64(Some(*f)),
        Data::String(s) if s.is_empty() => CellValue::Missing,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Missing,
    }
}

/// Name blank header cells `Unnamed: <i>` and suffix repeats with `.1`, `.2`, …
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = if name.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            };
            let seen = counts.entry(name.clone()).or_insert(0);
            let unique = if *seen == 0 {
                name
            } else {
                format!("{name}.{seen}")
            };
            *seen += 1;
            unique
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Single-table exports (CSV / Parquet)
// ---------------------------------------------------------------------------

/// A CSV or Parquet file exposed as one sheet named after its file stem.
pub struct SingleSheetSource {
    path: PathBuf,
    sheet: String,
}

impl SingleSheetSource {
    pub fn new(path: &Path) -> Self {
        SingleSheetSource {
            path: path.to_path_buf(),
            sheet: file_stem(path),
        }
    }
}

impl SheetSource for SingleSheetSource {
    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet.clone()]
    }

    fn read_sheet(&mut self, name: &str) -> Result<Table> {
        if name != self.sheet {
            bail!("no sheet named '{name}'");
        }
        read_table_file(&self.path)
    }
}

/// A directory of CSV / Parquet files, one sheet per file, sorted by name.
pub struct DirectorySource {
    sheets: Vec<(String, PathBuf)>,
}

impl DirectorySource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(dir).context("listing directory")? {
            let path = entry.context("reading directory entry")?.path();
            if path.is_file() && matches!(extension(&path).as_str(), "csv" | "parquet" | "pq") {
                files.push(path);
            }
        }
        files.sort();

        let sheets = files.into_iter().map(|p| (file_stem(&p), p)).collect();
        Ok(DirectorySource { sheets })
    }
}

impl SheetSource for DirectorySource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Table> {
        let path = self
            .sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, path)| path)
            .with_context(|| format!("no sheet named '{name}'"))?;
        read_table_file(path)
    }
}

/// In-memory sheets, for embedders that already hold parsed data.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<(String, Table)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: impl Into<String>, table: Table) -> Self {
        self.sheets.push((name.into(), table));
        self
    }
}

impl SheetSource for MemorySource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Table> {
        self.sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, table)| table.clone())
            .with_context(|| format!("no sheet named '{name}'"))
    }
}

fn read_table_file(path: &Path) -> Result<Table> {
    match extension(path).as_str() {
        "csv" => read_csv(path),
        "parquet" | "pq" => read_parquet(path),
        other => bail!("Unsupported sheet file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one measurement per record.
fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;

    let headers = unique_headers(
        reader
            .headers()
            .context("reading CSV headers")?
            .iter()
            .map(|h| h.to_string())
            .collect(),
    );

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(Table::from_rows(headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return CellValue::Missing;
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::from_f64(Some(f));
    }
    if trimmed == "true" || trimmed == "false" {
        return CellValue::Bool(trimmed == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table; every top-level field becomes a column.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut parts = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| {
                let values = (0..batch.num_rows())
                    .map(|row| extract_cell(array, row))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Column::new(field.name().clone(), values))
            })
            .collect::<Result<Vec<_>>>()?;

        parts.push(Table::from_columns(columns));
    }

    Ok(Table::concat(parts))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Missing);
    }
    let cell = match col.data_type() {
        DataType::Float64 => CellValue::from_f64(Some(col.as_primitive::<Float64Type>().value(row))),
        DataType::Float32 => {
            CellValue::from_f64(Some(col.as_primitive::<Float32Type>().value(row) as f64))
        }
        DataType::Int64 => CellValue::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Int32 => CellValue::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        _ => CellValue::Text(
            arrow::util::display::array_value_to_string(col, row)
                .with_context(|| format!("formatting {:?} value", col.data_type()))?,
        ),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(time: &[f64], current: &[f64]) -> Table {
        Table::from_columns(vec![
            Column::numeric("Test_Time(s)", time),
            Column::numeric("Current(A)", current),
        ])
    }

    fn workbook() -> MemorySource {
        MemorySource::new()
            .with_sheet("Info", Table::new())
            .with_sheet("Channel_1-006_1", sheet(&[0.0, 1.0], &[0.1, 0.2]))
            .with_sheet("Statistics_1-006", sheet(&[1.0], &[0.5]))
            .with_sheet("Channel_1-006_2", sheet(&[2.0, 3.0, 4.0], &[0.3, 0.4, 0.5]))
    }

    #[test]
    fn test_merges_matching_sheets_in_order() {
        let mut source = workbook();
        let (table, columns) = load_from_source(&mut source, "cell.xlsx", "Channel_1-").unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(columns, vec!["Test_Time(s)", "Current(A)"]);
        assert_eq!(
            table.column("Test_Time(s)").unwrap().numbers(),
            vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
        );
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let mut source = workbook();
        let err = load_from_source(&mut source, "cell.xlsx", "channel_1-").unwrap_err();
        match err {
            LoadError::NoMatchingSheet {
                file,
                prefix,
                available,
            } => {
                assert_eq!(file, "cell.xlsx");
                assert_eq!(prefix, "channel_1-");
                assert_eq!(
                    available,
                    vec!["Info", "Channel_1-006_1", "Statistics_1-006", "Channel_1-006_2"]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unique_headers() {
        let headers = unique_headers(vec!["a".into(), "".into(), "a".into(), "a".into()]);
        assert_eq!(headers, vec!["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn test_guess_cell_type() {
        assert_eq!(guess_cell_type(""), CellValue::Missing);
        assert_eq!(guess_cell_type("3.5"), CellValue::Number(3.5));
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("CC_Chg"), CellValue::Text("CC_Chg".into()));
    }

    #[test]
    fn test_csv_file_is_single_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Channel_1-006.csv");
        std::fs::write(&path, "Test_Time(s),Voltage(V),Step\n0,3.7,Rest\n1,,CC_Chg\n").unwrap();

        let (table, columns) = load_table(&path, "Channel_1-").unwrap();

        assert_eq!(columns, vec!["Test_Time(s)", "Voltage(V)", "Step"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("Voltage(V)").unwrap().numbers(), vec![Some(3.7), None]);
    }

    #[test]
    fn test_directory_sheets_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Channel_1-006_2.csv"), "t\n2\n3\n").unwrap();
        std::fs::write(dir.path().join("Channel_1-006_1.csv"), "t\n0\n1\n").unwrap();
        std::fs::write(dir.path().join("Statistics_1-006.csv"), "t\n9\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (table, _) = load_table(dir.path(), "Channel_1-").unwrap();

        assert_eq!(
            table.column("t").unwrap().numbers(),
            vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_unsupported_extension_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cell.txt");
        std::fs::write(&path, "x").unwrap();

        let err = load_table(&path, "Channel_1-").unwrap_err();
        assert!(matches!(err, LoadError::DataLoad { .. }));
        assert_eq!(err.file(), path.display().to_string());
    }

    fn write_xlsx(path: &Path) -> std::result::Result<(), rust_xlsxwriter::XlsxError> {
        let mut workbook = rust_xlsxwriter::Workbook::new();

        let info = workbook.add_worksheet().set_name("Info")?;
        info.write_string(0, 0, "Channel")?;
        info.write_number(1, 0, 6.0)?;

        let first = workbook.add_worksheet().set_name("Channel_1-006_1")?;
        for (col, header) in ["Test_Time(s)", "Current(A)", "Step"].iter().enumerate() {
            first.write_string(0, col as u16, *header)?;
        }
        first.write_number(1, 0, 0.0)?;
        first.write_number(1, 1, 0.1)?;
        first.write_string(1, 2, "Rest")?;
        first.write_number(2, 0, 1.0)?;
        first.write_number(2, 1, 0.2)?;
        first.write_string(2, 2, "CC_Chg")?;

        let stats = workbook.add_worksheet().set_name("Statistics_1-006")?;
        stats.write_string(0, 0, "Cycle_Index")?;
        stats.write_number(1, 0, 1.0)?;

        let second = workbook.add_worksheet().set_name("Channel_1-006_2")?;
        second.write_string(0, 0, "Test_Time(s)")?;
        second.write_string(0, 1, "Current(A)")?;
        second.write_number(1, 0, 2.0)?;
        second.write_number(1, 1, 0.3)?;
        // Row 2 leaves the current cell blank.
        second.write_number(2, 0, 3.0)?;
        second.write_number(3, 0, 4.0)?;
        second.write_number(3, 1, 0.5)?;

        workbook.save(path)
    }

    #[test]
    fn test_workbook_sheets_merged_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cell_a.xlsx");
        write_xlsx(&path).unwrap();

        let mut source = WorkbookSource::open(&path).unwrap();
        assert_eq!(
            source.sheet_names(),
            vec!["Info", "Channel_1-006_1", "Statistics_1-006", "Channel_1-006_2"]
        );
        let info = source.read_sheet("Info").unwrap();
        assert_eq!(info.column("Channel").unwrap().numbers(), vec![Some(6.0)]);

        let (table, columns) = load_table(&path, "Channel_1-").unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(columns, vec!["Test_Time(s)", "Current(A)", "Step"]);
        assert_eq!(
            table.column("Test_Time(s)").unwrap().numbers(),
            vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
        );
        assert_eq!(
            table.column("Current(A)").unwrap().numbers(),
            vec![Some(0.1), Some(0.2), Some(0.3), None, Some(0.5)]
        );
        assert_eq!(
            table.column("Step").unwrap().values,
            vec![
                CellValue::Text("Rest".into()),
                CellValue::Text("CC_Chg".into()),
                CellValue::Missing,
                CellValue::Missing,
                CellValue::Missing,
            ]
        );

        let (stats, _) = load_table(&path, "Statistics_1-").unwrap();
        assert_eq!(stats.column("Cycle_Index").unwrap().numbers(), vec![Some(1.0)]);
    }

    #[test]
    fn test_parquet_cells_typed_and_formatted() {
        use std::sync::Arc;

        use arrow::array::{Date32Array, Float64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("Voltage(V)", DataType::Float64, true),
            Field::new("Step", DataType::Utf8, false),
            Field::new("Date", DataType::Date32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![Some(3.7), None])),
                Arc::new(StringArray::from(vec!["Rest", "CC_Chg"])),
                Arc::new(Date32Array::from(vec![0, 1])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Statistics_1-006.parquet");
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let (table, _) = load_table(&path, "Statistics_1-").unwrap();

        assert_eq!(table.column("Voltage(V)").unwrap().numbers(), vec![Some(3.7), None]);
        assert_eq!(table.column("Step").unwrap().values[1], CellValue::Text("CC_Chg".into()));
        assert_eq!(
            table.column("Date").unwrap().values,
            vec![
                CellValue::Text("1970-01-01".into()),
                CellValue::Text("1970-01-02".into()),
            ]
        );
    }

    #[test]
    fn test_unreadable_workbook_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, "not a zip archive").unwrap();

        let err = load_table(&path, "Channel_1-").unwrap_err();
        assert!(matches!(err, LoadError::DataLoad { .. }));
    }
}

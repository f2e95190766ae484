use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::error::{ColumnError, LoadError};
use super::loader::load_table;
use super::model::{Dataset, Table};

// ---------------------------------------------------------------------------
// Batch inputs and outputs
// ---------------------------------------------------------------------------

/// One file to load, with an optional label override.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub label: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SourceFile {
            path: path.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The override if set, else the file name without its extension.
    pub fn label(&self) -> String {
        self.label
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| default_label(&self.path))
    }
}

impl From<PathBuf> for SourceFile {
    fn from(path: PathBuf) -> Self {
        SourceFile::new(path)
    }
}

impl From<&Path> for SourceFile {
    fn from(path: &Path) -> Self {
        SourceFile::new(path)
    }
}

/// File name with the last extension stripped (`a.b.xlsx` → `a.b`).
pub fn default_label(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}

/// A successfully loaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    pub label: String,
    pub table: Table,
    pub columns: Vec<String>,
}

impl LoadedFile {
    pub fn dataset(&self) -> Dataset {
        Dataset::new(self.label.clone(), self.table.clone())
    }
}

/// A file the batch skipped, with the reason.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: LoadError,
}

/// Everything a batch load produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub loaded: Vec<LoadedFile>,
    pub skipped: Vec<SkippedFile>,
}

// ---------------------------------------------------------------------------
// Batch loading
// ---------------------------------------------------------------------------

/// Load every file in order, skipping (and logging) the ones that fail.
pub fn load_all<I, F>(files: I, sheet_prefix: &str) -> Vec<LoadedFile>
where
    I: IntoIterator<Item = F>,
    F: Into<SourceFile>,
{
    load_all_with_report(files, sheet_prefix).loaded
}

/// Like [`load_all`], but also returns the skipped files and their errors.
pub fn load_all_with_report<I, F>(files: I, sheet_prefix: &str) -> BatchOutcome
where
    I: IntoIterator<Item = F>,
    F: Into<SourceFile>,
{
    let mut outcome = BatchOutcome::default();

    for file in files {
        let file: SourceFile = file.into();
        let label = file.label();
        match load_table(&file.path, sheet_prefix) {
            Ok((table, columns)) => {
                log::info!(
                    "Loaded {label}: {} rows, columns {columns:?}",
                    table.len()
                );
                outcome.loaded.push(LoadedFile {
                    label,
                    table,
                    columns,
                });
            }
            Err(error) => {
                log::warn!("Skipping {}: {error}", file.path.display());
                outcome.skipped.push(SkippedFile {
                    path: file.path,
                    error,
                });
            }
        }
    }

    outcome
}

// ---------------------------------------------------------------------------
// Column helpers for selection UIs
// ---------------------------------------------------------------------------

/// Sorted union of the column names of all loaded files.
pub fn available_columns(loaded: &[LoadedFile]) -> Vec<String> {
    loaded
        .iter()
        .flat_map(|f| f.columns.iter().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Check that every `required` column exists in the dataset's table.
pub fn require_columns(dataset: &Dataset, required: &[String]) -> Result<(), ColumnError> {
    let mut missing: Vec<String> = Vec::new();
    for name in required {
        if !dataset.table.has_column(name) && !missing.contains(name) {
            missing.push(name.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ColumnError::MissingColumns {
            dataset: dataset.label.clone(),
            missing,
            available: dataset.table.column_names(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_default_label_strips_last_extension() {
        assert_eq!(default_label(Path::new("/data/Na_MCMB_Test_6.xls")), "Na_MCMB_Test_6");
        assert_eq!(default_label(Path::new("cell.v2.xlsx")), "cell.v2");
        assert_eq!(default_label(Path::new("cell_dir")), "cell_dir");
    }

    #[test]
    fn test_label_override() {
        let file = SourceFile::new("a.xlsx").with_label("Anode HC");
        assert_eq!(file.label(), "Anode HC");
        assert_eq!(SourceFile::new("a.xlsx").with_label("  ").label(), "a");
    }

    #[test]
    fn test_bad_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_csv(dir.path(), "Channel_1-a.csv", "t,v\n0,3.7\n1,3.8\n");
        let wrong_sheet = write_csv(dir.path(), "Statistics_1-b.csv", "t,v\n0,3.7\n");
        let missing = dir.path().join("gone.xlsx");
        let good_too = write_csv(dir.path(), "Channel_1-c.csv", "t,v\n5,4.0\n");

        let outcome =
            load_all_with_report(vec![good, wrong_sheet, missing, good_too], "Channel_1-");

        let labels: Vec<&str> = outcome.loaded.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Channel_1-a", "Channel_1-c"]);
        assert_eq!(outcome.skipped.len(), 2);
        assert!(matches!(
            outcome.skipped[0].error,
            LoadError::NoMatchingSheet { .. }
        ));
        assert!(matches!(outcome.skipped[1].error, LoadError::DataLoad { .. }));
    }

    #[test]
    fn test_available_columns_is_sorted_union() {
        let file = |label: &str, cols: &[&str]| LoadedFile {
            label: label.into(),
            table: Table::new(),
            columns: cols.iter().map(|c| c.to_string()).collect(),
        };
        let loaded = vec![
            file("a", &["Voltage(V)", "Current(A)"]),
            file("b", &["Current(A)", "Cycle_Index"]),
        ];
        assert_eq!(
            available_columns(&loaded),
            vec!["Current(A)", "Cycle_Index", "Voltage(V)"]
        );
    }

    #[test]
    fn test_require_columns_lists_missing_and_available() {
        let dataset = Dataset::new(
            "cell",
            Table::from_columns(vec![Column::numeric("Voltage(V)", &[3.7])]),
        );
        let err = require_columns(
            &dataset,
            &["Voltage(V)".into(), "Current(A)".into(), "Current(A)".into()],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ColumnError::MissingColumns {
                dataset: "cell".into(),
                missing: vec!["Current(A)".into()],
                available: vec!["Voltage(V)".into()],
            }
        );
    }
}

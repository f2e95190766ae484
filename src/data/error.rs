use thiserror::Error;

/// Errors raised while loading one source file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no sheet in {file} starts with '{prefix}' (available sheets: {available:?})")]
    NoMatchingSheet {
        file: String,
        prefix: String,
        available: Vec<String>,
    },

    #[error("failed to load data from {file}: {source:#}")]
    DataLoad {
        file: String,
        #[source]
        source: anyhow::Error,
    },
}

impl LoadError {
    /// Identifier of the file the error refers to.
    pub fn file(&self) -> &str {
        match self {
            LoadError::NoMatchingSheet { file, .. } | LoadError::DataLoad { file, .. } => file,
        }
    }
}

/// Raised when selected axis columns are absent from a dataset's table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColumnError {
    #[error("missing columns in {dataset}: {missing:?} (available columns: {available:?})")]
    MissingColumns {
        dataset: String,
        missing: Vec<String>,
        available: Vec<String>,
    },
}

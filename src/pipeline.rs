use std::collections::BTreeSet;

use thiserror::Error;

use crate::chart::{compose, ChartRequest, ChartSpec};
use crate::data::{
    load_all_with_report, BatchOutcome, ColumnError, Dataset, LoadedFile, SkippedFile, SourceFile,
};
use crate::settings::PlotSettings;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("none of the {0} input file(s) could be loaded")]
    NothingLoaded(usize),

    #[error(transparent)]
    Columns(#[from] ColumnError),
}

/// Result of one end-to-end run.
#[derive(Debug)]
pub struct PipelineOutput {
    pub chart: ChartSpec,
    /// Datasets as charted, derived columns included.
    pub datasets: Vec<Dataset>,
    pub skipped: Vec<SkippedFile>,
}

/// Load → derive → compose, driven by one [`PlotSettings`] value.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    settings: PlotSettings,
}

impl Pipeline {
    pub fn new(settings: PlotSettings) -> Self {
        Pipeline { settings }
    }

    pub fn settings(&self) -> &PlotSettings {
        &self.settings
    }

    /// Load all files from the sheets of the configured kind.
    pub fn load<I, F>(&self, files: I) -> BatchOutcome
    where
        I: IntoIterator<Item = F>,
        F: Into<SourceFile>,
    {
        load_all_with_report(files, self.settings.sheet_kind.prefix())
    }

    /// Copy each loaded table and append the configured derived columns.
    pub fn prepare(&self, loaded: &[LoadedFile]) -> Vec<Dataset> {
        loaded
            .iter()
            .map(|file| {
                let (table, _) = self.settings.derived.apply(&file.label, &file.table);
                Dataset::new(file.label.clone(), table)
            })
            .collect()
    }

    /// The composer request, with y columns missing from any dataset dropped.
    pub fn request_for(&self, datasets: &[Dataset]) -> ChartRequest {
        let mut request = self.settings.chart_request();
        let before = request.left_columns.len() + request.right_columns.len();
        request.retain_present(datasets);
        let dropped = before - request.left_columns.len() - request.right_columns.len();
        if dropped > 0 {
            log::warn!("Dropped {dropped} selected column(s) not present in every dataset");
        }
        request
    }

    pub fn compose(&self, datasets: &[Dataset]) -> Result<ChartSpec, ColumnError> {
        compose(datasets, &self.request_for(datasets))
    }

    /// Run the whole pipeline. Column selections left empty in the settings
    /// are filled from the columns of the loaded data.
    pub fn run<I, F>(&self, files: I) -> Result<PipelineOutput, PipelineError>
    where
        I: IntoIterator<Item = F>,
        F: Into<SourceFile>,
    {
        let files: Vec<SourceFile> = files.into_iter().map(Into::into).collect();
        let total = files.len();

        let outcome = self.load(files);
        if outcome.loaded.is_empty() {
            return Err(PipelineError::NothingLoaded(total));
        }

        let datasets = self.prepare(&outcome.loaded);

        let mut settings = self.settings.clone();
        settings.fill_defaults(&dataset_columns(&datasets));
        let chart = Pipeline::new(settings).compose(&datasets)?;

        Ok(PipelineOutput {
            chart,
            datasets,
            skipped: outcome.skipped,
        })
    }
}

/// Sorted union of the column names of `datasets`.
pub fn dataset_columns(datasets: &[Dataset]) -> Vec<String> {
    datasets
        .iter()
        .flat_map(|d| d.table.column_names())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

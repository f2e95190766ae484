//! Battery test export plotting.
//!
//! This crate provides tools for:
//! - Loading multi-sheet battery cycler exports and merging sheets by name prefix
//! - Batch loading with per-file fault isolation
//! - Derived metrics (normalized capacity, coulombic efficiency)
//! - Micro-unit rescaling of tiny signals
//! - Composing dual-axis Plotly chart specifications and exporting them as HTML
//!
//! # Example
//!
//! ```no_run
//! use battery_plotter::{Pipeline, PlotSettings};
//!
//! let settings = PlotSettings {
//!     left_columns: vec!["Current(A)".into()],
//!     right_columns: vec!["Voltage(V)".into()],
//!     ..Default::default()
//! };
//! let output = Pipeline::new(settings).run(vec![std::path::PathBuf::from("cell.xlsx")])?;
//! println!("{}", output.chart.to_json_string()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod chart;
pub mod color;
pub mod data;
pub mod pipeline;
pub mod settings;

pub use chart::{compose, ChartRequest, ChartSpec};
pub use data::{Dataset, LoadError, Table};
pub use pipeline::{Pipeline, PipelineError, PipelineOutput};
pub use settings::{PlotSettings, PlotStyle, SheetKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

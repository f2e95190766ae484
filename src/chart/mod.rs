//! Chart layer: compose labelled tables into a dual-axis chart specification
//! and export it.
//!
//! ```text
//!  Vec<Dataset> + ChartRequest
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ compose   │  per dataset: colour pair, unit scaling per axis group, traces
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ ChartSpec │  Plotly figure JSON
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ export    │  standalone HTML document
//!   └──────────┘
//! ```

pub mod compose;
pub mod export;
pub mod spec;

pub use compose::{compose, ChartRequest, DisplayModes, XAxisRole, CYCLE_INDEX, DEFAULT_TITLE};
pub use export::{render_html, render_html_with, safe_file_stem, save_html, ExportError, PlotlyScript};
pub use spec::{ChartSpec, DisplayMode, DragMode, Trace, XInteraction, YAxis};

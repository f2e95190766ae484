/// Data layer: table model, loading, unit scaling and derived columns.
///
/// Architecture:
/// ```text
///  .xlsx / .xls / .ods / .csv / .parquet / dir
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  select sheets by prefix → merged Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  batch    │  many files → labelled tables, bad files skipped
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  normalized capacity, coulombic efficiency (on a copy)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  scale    │  micro-unit rescaling per axis group (chart working copy)
///   └──────────┘
/// ```

pub mod batch;
pub mod derive;
pub mod error;
pub mod loader;
pub mod model;
pub mod scale;

pub use batch::{
    available_columns, load_all, load_all_with_report, require_columns, BatchOutcome, LoadedFile,
    SkippedFile, SourceFile,
};
pub use derive::{CapacitySource, DerivedColumns, NormalizedCapacity};
pub use error::{ColumnError, LoadError};
pub use loader::{load_from_source, load_table, MemorySource, SheetSource};
pub use model::{CellValue, Column, Dataset, Table};
pub use scale::{scale_column, scale_columns, ColumnScaling};

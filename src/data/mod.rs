/// Data layer: core types, loading, cleaning stages and saving.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ hygiene   │  missing → types → duplicates → categories → dates
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ outliers  │  per-column IQR bounds → row filter
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  Dataset → .csv / .tsv / .json
///   └──────────┘
/// ```

pub mod error;
pub mod hygiene;
pub mod loader;
pub mod model;
pub mod outliers;
pub mod writer;

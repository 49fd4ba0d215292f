/// Data layer: core types, loading, sources and filtering.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse + clean file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │    source    │  RecordSource: get_all / get_filtered / unique values
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  FilterCriteria → filtered records (stable order)
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
pub mod source;

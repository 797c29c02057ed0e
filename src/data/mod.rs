/// Data layer: core types, loading, and column selection.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .txt / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  index + Vec<Column>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  select   │  column references → derived Table
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod select;

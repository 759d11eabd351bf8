/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → raw rows → clean → TipsDataset
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ TipsDataset │  Vec<TipRecord>, immutable
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  one pure operation per chart → derived views
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;

/// Data layer: core types, loading, normalization, filtering and aggregation.
///
/// Architecture:
/// ```text
///  Drive URL / .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (text cells)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  check columns, coerce cells, drop bad rows → Dataset
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  region → date → biome → time of day → numeric rules
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  by day / category / top-N / series / critical regions
///   └───────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;

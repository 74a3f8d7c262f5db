/// Data layer: core types, stores, filtering and cross-frame operations.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → long-format records
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────────────────┐
///   │ Frame                         │
///   │   TimeseriesStore  (long/wide)│
///   │   MetaStore  (model,scenario) │
///   └──────────────────────────────┘
///        │                  │
///        ▼                  ▼
///   ┌──────────┐      ┌──────────┐
///   │  filter   │      │   ops     │  subtract two frames,
///   └──────────┘      └──────────┘  reconcile metadata
/// ```

pub mod filter;
pub mod frame;
pub mod loader;
pub mod meta;
pub mod model;
pub mod ops;
pub mod timeseries;

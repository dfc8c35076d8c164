//! Reach Scorer Rust Implementation
//!
//! Ecological condition indices and habitat units for stream-restoration
//! reaches, per restoration alternative, forecast year and stream side.
//!
//! Layout:
//! - `utils/`: Normalization of rubric scores, fractions and hydraulic deviations
//! - `metrics/`: Composite index engine, instream (UIM) and riparian (REFI) indices
//! - `habitat_units`: Area conversion and habitat unit aggregation
//! - `scorer`: Batch processor over input records (sequential or Rayon)
//! - `data`: Input table loading with Polars
//! - `summary`: Per-alternative totals and average annual habitat units

pub mod config;
pub mod data;
pub mod error;
pub mod habitat_units;
pub mod metrics;
pub mod scorer;
pub mod summary;
pub mod utils;

// Re-export commonly used types
pub use config::EngineConfig;
pub use data::{load_records, records_from_frame};
pub use error::{IndexError, RecordError, RecordKey};
pub use habitat_units::{AreaUnit, HabitatUnits, ReachExtents};
pub use metrics::*;
pub use scorer::{InputRecord, OutputRecord, ReachScorer, ScoredTable};
pub use summary::{average_annual_habitat_units, compare_alternatives, summarize};

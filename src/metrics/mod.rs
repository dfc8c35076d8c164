//! Composite condition indices for reach scoring
//!
//! Both indices share the data-driven engine in `composite`; each calculator
//! module supplies its default definition and a typed result.

pub mod composite;
pub mod instream_uim;
pub mod riparian_refi;

// Re-export metric functions
pub use composite::{evaluate, CompositeScore, CompositeSpec, MetricSource, MetricSpec, ModuleScore, ModuleSpec};
pub use instream_uim::{calculate_uim, default_uim_spec, UimInputs, UimResult, UIM_FIELDS};
pub use riparian_refi::{calculate_refi, default_refi_spec, RefiInputs, RefiResult, REFI_FIELDS};

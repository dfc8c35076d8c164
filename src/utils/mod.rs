//! Utility modules for reach scoring
//!
//! Contains shared functionality used across both composite indices:
//! - Normalization: rubric ratios, fractions and site-to-reference deviation

pub mod normalization;

// Re-export commonly used types
pub use normalization::{
    deviation_index, fraction, rubric_ratio, Normalization, DEFAULT_DEVIATION_CUTOFF,
    REFI_RUBRIC_MAX, UIM_RUBRIC_MAX,
};

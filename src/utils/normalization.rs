//! Normalization Utilities
//!
//! Converts heterogeneous raw metrics onto a common 0-1 condition scale:
//! - Rubric scores (0-20 or 0-15 field forms) divided by their maximum
//! - Fractions already on 0-1 (passage rate)
//! - Site-to-reference hydraulic comparisons (bankfull velocity, bankfull area)
//!
//! All functions validate their inputs and name the offending field on failure.

use serde::{Deserialize, Serialize};
use crate::error::IndexError;

/// Maximum of the instream (UIM) field rubrics
pub const UIM_RUBRIC_MAX: f64 = 20.0;

/// Maximum of the riparian (REFI) field rubrics
pub const REFI_RUBRIC_MAX: f64 = 15.0;

/// Site values beyond this multiple of the reference score 0
pub const DEFAULT_DEVIATION_CUTOFF: f64 = 2.0;

/// How one raw metric is brought onto the 0-1 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalization {
    /// `score / max`, score must lie in `[0, max]`
    Rubric { max: f64 },
    /// Deviation of the metric (site value) from the named reference field
    Deviation {
        reference: String,
        #[serde(default = "default_cutoff")]
        cutoff_multiple: f64,
    },
    /// Value already on `[0, 1]`
    Fraction,
}

fn default_cutoff() -> f64 {
    DEFAULT_DEVIATION_CUTOFF
}

impl Normalization {
    pub fn rubric(max: f64) -> Self {
        Normalization::Rubric { max }
    }

    pub fn deviation(reference: &str) -> Self {
        Normalization::Deviation {
            reference: reference.to_string(),
            cutoff_multiple: DEFAULT_DEVIATION_CUTOFF,
        }
    }
}

fn require_finite(field: &str, value: f64) -> Result<f64, IndexError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(IndexError::NonFinite { field: field.to_string() })
    }
}

fn require_within(field: &str, value: f64, min: f64, max: f64) -> Result<f64, IndexError> {
    let value = require_finite(field, value)?;
    if value < min || value > max {
        return Err(IndexError::OutOfBounds {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(value)
}

/// Rubric score divided by its declared maximum
pub fn rubric_ratio(field: &str, score: f64, max: f64) -> Result<f64, IndexError> {
    let score = require_within(field, score, 0.0, max)?;
    Ok(score / max)
}

/// Pass-through for metrics already expressed on `[0, 1]`
pub fn fraction(field: &str, value: f64) -> Result<f64, IndexError> {
    require_within(field, value, 0.0, 1.0)
}

/// Deviation-based index comparing a site value with its reference
///
/// - `site > cutoff_multiple × reference` → 0 (hard cutoff, no taper)
/// - otherwise `1 - |reference - site| / reference`
///
/// Deviation is penalized symmetrically; with the default cutoff of 2 the
/// result stays on `[0, 1]` for any non-negative site value.
pub fn deviation_index(
    field: &str,
    site: f64,
    reference: f64,
    cutoff_multiple: f64,
) -> Result<f64, IndexError> {
    let reference = require_finite(field, reference)?;
    if reference <= 0.0 {
        return Err(IndexError::NonPositiveReference {
            field: field.to_string(),
            value: reference,
        });
    }
    let site = require_within(field, site, 0.0, f64::INFINITY)?;

    if site > cutoff_multiple * reference {
        return Ok(0.0);
    }

    Ok((1.0 - (reference - site).abs() / reference).max(0.0))
}

//! Composite index engine
//!
//! A composite index is a list of sub-modules, each a list of raw metrics with
//! their normalization rule. Sub-module index = mean of its normalized metrics;
//! composite total = weighted mean of the sub-module indices.
//!
//! Weights and normalization bounds live in `CompositeSpec` (serde), so both
//! UIM and REFI can be re-weighted from a JSON config without code changes.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::utils::normalization::{deviation_index, fraction, rubric_ratio, Normalization};

/// Named raw metric values for one side of one record
pub trait MetricSource {
    /// Raw value of `field`, or `None` if this source has no such field
    fn metric(&self, field: &str) -> Option<f64>;
}

/// One raw metric and how to normalize it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub field: String,
    pub normalization: Normalization,
}

impl MetricSpec {
    pub fn new(field: &str, normalization: Normalization) -> Self {
        Self {
            field: field.to_string(),
            normalization,
        }
    }
}

/// One thematic sub-module (hydrology, habitat, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub metrics: Vec<MetricSpec>,
}

fn default_weight() -> f64 {
    1.0
}

impl ModuleSpec {
    pub fn new(name: &str, metrics: Vec<MetricSpec>) -> Self {
        Self {
            name: name.to_string(),
            weight: default_weight(),
            metrics,
        }
    }
}

/// Full definition of a composite index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSpec {
    pub modules: Vec<ModuleSpec>,
}

impl CompositeSpec {
    /// Reject specs that could not produce a 0-1 score
    pub fn validate(&self, label: &str) -> Result<()> {
        if self.modules.is_empty() {
            bail!("{}: composite index has no modules", label);
        }

        for module in &self.modules {
            if !(module.weight.is_finite() && module.weight > 0.0) {
                bail!("{}: module '{}' has invalid weight {}", label, module.name, module.weight);
            }
            if module.metrics.is_empty() {
                bail!("{}: module '{}' has no metrics", label, module.name);
            }
            for metric in &module.metrics {
                match &metric.normalization {
                    Normalization::Rubric { max } if !(max.is_finite() && *max > 0.0) => {
                        bail!("{}: metric '{}' has invalid rubric max {}", label, metric.field, max);
                    }
                    Normalization::Deviation { cutoff_multiple, .. }
                        if !(cutoff_multiple.is_finite() && *cutoff_multiple > 1.0) =>
                    {
                        bail!(
                            "{}: metric '{}' has invalid deviation cutoff {}",
                            label,
                            metric.field,
                            cutoff_multiple
                        );
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

/// Score of one sub-module
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleScore {
    pub name: String,
    pub value: f64,
}

/// Result of evaluating a composite index
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScore {
    pub modules: Vec<ModuleScore>,
    pub total: f64,
}

impl CompositeScore {
    /// Sub-module index by name
    pub fn module(&self, name: &str) -> Result<f64, IndexError> {
        self.modules
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value)
            .ok_or_else(|| IndexError::MissingModule { module: name.to_string() })
    }
}

fn raw_metric(source: &impl MetricSource, field: &str) -> Result<f64, IndexError> {
    source
        .metric(field)
        .ok_or_else(|| IndexError::UnknownMetric { field: field.to_string() })
}

/// Normalize one metric of `source` onto 0-1
pub fn normalize_metric(metric: &MetricSpec, source: &impl MetricSource) -> Result<f64, IndexError> {
    let value = raw_metric(source, &metric.field)?;

    match &metric.normalization {
        Normalization::Rubric { max } => rubric_ratio(&metric.field, value, *max),
        Normalization::Fraction => fraction(&metric.field, value),
        Normalization::Deviation { reference, cutoff_multiple } => {
            let reference_value = raw_metric(source, reference)?;
            // Bad reference values are reported against the reference column
            if !(reference_value.is_finite() && reference_value > 0.0) {
                return deviation_index(reference, value, reference_value, *cutoff_multiple);
            }
            deviation_index(&metric.field, value, reference_value, *cutoff_multiple)
        }
    }
}

fn invalid_module(module: &str, reason: String) -> IndexError {
    IndexError::InvalidModule {
        module: module.to_string(),
        reason,
    }
}

/// Evaluate a composite index against one metric source
///
/// A spec that passed `CompositeSpec::validate` never fails here on its own
/// shape; unvalidated specs with no modules, an empty module or a non-positive
/// weight yield `InvalidModule` instead of a NaN score.
pub fn evaluate(spec: &CompositeSpec, source: &impl MetricSource) -> Result<CompositeScore, IndexError> {
    if spec.modules.is_empty() {
        return Err(invalid_module("*", "composite index has no modules".to_string()));
    }

    let mut modules = Vec::with_capacity(spec.modules.len());
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for module in &spec.modules {
        if module.metrics.is_empty() {
            return Err(invalid_module(&module.name, "no metrics".to_string()));
        }
        if !(module.weight.is_finite() && module.weight > 0.0) {
            return Err(invalid_module(&module.name, format!("invalid weight {}", module.weight)));
        }

        let mut sum = 0.0;
        for metric in &module.metrics {
            sum += normalize_metric(metric, source)?;
        }
        let value = sum / module.metrics.len() as f64;

        weighted_sum += module.weight * value;
        weight_total += module.weight;
        modules.push(ModuleScore {
            name: module.name.clone(),
            value,
        });
    }

    Ok(CompositeScore {
        modules,
        total: weighted_sum / weight_total,
    })
}

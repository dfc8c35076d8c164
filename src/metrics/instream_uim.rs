//! INSTREAM INDEX (UIM)
//!
//! Combines four sub-module indices into one instream condition score per
//! reach-year:
//!
//! | Sub-module | Metrics |
//! |---|---|
//! | hydrology | bank-height ratio /20, bankfull velocity deviation, bankfull area deviation |
//! | geomorphology | channel alteration, channel evolution, bank stability (each /20) |
//! | habitat | cover, large wood, velocity-depth regime, substrate (each /20) |
//! | connectivity | aquatic organism passage /20, material transport /20, passage rate |
//!
//! Total = mean of the four sub-indices (equal weights in the default spec).

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::metrics::composite::{evaluate, CompositeSpec, MetricSource, MetricSpec, ModuleSpec};
use crate::utils::normalization::{Normalization, UIM_RUBRIC_MAX};

pub const HYDROLOGY: &str = "hydrology";
pub const GEOMORPHOLOGY: &str = "geomorphology";
pub const HABITAT: &str = "habitat";
pub const CONNECTIVITY: &str = "connectivity";

/// Field names of `UimInputs`, in declaration order
pub const UIM_FIELDS: &[&str] = &[
    "bhr_score",
    "bankfull_velocity",
    "ref_bankfull_velocity",
    "bankfull_area",
    "ref_bankfull_area",
    "channel_alteration",
    "channel_evolution",
    "bank_stability",
    "habitat_cover",
    "large_wood",
    "velocity_depth",
    "substrate",
    "aop_score",
    "material_transport",
    "passage_rate",
];

/// Raw instream metrics for one reach-year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UimInputs {
    /// Bank-height ratio rubric score (0-20)
    pub bhr_score: f64,
    pub bankfull_velocity: f64,
    pub ref_bankfull_velocity: f64,
    pub bankfull_area: f64,
    pub ref_bankfull_area: f64,
    pub channel_alteration: f64,
    pub channel_evolution: f64,
    pub bank_stability: f64,
    pub habitat_cover: f64,
    pub large_wood: f64,
    pub velocity_depth: f64,
    pub substrate: f64,
    /// Aquatic organism passage rubric score (0-20)
    pub aop_score: f64,
    pub material_transport: f64,
    /// Passage rate, already 0-1
    pub passage_rate: f64,
}

impl MetricSource for UimInputs {
    fn metric(&self, field: &str) -> Option<f64> {
        let value = match field {
            "bhr_score" => self.bhr_score,
            "bankfull_velocity" => self.bankfull_velocity,
            "ref_bankfull_velocity" => self.ref_bankfull_velocity,
            "bankfull_area" => self.bankfull_area,
            "ref_bankfull_area" => self.ref_bankfull_area,
            "channel_alteration" => self.channel_alteration,
            "channel_evolution" => self.channel_evolution,
            "bank_stability" => self.bank_stability,
            "habitat_cover" => self.habitat_cover,
            "large_wood" => self.large_wood,
            "velocity_depth" => self.velocity_depth,
            "substrate" => self.substrate,
            "aop_score" => self.aop_score,
            "material_transport" => self.material_transport,
            "passage_rate" => self.passage_rate,
            _ => return None,
        };
        Some(value)
    }
}

/// Result of the UIM calculation, every field on 0-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UimResult {
    pub hydrology: f64,
    pub geomorphology: f64,
    pub habitat: f64,
    pub connectivity: f64,
    pub total: f64,
}

fn rubric(field: &str) -> MetricSpec {
    MetricSpec::new(field, Normalization::rubric(UIM_RUBRIC_MAX))
}

/// Default UIM definition: four equally weighted sub-modules
pub fn default_uim_spec() -> CompositeSpec {
    CompositeSpec {
        modules: vec![
            ModuleSpec::new(
                HYDROLOGY,
                vec![
                    rubric("bhr_score"),
                    MetricSpec::new("bankfull_velocity", Normalization::deviation("ref_bankfull_velocity")),
                    MetricSpec::new("bankfull_area", Normalization::deviation("ref_bankfull_area")),
                ],
            ),
            ModuleSpec::new(
                GEOMORPHOLOGY,
                vec![
                    rubric("channel_alteration"),
                    rubric("channel_evolution"),
                    rubric("bank_stability"),
                ],
            ),
            ModuleSpec::new(
                HABITAT,
                vec![
                    rubric("habitat_cover"),
                    rubric("large_wood"),
                    rubric("velocity_depth"),
                    rubric("substrate"),
                ],
            ),
            ModuleSpec::new(
                CONNECTIVITY,
                vec![
                    rubric("aop_score"),
                    rubric("material_transport"),
                    MetricSpec::new("passage_rate", Normalization::Fraction),
                ],
            ),
        ],
    }
}

/// Calculate the instream condition index
///
/// Pure function of `inputs` and `spec`. Any out-of-range rubric score or
/// non-positive reference value fails the whole calculation.
pub fn calculate_uim(inputs: &UimInputs, spec: &CompositeSpec) -> Result<UimResult, IndexError> {
    let score = evaluate(spec, inputs)?;

    Ok(UimResult {
        hydrology: score.module(HYDROLOGY)?,
        geomorphology: score.module(GEOMORPHOLOGY)?,
        habitat: score.module(HABITAT)?,
        connectivity: score.module(CONNECTIVITY)?,
        total: score.total,
    })
}

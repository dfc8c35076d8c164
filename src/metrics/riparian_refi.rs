//! RIPARIAN INDEX (REFI)
//!
//! Scores one riparian corridor (left or right bank) from twelve 0-15 field
//! rubric scores grouped into three sub-modules:
//! - instream_process: runoff, hydrologic connection, streambank, energy/nutrients, filtering
//! - habitat: plant community, canopy, understory, forest floor, stream habitat
//! - connectivity: lateral and longitudinal movement
//!
//! Total = mean of the three sub-indices.

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::metrics::composite::{evaluate, CompositeSpec, MetricSource, MetricSpec, ModuleSpec};
use crate::utils::normalization::{Normalization, REFI_RUBRIC_MAX};

pub const INSTREAM_PROCESS: &str = "instream_process";
pub const HABITAT: &str = "habitat";
pub const CONNECTIVITY: &str = "connectivity";

/// Field names of `RefiInputs`, in declaration order
pub const REFI_FIELDS: &[&str] = &[
    "watershed_runoff",
    "hydrologic_connection",
    "streambank",
    "energy_nutrients",
    "riparian_filtering",
    "plant_community",
    "canopy",
    "understory",
    "forest_floor",
    "stream_habitat",
    "lateral_connectivity",
    "longitudinal_connectivity",
];

/// Raw riparian rubric scores (each 0-15) for one bank of one reach-year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefiInputs {
    pub watershed_runoff: f64,
    pub hydrologic_connection: f64,
    pub streambank: f64,
    pub energy_nutrients: f64,
    pub riparian_filtering: f64,
    pub plant_community: f64,
    pub canopy: f64,
    pub understory: f64,
    pub forest_floor: f64,
    pub stream_habitat: f64,
    pub lateral_connectivity: f64,
    pub longitudinal_connectivity: f64,
}

impl MetricSource for RefiInputs {
    fn metric(&self, field: &str) -> Option<f64> {
        let value = match field {
            "watershed_runoff" => self.watershed_runoff,
            "hydrologic_connection" => self.hydrologic_connection,
            "streambank" => self.streambank,
            "energy_nutrients" => self.energy_nutrients,
            "riparian_filtering" => self.riparian_filtering,
            "plant_community" => self.plant_community,
            "canopy" => self.canopy,
            "understory" => self.understory,
            "forest_floor" => self.forest_floor,
            "stream_habitat" => self.stream_habitat,
            "lateral_connectivity" => self.lateral_connectivity,
            "longitudinal_connectivity" => self.longitudinal_connectivity,
            _ => return None,
        };
        Some(value)
    }
}

/// Result of the REFI calculation, every field on 0-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefiResult {
    pub instream_process: f64,
    pub habitat: f64,
    pub connectivity: f64,
    pub total: f64,
}

fn rubric_module(name: &str, fields: &[&str]) -> ModuleSpec {
    ModuleSpec::new(
        name,
        fields
            .iter()
            .map(|f| MetricSpec::new(f, Normalization::rubric(REFI_RUBRIC_MAX)))
            .collect(),
    )
}

/// Default REFI definition: three equally weighted sub-modules
pub fn default_refi_spec() -> CompositeSpec {
    CompositeSpec {
        modules: vec![
            rubric_module(INSTREAM_PROCESS, &REFI_FIELDS[0..5]),
            rubric_module(HABITAT, &REFI_FIELDS[5..10]),
            rubric_module(CONNECTIVITY, &REFI_FIELDS[10..12]),
        ],
    }
}

/// Calculate the riparian condition index for one bank
pub fn calculate_refi(inputs: &RefiInputs, spec: &CompositeSpec) -> Result<RefiResult, IndexError> {
    let score = evaluate(spec, inputs)?;

    Ok(RefiResult {
        instream_process: score.module(INSTREAM_PROCESS)?,
        habitat: score.module(HABITAT)?,
        connectivity: score.module(CONNECTIVITY)?,
        total: score.total,
    })
}

//! Habitat unit aggregation
//!
//! Habitat units (HU) = condition index × area in acres. Each record yields
//! three disjoint components (left bank, right bank, channel) and their sum.

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

pub const SQUARE_FEET_PER_ACRE: f64 = 43_560.0;

/// Unit of the riparian area columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    #[default]
    Acres,
    SquareFeet,
}

impl AreaUnit {
    pub fn to_acres(self, value: f64) -> f64 {
        match self {
            AreaUnit::Acres => value,
            AreaUnit::SquareFeet => value / SQUARE_FEET_PER_ACRE,
        }
    }
}

/// Physical extents of one reach-year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachExtents {
    pub reach_length_ft: f64,
    pub reach_top_width_ft: f64,
    pub left_riparian_area: f64,
    pub right_riparian_area: f64,
}

/// HU components for one record
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HabitatUnits {
    pub riparian_left: f64,
    pub riparian_right: f64,
    pub instream: f64,
    pub total: f64,
}

impl HabitatUnits {
    pub fn new(riparian_left: f64, riparian_right: f64, instream: f64) -> Self {
        Self {
            riparian_left,
            riparian_right,
            instream,
            total: riparian_left + riparian_right + instream,
        }
    }
}

/// Areas (acres) of the three spatial components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentAreas {
    pub riparian_left: f64,
    pub riparian_right: f64,
    pub instream: f64,
}

fn non_negative(field: &str, value: f64) -> Result<f64, IndexError> {
    if !value.is_finite() {
        return Err(IndexError::NonFinite { field: field.to_string() });
    }
    if value < 0.0 {
        return Err(IndexError::NegativeArea {
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Channel area in acres from reach length and top width in feet
pub fn instream_area_acres(reach_length_ft: f64, reach_top_width_ft: f64) -> Result<f64, IndexError> {
    let length = non_negative("reach_length_ft", reach_length_ft)?;
    let width = non_negative("reach_top_width_ft", reach_top_width_ft)?;
    Ok(length * width / SQUARE_FEET_PER_ACRE)
}

impl ReachExtents {
    /// Validate extents and convert every component to acres
    pub fn areas(&self, riparian_unit: AreaUnit) -> Result<ComponentAreas, IndexError> {
        let left = non_negative("left_riparian_area", self.left_riparian_area)?;
        let right = non_negative("right_riparian_area", self.right_riparian_area)?;

        Ok(ComponentAreas {
            riparian_left: riparian_unit.to_acres(left),
            riparian_right: riparian_unit.to_acres(right),
            instream: instream_area_acres(self.reach_length_ft, self.reach_top_width_ft)?,
        })
    }
}

/// Condition index × area
pub fn habitat_units(condition: f64, area_acres: f64) -> f64 {
    condition * area_acres
}

/// Combine the three condition indices with their areas
pub fn aggregate(
    riparian_left_condition: f64,
    riparian_right_condition: f64,
    instream_condition: f64,
    areas: &ComponentAreas,
) -> HabitatUnits {
    HabitatUnits::new(
        habitat_units(riparian_left_condition, areas.riparian_left),
        habitat_units(riparian_right_condition, areas.riparian_right),
        habitat_units(instream_condition, areas.instream),
    )
}

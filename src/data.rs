//! Data Loading
//!
//! Reads the reach input table (CSV or Parquet) with Polars and converts each
//! row into a typed `InputRecord`. A missing column fails the whole load; a
//! null cell fails only its row.
//!
//! Column layout: `ReachID`, `SiteAction`, `Year`, the UIM field names, the
//! REFI field names prefixed with `left_` / `right_`, and the reach extents.

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{IndexError, RecordError, RecordKey};
use crate::habitat_units::ReachExtents;
use crate::metrics::{RefiInputs, UimInputs, REFI_FIELDS, UIM_FIELDS};
use crate::scorer::InputRecord;

pub const REACH_ID_COL: &str = "ReachID";
pub const ALTERNATIVE_COL: &str = "SiteAction";
pub const YEAR_COL: &str = "Year";

/// Physical extent columns
pub const EXTENT_COLUMNS: &[&str] = &[
    "reach_length_ft",
    "reach_top_width_ft",
    "left_riparian_area",
    "right_riparian_area",
];

const RIPARIAN_SIDES: [&str; 2] = ["left_", "right_"];

/// Every column the loader reads, in table order
pub fn required_columns() -> Vec<String> {
    let mut columns: Vec<String> = [REACH_ID_COL, ALTERNATIVE_COL, YEAR_COL]
        .iter()
        .map(|s| s.to_string())
        .collect();
    columns.extend(UIM_FIELDS.iter().map(|s| s.to_string()));
    for side in RIPARIAN_SIDES {
        columns.extend(REFI_FIELDS.iter().map(|f| format!("{}{}", side, f)));
    }
    columns.extend(EXTENT_COLUMNS.iter().map(|s| s.to_string()));
    columns
}

/// Load input rows from a CSV (header row) or Parquet file
pub fn load_records(path: &Path) -> Result<Vec<Result<InputRecord, RecordError>>> {
    let df = read_frame(path)?;
    tracing::info!("Loaded {} rows from {:?}", df.height(), path);
    records_from_frame(&df)
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to scan parquet: {:?}", path))?
            .collect()
            .with_context(|| format!("Failed to load parquet: {:?}", path)),
        _ => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None) // Scan entire file
            .with_schema_overwrite(Some(Arc::new(input_schema())))
            .with_ignore_errors(true) // Unparsable cells become null
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load CSV: {:?}", path)),
    }
}

/// Declared CSV column types: keys as text, everything else Float64
///
/// Keys are never inferred, so `007` stays `007`. Year is read as Float64
/// and checked for a whole number per row.
fn input_schema() -> Schema {
    let columns = required_columns();
    let mut schema = Schema::with_capacity(columns.len());
    for name in columns {
        let dtype = match name.as_str() {
            REACH_ID_COL | ALTERNATIVE_COL => DataType::String,
            _ => DataType::Float64,
        };
        schema.with_column(name.as_str().into(), dtype);
    }
    schema
}

/// Convert a DataFrame into per-row input records
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<Result<InputRecord, RecordError>>> {
    let available: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let missing: Vec<String> = required_columns()
        .into_iter()
        .filter(|c| !available.contains(c))
        .collect();
    if !missing.is_empty() {
        bail!("Input table is missing columns: {:?}", missing);
    }

    let columns = FrameColumns::new(df)?;
    Ok((0..df.height()).map(|row| columns.record(row)).collect())
}

/// Typed views of every required column
struct FrameColumns {
    reach_ids: StringChunked,
    alternatives: StringChunked,
    years: Float64Chunked,
    floats: FxHashMap<String, Float64Chunked>,
}

impl FrameColumns {
    fn new(df: &DataFrame) -> Result<Self> {
        let mut floats = FxHashMap::default();
        for name in required_columns().into_iter().skip(3) {
            let ca = cast_column(df, &name, DataType::Float64)?.f64()?.clone();
            floats.insert(name, ca);
        }

        Ok(Self {
            reach_ids: cast_column(df, REACH_ID_COL, DataType::String)?.str()?.clone(),
            alternatives: cast_column(df, ALTERNATIVE_COL, DataType::String)?.str()?.clone(),
            years: cast_column(df, YEAR_COL, DataType::Float64)?.f64()?.clone(),
            floats,
        })
    }

    fn key(&self, row: usize) -> Result<RecordKey, IndexError> {
        let missing = |field: &str| IndexError::MissingField { field: field.to_string() };

        let reach_id = self.reach_ids.get(row).ok_or_else(|| missing(REACH_ID_COL))?;
        let alternative = self.alternatives.get(row).ok_or_else(|| missing(ALTERNATIVE_COL))?;
        let year = self.years.get(row).ok_or_else(|| missing(YEAR_COL))?;
        let year = whole_year(year)?;

        Ok(RecordKey {
            reach_id: reach_id.to_string(),
            alternative: alternative.to_string(),
            year,
        })
    }

    fn value(&self, name: &str, row: usize) -> Result<f64, IndexError> {
        self.floats
            .get(name)
            .and_then(|ca| ca.get(row))
            .ok_or_else(|| IndexError::MissingField { field: name.to_string() })
    }

    fn record(&self, row: usize) -> Result<InputRecord, RecordError> {
        let key = self.key(row).map_err(|source| RecordError { row, key: None, source })?;

        self.fields(row, key.clone()).map_err(|source| RecordError {
            row,
            key: Some(key),
            source,
        })
    }

    fn fields(&self, row: usize, key: RecordKey) -> Result<InputRecord, IndexError> {
        let v = |name: &str| self.value(name, row);

        let instream = UimInputs {
            bhr_score: v("bhr_score")?,
            bankfull_velocity: v("bankfull_velocity")?,
            ref_bankfull_velocity: v("ref_bankfull_velocity")?,
            bankfull_area: v("bankfull_area")?,
            ref_bankfull_area: v("ref_bankfull_area")?,
            channel_alteration: v("channel_alteration")?,
            channel_evolution: v("channel_evolution")?,
            bank_stability: v("bank_stability")?,
            habitat_cover: v("habitat_cover")?,
            large_wood: v("large_wood")?,
            velocity_depth: v("velocity_depth")?,
            substrate: v("substrate")?,
            aop_score: v("aop_score")?,
            material_transport: v("material_transport")?,
            passage_rate: v("passage_rate")?,
        };

        Ok(InputRecord {
            key,
            instream,
            riparian_left: self.riparian(row, "left_")?,
            riparian_right: self.riparian(row, "right_")?,
            extents: ReachExtents {
                reach_length_ft: v("reach_length_ft")?,
                reach_top_width_ft: v("reach_top_width_ft")?,
                left_riparian_area: v("left_riparian_area")?,
                right_riparian_area: v("right_riparian_area")?,
            },
        })
    }

    fn riparian(&self, row: usize, side: &str) -> Result<RefiInputs, IndexError> {
        let v = |field: &str| self.value(&format!("{}{}", side, field), row);

        Ok(RefiInputs {
            watershed_runoff: v("watershed_runoff")?,
            hydrologic_connection: v("hydrologic_connection")?,
            streambank: v("streambank")?,
            energy_nutrients: v("energy_nutrients")?,
            riparian_filtering: v("riparian_filtering")?,
            plant_community: v("plant_community")?,
            canopy: v("canopy")?,
            understory: v("understory")?,
            forest_floor: v("forest_floor")?,
            stream_habitat: v("stream_habitat")?,
            lateral_connectivity: v("lateral_connectivity")?,
            longitudinal_connectivity: v("longitudinal_connectivity")?,
        })
    }
}

/// Forecast years must be whole numbers within `i32`
fn whole_year(value: f64) -> Result<i32, IndexError> {
    if !value.is_finite() {
        return Err(IndexError::NonFinite { field: YEAR_COL.to_string() });
    }
    let (min, max) = (i32::MIN as f64, i32::MAX as f64);
    if value.fract() != 0.0 || value < min || value > max {
        return Err(IndexError::OutOfBounds {
            field: YEAR_COL.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(value as i32)
}

fn cast_column(df: &DataFrame, name: &str, dtype: DataType) -> Result<Series> {
    df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .as_materialized_series()
        .cast(&dtype)
        .with_context(|| format!("Column '{}' cannot be read as {:?}", name, dtype))
}

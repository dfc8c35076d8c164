//! Reach Scorer - batch processor for habitat unit tables
//!
//! Maps each immutable input record (one reach / alternative / year) to an
//! output record carrying the UIM and REFI results, component areas and
//! habitat units. Records are independent: a failure is isolated to its row
//! and the batch always yields one outcome per input, in input order.
//! Includes both sequential and parallel (Rayon) execution.

use anyhow::{Context, Result};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::{IndexError, RecordError, RecordKey};
use crate::habitat_units::{aggregate, ComponentAreas, HabitatUnits, ReachExtents};
use crate::metrics::{calculate_refi, calculate_uim, RefiInputs, RefiResult, UimInputs, UimResult};

/// One row of the input dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub key: RecordKey,
    pub instream: UimInputs,
    pub riparian_left: RefiInputs,
    pub riparian_right: RefiInputs,
    pub extents: ReachExtents,
}

/// Scored counterpart of one `InputRecord`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub key: RecordKey,
    pub instream: UimResult,
    pub riparian_left: RefiResult,
    pub riparian_right: RefiResult,
    pub areas: ComponentAreas,
    pub habitat_units: HabitatUnits,
}

impl OutputRecord {
    pub fn instream_condition(&self) -> f64 {
        self.instream.total
    }

    pub fn riparian_left_condition(&self) -> f64 {
        self.riparian_left.total
    }

    pub fn riparian_right_condition(&self) -> f64 {
        self.riparian_right.total
    }
}

/// Output table of a batch run
///
/// Built once per run; holds one outcome per input row, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTable {
    outcomes: Vec<Result<OutputRecord, RecordError>>,
}

impl ScoredTable {
    pub fn outcomes(&self) -> &[Result<OutputRecord, RecordError>] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Successfully scored records, in input order
    pub fn records(&self) -> impl Iterator<Item = &OutputRecord> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    /// Failed rows, in input order
    pub fn failures(&self) -> impl Iterator<Item = &RecordError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Flatten scored records into a DataFrame (failed rows omitted)
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let records: Vec<&OutputRecord> = self.records().collect();
        let f = |get: fn(&OutputRecord) -> f64| -> Vec<f64> { records.iter().map(|r| get(r)).collect() };

        let df = df!(
            "ReachID" => records.iter().map(|r| r.key.reach_id.clone()).collect::<Vec<_>>(),
            "SiteAction" => records.iter().map(|r| r.key.alternative.clone()).collect::<Vec<_>>(),
            "Year" => records.iter().map(|r| r.key.year).collect::<Vec<_>>(),
            "uim_hydrology" => f(|r| r.instream.hydrology),
            "uim_geomorphology" => f(|r| r.instream.geomorphology),
            "uim_habitat" => f(|r| r.instream.habitat),
            "uim_connectivity" => f(|r| r.instream.connectivity),
            "left_refi_instream_process" => f(|r| r.riparian_left.instream_process),
            "left_refi_habitat" => f(|r| r.riparian_left.habitat),
            "left_refi_connectivity" => f(|r| r.riparian_left.connectivity),
            "right_refi_instream_process" => f(|r| r.riparian_right.instream_process),
            "right_refi_habitat" => f(|r| r.riparian_right.habitat),
            "right_refi_connectivity" => f(|r| r.riparian_right.connectivity),
            "riparian_left_condition" => f(|r| r.riparian_left.total),
            "riparian_right_condition" => f(|r| r.riparian_right.total),
            "instream_condition" => f(|r| r.instream.total),
            "riparian_left_acres" => f(|r| r.areas.riparian_left),
            "riparian_right_acres" => f(|r| r.areas.riparian_right),
            "instream_acres" => f(|r| r.areas.instream),
            "riparian_left_hu" => f(|r| r.habitat_units.riparian_left),
            "riparian_right_hu" => f(|r| r.habitat_units.riparian_right),
            "instream_hu" => f(|r| r.habitat_units.instream),
            "total_hu" => f(|r| r.habitat_units.total)
        )
        .with_context(|| "Failed to build output DataFrame")?;

        Ok(df)
    }

    /// Write scored records as CSV
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {:?}", path))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .with_context(|| format!("Failed to write output CSV: {:?}", path))?;

        tracing::info!("Wrote {} scored records to {:?}", df.height(), path);
        Ok(())
    }
}

/// Batch processor
pub struct ReachScorer {
    config: EngineConfig,
}

impl ReachScorer {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score a single record
    ///
    /// Pure: validates every field, then computes both indices, areas and HU.
    pub fn score_record(&self, record: &InputRecord) -> Result<OutputRecord, IndexError> {
        let riparian_left = calculate_refi(&record.riparian_left, &self.config.refi)
            .map_err(|e| prefix_field(e, "left_"))?;
        let riparian_right = calculate_refi(&record.riparian_right, &self.config.refi)
            .map_err(|e| prefix_field(e, "right_"))?;
        let instream = calculate_uim(&record.instream, &self.config.uim)?;

        let areas = record.extents.areas(self.config.riparian_area_unit)?;
        let habitat_units = aggregate(riparian_left.total, riparian_right.total, instream.total, &areas);

        tracing::debug!("{}: total HU {:.4}", record.key, habitat_units.total);

        Ok(OutputRecord {
            key: record.key.clone(),
            instream,
            riparian_left,
            riparian_right,
            areas,
            habitat_units,
        })
    }

    fn score_row(&self, row: usize, record: &InputRecord) -> Result<OutputRecord, RecordError> {
        self.score_record(record).map_err(|source| RecordError {
            row,
            key: Some(record.key.clone()),
            source,
        })
    }

    /// Score every record; one outcome per input, in input order
    pub fn score_batch(&self, records: &[InputRecord]) -> ScoredTable {
        let start = Instant::now();
        tracing::info!("Scoring {} records (parallel: {})", records.len(), self.config.parallel);

        let outcomes: Vec<_> = if self.config.parallel {
            records
                .par_iter()
                .enumerate()
                .map(|(row, record)| self.score_row(row, record))
                .collect()
        } else {
            records
                .iter()
                .enumerate()
                .map(|(row, record)| self.score_row(row, record))
                .collect()
        };

        finish(outcomes, start)
    }

    /// Score rows that may already have failed during ingestion
    ///
    /// Ingestion failures are passed through at their position.
    pub fn score_rows(&self, rows: Vec<Result<InputRecord, RecordError>>) -> ScoredTable {
        let start = Instant::now();
        tracing::info!("Scoring {} rows (parallel: {})", rows.len(), self.config.parallel);

        let score = |(row, input): (usize, Result<InputRecord, RecordError>)| {
            input.and_then(|record| self.score_row(row, &record))
        };

        let outcomes: Vec<_> = if self.config.parallel {
            rows.into_par_iter().enumerate().map(score).collect()
        } else {
            rows.into_iter().enumerate().map(score).collect()
        };

        finish(outcomes, start)
    }
}

fn prefix_field(err: IndexError, prefix: &str) -> IndexError {
    let rename = |field: String| format!("{}{}", prefix, field);
    match err {
        IndexError::OutOfBounds { field, value, min, max } => IndexError::OutOfBounds {
            field: rename(field),
            value,
            min,
            max,
        },
        IndexError::NonPositiveReference { field, value } => {
            IndexError::NonPositiveReference { field: rename(field), value }
        }
        IndexError::NegativeArea { field, value } => IndexError::NegativeArea { field: rename(field), value },
        IndexError::NonFinite { field } => IndexError::NonFinite { field: rename(field) },
        IndexError::MissingField { field } => IndexError::MissingField { field: rename(field) },
        other => other,
    }
}

fn finish(outcomes: Vec<Result<OutputRecord, RecordError>>, start: Instant) -> ScoredTable {
    let table = ScoredTable { outcomes };

    for failure in table.failures() {
        tracing::warn!("Record failed: {}", failure);
    }
    tracing::info!(
        "Scored {} records ({} failed) in {:?}",
        table.len(),
        table.failure_count(),
        start.elapsed()
    );

    table
}

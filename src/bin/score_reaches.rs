//! Score a reach input table and write habitat units
//!
//! Usage:
//!   cargo run --features cli --bin score_reaches -- reaches.csv
//!
//! Environment:
//!   INPUT_PATH            input table when no argument is given
//!   OUTPUT_PATH           output CSV (default: habitat_units.csv)
//!   INDEX_CONFIG          optional JSON overriding weights and bounds
//!   BASELINE_ALTERNATIVE  alternative used for net AAHU comparison

use anyhow::Context;
use reach_scorer_rust::{compare_alternatives, load_records, summarize, EngineConfig, ReachScorer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reach_scorer_rust=info,score_reaches=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let input_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("INPUT_PATH").ok())
        .map(PathBuf::from)
        .context("No input table given (argument or INPUT_PATH)")?;

    let output_path = PathBuf::from(
        std::env::var("OUTPUT_PATH").unwrap_or_else(|_| "habitat_units.csv".to_string()),
    );

    let config = match std::env::var("INDEX_CONFIG") {
        Ok(path) => EngineConfig::load(&PathBuf::from(path))?,
        Err(_) => EngineConfig::default(),
    };

    tracing::info!("Configuration:");
    tracing::info!("  INPUT_PATH: {:?}", input_path);
    tracing::info!("  OUTPUT_PATH: {:?}", output_path);
    tracing::info!("  Riparian area unit: {:?}", config.riparian_area_unit);

    let scorer = ReachScorer::new(config)?;
    let rows = load_records(&input_path)?;
    let table = scorer.score_rows(rows);

    table.write_csv(&output_path)?;

    let summaries = summarize(&table);
    for s in &summaries {
        tracing::info!(
            "{} year {}: {} reaches, {:.3} HU",
            s.alternative,
            s.year,
            s.reaches,
            s.habitat_units.total
        );
    }

    if let Ok(baseline) = std::env::var("BASELINE_ALTERNATIVE") {
        for c in compare_alternatives(&summaries, &baseline)? {
            tracing::info!("{}: AAHU {:.3} (net {:+.3})", c.alternative, c.aahu, c.net_aahu);
        }
    }

    if table.failure_count() > 0 {
        tracing::warn!("{} of {} rows failed", table.failure_count(), table.len());
    }

    Ok(())
}

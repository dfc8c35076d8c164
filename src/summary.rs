//! Alternative and time-horizon summaries
//!
//! Rolls per-reach habitat units up to one row per (alternative, year) and
//! annualizes each alternative over its forecast years (average annual habitat
//! units, AAHU) so restoration alternatives can be compared on one number.

use anyhow::{bail, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::habitat_units::HabitatUnits;
use crate::scorer::ScoredTable;

/// Habitat units summed over reaches for one alternative and year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeYearSummary {
    pub alternative: String,
    pub year: i32,
    pub reaches: usize,
    pub habitat_units: HabitatUnits,
}

/// AAHU of one alternative and its change against the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeComparison {
    pub alternative: String,
    pub aahu: f64,
    pub net_aahu: f64,
}

/// Sum scored records by (alternative, year), sorted by alternative then year
pub fn summarize(table: &ScoredTable) -> Vec<AlternativeYearSummary> {
    let mut groups: FxHashMap<(&str, i32), (usize, HabitatUnits)> = FxHashMap::default();

    for record in table.records() {
        let entry = groups
            .entry((record.key.alternative.as_str(), record.key.year))
            .or_insert((0, HabitatUnits::default()));
        let hu = &record.habitat_units;
        entry.0 += 1;
        entry.1 = HabitatUnits::new(
            entry.1.riparian_left + hu.riparian_left,
            entry.1.riparian_right + hu.riparian_right,
            entry.1.instream + hu.instream,
        );
    }

    let mut summaries: Vec<AlternativeYearSummary> = groups
        .into_iter()
        .map(|((alternative, year), (reaches, habitat_units))| AlternativeYearSummary {
            alternative: alternative.to_string(),
            year,
            reaches,
            habitat_units,
        })
        .collect();

    summaries.sort_by(|a, b| a.alternative.cmp(&b.alternative).then(a.year.cmp(&b.year)));
    summaries
}

/// Average annual habitat units of one alternative
///
/// Trapezoidal integration of total HU between consecutive forecast years,
/// divided by the span from first to last year. A single year returns that
/// year's total.
pub fn average_annual_habitat_units(summaries: &[AlternativeYearSummary], alternative: &str) -> Result<f64> {
    let mut points: Vec<(i32, f64)> = summaries
        .iter()
        .filter(|s| s.alternative == alternative)
        .map(|s| (s.year, s.habitat_units.total))
        .collect();

    if points.is_empty() {
        bail!("No scored years for alternative '{}'", alternative);
    }
    points.sort_by_key(|&(year, _)| year);

    if let Some(pair) = points.windows(2).find(|w| w[0].0 == w[1].0) {
        bail!("Alternative '{}' has duplicate year {}", alternative, pair[0].0);
    }

    let (first, last) = (points[0].0, points[points.len() - 1].0);
    if first == last {
        return Ok(points[0].1);
    }

    let area: f64 = points
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) as f64 * (w[0].1 + w[1].1) / 2.0)
        .sum();

    Ok(area / (last - first) as f64)
}

/// AAHU for every alternative, with net change against `baseline`
pub fn compare_alternatives(
    summaries: &[AlternativeYearSummary],
    baseline: &str,
) -> Result<Vec<AlternativeComparison>> {
    let baseline_aahu = average_annual_habitat_units(summaries, baseline)?;

    let mut alternatives: Vec<&str> = summaries.iter().map(|s| s.alternative.as_str()).collect();
    alternatives.sort_unstable();
    alternatives.dedup();

    alternatives
        .into_iter()
        .map(|alternative| {
            let aahu = average_annual_habitat_units(summaries, alternative)?;
            Ok(AlternativeComparison {
                alternative: alternative.to_string(),
                aahu,
                net_aahu: aahu - baseline_aahu,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::scorer::tests::sample_record;
    use crate::scorer::ReachScorer;
    use approx::assert_abs_diff_eq;

    fn summary(alternative: &str, year: i32, total: f64) -> AlternativeYearSummary {
        AlternativeYearSummary {
            alternative: alternative.to_string(),
            year,
            reaches: 1,
            habitat_units: HabitatUnits::new(0.0, 0.0, total),
        }
    }

    #[test]
    fn test_summarize_groups_and_sorts() {
        let mut degraded = sample_record("R2", "NoAction", 0);
        degraded.riparian_left.canopy = 0.0;

        let records = vec![
            sample_record("R1", "Restore", 10),
            sample_record("R1", "NoAction", 0),
            degraded,
            sample_record("R1", "Restore", 0),
        ];
        let scorer = ReachScorer::new(EngineConfig::default()).unwrap();
        let table = scorer.score_batch(&records);
        let summaries = summarize(&table);

        let keys: Vec<(&str, i32, usize)> = summaries
            .iter()
            .map(|s| (s.alternative.as_str(), s.year, s.reaches))
            .collect();
        assert_eq!(keys, vec![("NoAction", 0, 2), ("Restore", 0, 1), ("Restore", 10, 1)]);

        let expected: f64 = table
            .records()
            .filter(|r| r.key.alternative == "NoAction")
            .map(|r| r.habitat_units.total)
            .sum();
        assert_abs_diff_eq!(summaries[0].habitat_units.total, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_aahu_trapezoid() {
        let summaries = vec![
            summary("Alt1", 0, 10.0),
            summary("Alt1", 2, 12.0),
            summary("Alt1", 10, 20.0),
            summary("Alt1", 50, 20.0),
        ];
        // (2×11 + 8×16 + 40×20) / 50
        let aahu = average_annual_habitat_units(&summaries, "Alt1").unwrap();
        assert_abs_diff_eq!(aahu, 19.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aahu_single_year_and_unknown() {
        let summaries = vec![summary("Alt1", 0, 7.5)];
        assert_eq!(average_annual_habitat_units(&summaries, "Alt1").unwrap(), 7.5);
        assert!(average_annual_habitat_units(&summaries, "Alt9").is_err());
    }

    #[test]
    fn test_compare_alternatives_against_baseline() {
        let summaries = vec![
            summary("NoAction", 0, 10.0),
            summary("NoAction", 50, 10.0),
            summary("Restore", 0, 10.0),
            summary("Restore", 50, 30.0),
        ];

        let comparisons = compare_alternatives(&summaries, "NoAction").unwrap();
        assert_eq!(comparisons.len(), 2);
        assert_eq!(comparisons[0].alternative, "NoAction");
        assert_eq!(comparisons[0].net_aahu, 0.0);
        assert_abs_diff_eq!(comparisons[1].aahu, 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(comparisons[1].net_aahu, 10.0, epsilon = 1e-12);

        assert!(compare_alternatives(&summaries, "Missing").is_err());
    }
}

//! Batch Integration Tests
//!
//! Runs the full pipeline: CSV input table → typed records → batch scoring →
//! output CSV → alternative summaries.

use approx::assert_abs_diff_eq;
use reach_scorer_rust::data::required_columns;
use reach_scorer_rust::{
    compare_alternatives, load_records, summarize, EngineConfig, IndexError, ReachScorer,
};
use std::fs;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("reach_scorer_{}_{}", std::process::id(), name))
}

/// Value for one column of a reach row; `quality` scales the rubric scores
fn cell(column: &str, reach: &str, alternative: &str, year: i32, quality: f64) -> String {
    match column {
        "ReachID" => reach.to_string(),
        "SiteAction" => alternative.to_string(),
        "Year" => year.to_string(),
        "bankfull_velocity" => "4.5".to_string(),
        "ref_bankfull_velocity" => "4".to_string(),
        "bankfull_area" => "60".to_string(),
        "ref_bankfull_area" => "50".to_string(),
        "passage_rate" => format!("{}", quality),
        "reach_length_ft" => "1000".to_string(),
        "reach_top_width_ft" => "43.56".to_string(),
        "left_riparian_area" => "2".to_string(),
        "right_riparian_area" => "3".to_string(),
        c if c.starts_with("left_") || c.starts_with("right_") => format!("{}", 15.0 * quality),
        _ => format!("{}", 20.0 * quality),
    }
}

fn write_input(path: &PathBuf, rows: &[(&str, &str, i32, f64)]) {
    write_input_with(path, rows, &[]);
}

/// Like `write_input`, with raw text replacing (row, column) cells
fn write_input_with(path: &PathBuf, rows: &[(&str, &str, i32, f64)], overrides: &[(usize, &str, &str)]) {
    let columns = required_columns();
    let mut text = columns.join(",");
    text.push('\n');
    for (i, (reach, alternative, year, quality)) in rows.iter().enumerate() {
        let line: Vec<String> = columns
            .iter()
            .map(|c| match overrides.iter().find(|(row, column, _)| *row == i && column == c) {
                Some((_, _, raw)) => raw.to_string(),
                None => cell(c, reach, alternative, *year, *quality),
            })
            .collect();
        text.push_str(&line.join(","));
        text.push('\n');
    }
    fs::write(path, text).unwrap();
}

#[test]
fn test_csv_pipeline_end_to_end() {
    let input = temp_path("input.csv");
    let output = temp_path("output.csv");

    write_input(
        &input,
        &[
            ("R1", "NoAction", 0, 0.5),
            ("R1", "NoAction", 50, 0.5),
            ("R1", "Restore", 0, 0.5),
            ("R1", "Restore", 50, 1.0),
        ],
    );

    let rows = load_records(&input).unwrap();
    assert_eq!(rows.len(), 4);

    let scorer = ReachScorer::new(EngineConfig::default()).unwrap();
    let table = scorer.score_rows(rows);
    assert_eq!(table.failure_count(), 0);

    // Order and identity preserved
    let keys: Vec<(String, i32)> = table
        .records()
        .map(|r| (r.key.alternative.clone(), r.key.year))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("NoAction".to_string(), 0),
            ("NoAction".to_string(), 50),
            ("Restore".to_string(), 0),
            ("Restore".to_string(), 50),
        ]
    );

    for record in table.records() {
        let hu = &record.habitat_units;
        assert_abs_diff_eq!(hu.total, hu.riparian_left + hu.riparian_right + hu.instream, epsilon = 1e-12);
        assert_abs_diff_eq!(record.areas.instream, 1.0, epsilon = 1e-9);
        for v in [
            record.instream.total,
            record.riparian_left.total,
            record.riparian_right.total,
        ] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    // Best-condition riparian scores are 1; velocity 4.5 vs 4 gives 0.875, area 60 vs 50 gives 0.8
    let best = table.records().last().unwrap();
    assert_abs_diff_eq!(best.riparian_left.total, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(best.instream.hydrology, (1.0 + 0.875 + 0.8) / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(best.habitat_units.riparian_right, 3.0, epsilon = 1e-12);

    let summaries = summarize(&table);
    assert_eq!(summaries.len(), 4);
    let comparisons = compare_alternatives(&summaries, "NoAction").unwrap();
    assert_eq!(comparisons.len(), 2);
    assert!(comparisons[1].net_aahu > 0.0);

    table.write_csv(&output).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    let mut lines = written.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("ReachID,SiteAction,Year"));
    assert!(header.ends_with("total_hu"));
    assert_eq!(lines.count(), 4);

    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&output);
}

#[test]
fn test_bad_rows_are_reported_not_fatal() {
    let input = temp_path("bad_rows.csv");
    write_input(
        &input,
        &[
            ("R1", "Alt1", 2, 0.5),
            ("R2", "Alt1", 2, 1.2), // rubric scores above their maximum
            ("R3", "Alt1", 2, 0.25),
        ],
    );

    let rows = load_records(&input).unwrap();
    let table = ReachScorer::new(EngineConfig::default()).unwrap().score_rows(rows);

    assert_eq!(table.len(), 3);
    assert_eq!(table.failure_count(), 1);

    let failure = table.failures().next().unwrap();
    assert_eq!(failure.row, 1);
    assert_eq!(failure.key.as_ref().unwrap().reach_id, "R2");
    assert!(matches!(failure.source, IndexError::OutOfBounds { .. }));

    let _ = fs::remove_file(&input);
}

#[test]
fn test_rerun_is_identical() {
    let input = temp_path("rerun.csv");
    write_input(&input, &[("R1", "Alt1", 0, 0.3), ("R2", "Alt2", 10, 0.9)]);

    let scorer = ReachScorer::new(EngineConfig::default()).unwrap();
    let first = scorer.score_rows(load_records(&input).unwrap());
    let second = scorer.score_rows(load_records(&input).unwrap());
    assert_eq!(first, second);

    let _ = fs::remove_file(&input);
}

#[test]
fn test_numeric_looking_reach_ids_round_trip() {
    let input = temp_path("numeric_ids.csv");
    let output = temp_path("numeric_ids_out.csv");
    write_input(
        &input,
        &[("007", "1", 0, 0.5), ("7", "1", 0, 0.5), ("0012", "02", 10, 0.5)],
    );

    let table = ReachScorer::new(EngineConfig::default())
        .unwrap()
        .score_rows(load_records(&input).unwrap());
    assert_eq!(table.failure_count(), 0);

    let keys: Vec<(&str, &str)> = table
        .records()
        .map(|r| (r.key.reach_id.as_str(), r.key.alternative.as_str()))
        .collect();
    assert_eq!(keys, vec![("007", "1"), ("7", "1"), ("0012", "02")]);

    // "007" and "7" stay distinct reaches in the alternative roll-up
    let summaries = summarize(&table);
    let alt_one = summaries.iter().find(|s| s.alternative == "1").unwrap();
    assert_eq!(alt_one.reaches, 2);

    table.write_csv(&output).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    let first_ids: Vec<&str> = written
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(first_ids, vec!["007", "7", "0012"]);

    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&output);
}

#[test]
fn test_long_table_with_late_irregular_cells() {
    let input = temp_path("long_table.csv");
    let reaches: Vec<String> = (0..160).map(|i| format!("R{}", i)).collect();
    let rows: Vec<(&str, &str, i32, f64)> = reaches
        .iter()
        .map(|reach| (reach.as_str(), "Alt1", 10, 0.5))
        .collect();

    // bhr_score reads "10" on every row but one; its only decimal is at row 140
    write_input_with(
        &input,
        &rows,
        &[(140, "bhr_score", "12.5"), (150, "substrate", "n/a"), (155, "bankfull_area", "")],
    );

    let loaded = load_records(&input).unwrap();
    assert_eq!(loaded.len(), 160);

    let table = ReachScorer::new(EngineConfig::default()).unwrap().score_rows(loaded);
    assert_eq!(table.len(), 160);
    assert_eq!(table.failure_count(), 2);

    let failures: Vec<_> = table.failures().collect();
    assert_eq!(failures[0].row, 150);
    assert_eq!(failures[0].key.as_ref().unwrap().reach_id, "R150");
    assert_eq!(failures[0].source, IndexError::MissingField { field: "substrate".to_string() });
    assert_eq!(failures[1].row, 155);
    assert_eq!(failures[1].source.field(), "bankfull_area");

    let late = table.records().find(|r| r.key.reach_id == "R140").unwrap();
    let typical = table.records().find(|r| r.key.reach_id == "R0").unwrap();
    assert!(late.instream.hydrology > typical.instream.hydrology);

    let _ = fs::remove_file(&input);
}

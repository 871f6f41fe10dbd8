//! End-to-end pipeline: clade listing -> selection -> colors, traces
//! and binning, the way the presentation layer drives the core.

use btb_tracekit::{
    binning, clades, colors, movement, selection::select, Bounds, GridShape, Selection,
};
use polars::prelude::*;

fn samples() -> DataFrame {
    DataFrame::new(vec![
        Column::new("sample_id".into(), &["s1", "s2", "s3", "s4", "s5"]),
        Column::new("Animal_ID".into(), &["a1", "a2", "a3", "a4", "a5"]),
        Column::new("HERD_NO".into(), &["H1", "H1", "H2", "H3", "H2"]),
        Column::new(
            "Species".into(),
            &["Bovine", "Bovine", "Badger", "Bovine", "Bovine"],
        ),
        Column::new("County".into(), &["Clare", "Clare", "Cork", "Sligo", "Cork"]),
        Column::new(
            "X_COORD".into(),
            &[Some(0.0), Some(1.0), Some(40.0), None, Some(42.0)],
        ),
        Column::new(
            "Y_COORD".into(),
            &[Some(0.0), Some(1.0), Some(40.0), None, Some(41.0)],
        ),
        Column::new("snp3".into(), &["A", "A", "B", "-1", "B"]),
    ])
    .unwrap()
}

fn movements() -> DataFrame {
    DataFrame::new(vec![
        Column::new("tag".into(), &["a1", "a1", "a3"]),
        Column::new("move_from".into(), &["H9", "H2", "H1"]),
        Column::new("move_to".into(), &["H2", "H1", "H9"]),
        Column::new(
            "move_date".into(),
            &["2019-06-01", "2019-09-01", "2020-01-01"],
        ),
    ])
    .unwrap()
}

fn centroids() -> DataFrame {
    DataFrame::new(vec![
        Column::new("SPH_HERD_N".into(), &["H1", "H2"]),
        Column::new("X_COORD".into(), &[0.5, 41.0]),
        Column::new("Y_COORD".into(), &[0.5, 40.5]),
    ])
    .unwrap()
}

#[test]
fn clade_counts_drive_the_selection_list() {
    let samples = samples();
    let counts = clades::counts_by_level(&samples, "snp3", false).unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["A"], 2);
    assert_eq!(counts["B"], 2);

    let members = clades::cluster_members(&samples, "snp3", 2).unwrap();
    assert_eq!(members, vec!["A", "B"]);
}

#[test]
fn clade_selection_to_colors_and_traces() {
    let samples = samples();
    let sub = select(
        &samples,
        &Selection::Clades {
            level: "snp3".into(),
            labels: vec!["A".into(), "B".into()],
        },
    )
    .unwrap();
    assert_eq!(sub.len(), 4);
    assert_eq!(sub.title(), "snp3=A,B n=4");

    // Colors: same legend regardless of which rows were selected.
    let (per_row, legend) = colors::column_colors(sub.frame(), "snp3", 42).unwrap();
    assert_eq!(per_row.len(), 4);
    let (_, legend_all) = colors::column_colors(&samples, "snp3", 42).unwrap();
    assert_eq!(legend, legend_all);

    // Traces: a1 has two resolvable moves plus its current herd H1;
    // a3's only move goes to an unresolvable herd, leaving H2 alone.
    let traces = movement::resolve(&sub, &movements(), &centroids()).unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces["a1"].len(), 2);
}

#[test]
fn region_selection_to_binning() {
    let samples = samples();
    let sub = select(&samples, &Selection::Region(Bounds::new(0.0, 0.0, 50.0, 50.0))).unwrap();
    // s4 has no coordinates and stays out even though the box is huge.
    assert_eq!(sub.len(), 4);

    let (grid, dominant) = binning::bin_by_category(&sub, "snp3", 5, GridShape::Hex, None).unwrap();
    assert!(!grid.is_empty());
    assert!(!dominant.is_empty());
    // Every dominant value is a real clade label, never the sentinel.
    for value in dominant.values() {
        assert!(value == "A" || value == "B");
    }

    // Capping to one category leaves only the alphabetically first of
    // the tied labels in the grid.
    let (_, capped) = binning::bin_by_category(&sub, "snp3", 5, GridShape::Hex, Some(1)).unwrap();
    assert!(!capped.is_empty());
    for value in capped.values() {
        assert_eq!(value, "A");
    }
}

#[test]
fn empty_selection_flows_through_every_stage() {
    let samples = samples();
    let sub = select(
        &samples,
        &Selection::Clades {
            level: "snp3".into(),
            labels: vec![],
        },
    )
    .unwrap();
    assert!(sub.is_empty());

    let traces = movement::resolve(&sub, &movements(), &centroids()).unwrap();
    assert!(traces.is_empty());

    let (grid, dominant) =
        binning::bin_by_category(&sub, "snp3", 5, GridShape::Square, None).unwrap();
    assert!(grid.is_empty());
    assert!(dominant.is_empty());

    let (per_row, legend) = colors::column_colors(sub.frame(), "snp3", 0).unwrap();
    assert!(per_row.is_empty());
    assert!(legend.is_empty());
}

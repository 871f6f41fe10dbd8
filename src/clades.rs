//! Clade index: per-level groupings of samples into genomic clusters,
//! with counts, for populating selection lists.
//!
//! These are pure functions of (samples, level); nothing is cached, so
//! callers re-invoke after a level change or a dataset reload.

use std::collections::BTreeMap;

use polars::prelude::*;

use crate::error::{BtbError, Result};
use crate::schema::clade;

/// True for labels that mean "not in any cluster at this level".
pub fn is_unclustered(label: &str) -> bool {
    label.is_empty() || label == clade::UNCLUSTERED
}

/// Count samples per clade label at the given level.
///
/// Null and sentinel labels are excluded unless `include_unclustered` is
/// set, in which case both count under the sentinel key so the totals add
/// up to the row count. A missing level column is fatal: it signals a
/// loading problem, not an empty clustering.
pub fn counts_by_level(
    samples: &DataFrame,
    level: &str,
    include_unclustered: bool,
) -> Result<BTreeMap<String, u32>> {
    let labels = samples
        .column(level)
        .map_err(|_| BtbError::MissingColumn(level.to_string()))?
        .str()?;

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for label in labels.into_iter() {
        // A null label means the same as the sentinel: not clustered here.
        let label = label.unwrap_or(clade::UNCLUSTERED);
        if is_unclustered(label) {
            if !include_unclustered {
                continue;
            }
            *counts.entry(clade::UNCLUSTERED.to_string()).or_insert(0) += 1;
        } else {
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Clade labels with at least `min_size` members, largest cluster first.
/// Equal-sized clusters are ordered by label so the list is stable across
/// calls and row orderings.
pub fn cluster_members(samples: &DataFrame, level: &str, min_size: u32) -> Result<Vec<String>> {
    let counts = counts_by_level(samples, level, false)?;
    let mut members: Vec<(String, u32)> = counts
        .into_iter()
        .filter(|(_, n)| *n >= min_size)
        .collect();
    // BTreeMap iteration is label-ascending already, so a stable sort by
    // descending count gives the tie-break for free.
    members.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(members.into_iter().map(|(label, _)| label).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> DataFrame {
        DataFrame::new(vec![Column::new(
            "snp3".into(),
            &["A", "A", "B", "-1", "B"],
        )])
        .unwrap()
    }

    #[test]
    fn counts_exclude_sentinel() {
        let counts = counts_by_level(&samples(), "snp3", false).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["B"], 2);
    }

    #[test]
    fn counts_can_include_sentinel() {
        let counts = counts_by_level(&samples(), "snp3", true).unwrap();
        assert_eq!(counts["-1"], 1);
        let total: u32 = counts.values().sum();
        assert_eq!(total as usize, samples().height());
    }

    #[test]
    fn null_labels_count_as_unclustered() {
        // Unnormalized input: nulls and the sentinel both land under "-1"
        // when included, so the counts still sum to the row count.
        let df = DataFrame::new(vec![Column::new(
            "snp3".into(),
            &[Some("A"), None, Some("-1"), Some("A"), None],
        )])
        .unwrap();

        let counts = counts_by_level(&df, "snp3", true).unwrap();
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["-1"], 3);
        let total: u32 = counts.values().sum();
        assert_eq!(total as usize, df.height());

        let counts = counts_by_level(&df, "snp3", false).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["A"], 2);
    }

    #[test]
    fn members_tie_break_is_alphabetical() {
        let members = cluster_members(&samples(), "snp3", 2).unwrap();
        assert_eq!(members, vec!["A", "B"]);
    }

    #[test]
    fn min_size_filters_small_clusters() {
        let df = DataFrame::new(vec![Column::new(
            "snp12".into(),
            &["X", "X", "X", "Y", "Y", "Z"],
        )])
        .unwrap();
        let members = cluster_members(&df, "snp12", 2).unwrap();
        assert_eq!(members, vec!["X", "Y"]);
    }

    #[test]
    fn missing_level_column_is_fatal() {
        let err = counts_by_level(&samples(), "snp500", false).unwrap_err();
        assert!(matches!(err, BtbError::MissingColumn(_)));
    }
}

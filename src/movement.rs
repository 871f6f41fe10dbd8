//! Movement trace reconstruction: join the selected animals against
//! their recorded relocations, resolve destination herds to parcel
//! centroids, and build the ordered line segments a map view draws.

use std::collections::{BTreeMap, HashSet};

use geo::{Line, Point};
use polars::prelude::*;

use crate::error::{require_columns, Result};
use crate::schema::{movement, parcel, sample};
use crate::selection::SelectionSubset;

/// Waypoint table for a subset: one row per resolvable waypoint, sorted
/// by animal then event date, with the animal's own herd centroid
/// appended as a terminal waypoint (null date, so it sorts last).
///
/// Movements whose destination herd has no parcel centroid are dropped,
/// as are animals outside the subset. An empty result is valid.
pub fn join_moves(
    subset: &SelectionSubset,
    movements: &DataFrame,
    centroids: &DataFrame,
) -> Result<DataFrame> {
    require_columns(subset.frame(), &[sample::ANIMAL_ID, sample::HERD_NO])?;
    require_columns(
        movements,
        &[movement::TAG, movement::MOVE_TO, movement::MOVE_DATE],
    )?;
    require_columns(centroids, &[parcel::HERD_NO, parcel::X_COORD, parcel::Y_COORD])?;

    let animals = animal_herds(subset)?;
    let date_dtype = movements.column(movement::MOVE_DATE)?.dtype().clone();

    let centroid_cols = centroids
        .clone()
        .lazy()
        .select([col(parcel::HERD_NO), col(parcel::X_COORD), col(parcel::Y_COORD)]);

    let output = [
        col(sample::ANIMAL_ID),
        col(sample::HERD_NO),
        col(movement::MOVE_TO),
        col(movement::MOVE_DATE),
        col(parcel::X_COORD),
        col(parcel::Y_COORD),
    ];

    // Recorded relocations, destination herd resolved to its centroid.
    let moved = animals
        .clone()
        .lazy()
        .join(
            movements
                .clone()
                .lazy()
                .select([col(movement::TAG), col(movement::MOVE_TO), col(movement::MOVE_DATE)]),
            [col(sample::ANIMAL_ID)],
            [col(movement::TAG)],
            // Order matters downstream: the date sort is stable, so rows
            // joined here must come out in movements-table order for
            // same-date events to keep their recorded sequence.
            JoinArgs { maintain_order: MaintainOrderJoin::LeftRight, ..JoinArgs::new(JoinType::Inner) },
        )
        .join(
            centroid_cols.clone(),
            [col(movement::MOVE_TO)],
            [col(parcel::HERD_NO)],
            JoinArgs { maintain_order: MaintainOrderJoin::Left, ..JoinArgs::new(JoinType::Left) },
        )
        .select(output.clone())
        .collect()?;

    // Synthetic terminal waypoint: the animal's current herd, when that
    // herd has a resolvable centroid.
    let terminals = animals
        .lazy()
        .join(
            centroid_cols,
            [col(sample::HERD_NO)],
            [col(parcel::HERD_NO)],
            JoinArgs { maintain_order: MaintainOrderJoin::Left, ..JoinArgs::new(JoinType::Inner) },
        )
        .with_columns([
            col(sample::HERD_NO).alias(movement::MOVE_TO),
            lit(NULL).cast(date_dtype).alias(movement::MOVE_DATE),
        ])
        .select(output)
        .collect()?;

    let mut joined = moved;
    joined.vstack_mut(&terminals)?;

    let sorted = joined
        .lazy()
        .filter(
            col(parcel::X_COORD)
                .is_not_null()
                .and(col(parcel::Y_COORD).is_not_null()),
        )
        .sort(
            [sample::ANIMAL_ID, movement::MOVE_DATE],
            SortMultipleOptions::default()
                .with_maintain_order(true)
                .with_nulls_last(true),
        )
        .collect()?;

    log::debug!(
        "resolved {} waypoints for {} subset animals",
        sorted.height(),
        subset.len()
    );
    Ok(sorted)
}

/// Ordered line segments per animal: n resolvable waypoints give n-1
/// segments. Animals with fewer than two waypoints (including animals
/// with no movement history at all) are omitted from the map.
pub fn resolve(
    subset: &SelectionSubset,
    movements: &DataFrame,
    centroids: &DataFrame,
) -> Result<BTreeMap<String, Vec<Line<f64>>>> {
    let waypoints = join_moves(subset, movements, centroids)?;

    let animal = waypoints.column(sample::ANIMAL_ID)?.str()?;
    let xs = waypoints.column(parcel::X_COORD)?.f64()?;
    let ys = waypoints.column(parcel::Y_COORD)?.f64()?;

    // Rows are sorted by animal, so consecutive runs share a tag.
    let mut positions: BTreeMap<String, Vec<Point<f64>>> = BTreeMap::new();
    for i in 0..waypoints.height() {
        let (Some(tag), Some(x), Some(y)) = (animal.get(i), xs.get(i), ys.get(i)) else {
            continue;
        };
        positions
            .entry(tag.to_string())
            .or_default()
            .push(Point::new(x, y));
    }

    let traces = positions
        .into_iter()
        .filter(|(_, pts)| pts.len() >= 2)
        .map(|(tag, pts)| {
            let segments = pts
                .windows(2)
                .map(|pair| Line::new(pair[0].0, pair[1].0))
                .collect();
            (tag, segments)
        })
        .collect();
    Ok(traces)
}

/// Distinct (animal, current herd) pairs from the subset; a duplicate
/// animal keeps its first herd so the terminal waypoint is unique.
fn animal_herds(subset: &SelectionSubset) -> Result<DataFrame> {
    let animal = subset.frame().column(sample::ANIMAL_ID)?.str()?;
    let herd = subset.frame().column(sample::HERD_NO)?.str()?;

    let mut seen = HashSet::new();
    let mut animals = Vec::new();
    let mut herds = Vec::new();
    for (tag, herd_no) in animal.into_iter().zip(herd) {
        let (Some(tag), Some(herd_no)) = (tag, herd_no) else {
            continue;
        };
        if seen.insert(tag) {
            animals.push(tag);
            herds.push(herd_no);
        }
    }

    Ok(DataFrame::new(vec![
        Column::new(sample::ANIMAL_ID.into(), animals),
        Column::new(sample::HERD_NO.into(), herds),
    ])?)
}

//! Deterministic category → color assignment, shared by the scatter
//! view, table cells, grid cells and legends so a clade never changes
//! color between views.

use std::collections::BTreeMap;

use polars::prelude::*;

use crate::clades::is_unclustered;
use crate::error::{BtbError, Result};

/// Qualitative palette (matplotlib tab20). Categories beyond the palette
/// wrap around: slot = (sorted rank + seed offset) mod palette length.
pub const PALETTE: [&str; 20] = [
    "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728",
    "#ff9896", "#9467bd", "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2",
    "#7f7f7f", "#c7c7c7", "#bcbd22", "#dbdb8d", "#17becf", "#9edae5",
];

/// Neutral color for unclustered / missing category values.
pub const NEUTRAL: &str = "#999999";

/// Assign a color to each value, plus the category → color legend map.
///
/// Deterministic in the distinct value set and the seed: distinct
/// categories are sorted before palette slots are handed out, so row
/// order never changes the mapping. Sentinel and null values get the
/// neutral gray and no palette slot.
pub fn assign<'a, I>(values: I, seed: u64) -> (Vec<String>, BTreeMap<String, String>)
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let values: Vec<Option<&str>> = values.into_iter().collect();

    let mut distinct: Vec<&str> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !is_unclustered(v))
        .collect();
    distinct.sort_unstable();
    distinct.dedup();

    let offset = splitmix64(seed) as usize % PALETTE.len();
    let lookup: BTreeMap<String, String> = distinct
        .iter()
        .enumerate()
        .map(|(i, v)| (v.to_string(), PALETTE[(i + offset) % PALETTE.len()].to_string()))
        .collect();

    let per_row = values
        .iter()
        .map(|v| match v {
            Some(v) if !is_unclustered(v) => lookup[*v].clone(),
            _ => NEUTRAL.to_string(),
        })
        .collect();

    (per_row, lookup)
}

/// [`assign`] over a string column of a DataFrame.
pub fn column_colors(
    df: &DataFrame,
    column: &str,
    seed: u64,
) -> Result<(Vec<String>, BTreeMap<String, String>)> {
    let values = df
        .column(column)
        .map_err(|_| BtbError::MissingColumn(column.to_string()))?
        .str()?;
    Ok(assign(values.into_iter(), seed))
}

/// A reproducible sequence of `n` arbitrary colors, used for per-animal
/// movement trace lines where categories are transient.
pub fn random_colors(n: usize, seed: u64) -> Vec<String> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_add(0x9e3779b97f4a7c15);
            let v = splitmix64(state);
            // Keep channels out of the near-white range so lines stay
            // visible on a light basemap.
            let r = (v >> 16 & 0xff) as u8 % 200;
            let g = (v >> 8 & 0xff) as u8 % 200;
            let b = (v & 0xff) as u8 % 200;
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        })
        .collect()
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

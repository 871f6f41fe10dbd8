//! Grid binning for dense cluster views: overlay a hex or square grid
//! on the selected points and color each cell by its dominant category
//! instead of drawing every marker.

use std::collections::BTreeMap;

use geo::{polygon, Intersects, Point, Polygon};

use crate::clades::is_unclustered;
use crate::error::Result;
use crate::geom::Bounds;
use crate::selection::SelectionSubset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridShape {
    Hex,
    Square,
}

/// One grid cell; `id` is its position in the grid vector and the key
/// used by [`assign_dominant`].
#[derive(Debug, Clone)]
pub struct GridCell {
    pub id: usize,
    pub polygon: Polygon<f64>,
}

/// Tile the bounding box with roughly `n_cells` cells across its width.
///
/// Hex cells are flat-topped, laid out in offset rows; square cells are
/// a plain raster. Both tilings overshoot the bounds by up to one cell
/// so edge points always land in a cell.
pub fn create_grid(bounds: Bounds, n_cells: usize, shape: GridShape) -> Vec<GridCell> {
    match shape {
        GridShape::Hex => hex_grid(bounds, n_cells),
        GridShape::Square => square_grid(bounds, n_cells),
    }
}

fn hex_grid(bounds: Bounds, n_cells: usize) -> Vec<GridCell> {
    let unit = cell_size(&bounds, n_cells);
    let a = (std::f64::consts::PI / 3.0).sin();

    let mut cells = Vec::new();
    let mut id = 0;
    // Column pitch is 3 units; odd rows shift right by 1.5 units. Start
    // one pitch early so the shifted rows still cover the left edge.
    let mut x = bounds.xmin - 3.0 * unit;
    while x <= bounds.xmax + unit {
        let mut row = 0usize;
        let mut y = bounds.ymin / a - unit;
        while y * a <= bounds.ymax + unit {
            let x0 = if row % 2 == 0 { x } else { x + 1.5 * unit };
            let poly = polygon![
                (x: x0, y: y * a),
                (x: x0 + unit, y: y * a),
                (x: x0 + 1.5 * unit, y: (y + unit) * a),
                (x: x0 + unit, y: (y + 2.0 * unit) * a),
                (x: x0, y: (y + 2.0 * unit) * a),
                (x: x0 - 0.5 * unit, y: (y + unit) * a),
            ];
            cells.push(GridCell { id, polygon: poly });
            id += 1;
            row += 1;
            y += unit;
        }
        x += 3.0 * unit;
    }
    cells
}

fn square_grid(bounds: Bounds, n_cells: usize) -> Vec<GridCell> {
    let unit = cell_size(&bounds, n_cells);

    let mut cells = Vec::new();
    let mut id = 0;
    let mut x = bounds.xmin;
    while x <= bounds.xmax {
        let mut y = bounds.ymin;
        while y <= bounds.ymax {
            let poly = polygon![
                (x: x, y: y),
                (x: x + unit, y: y),
                (x: x + unit, y: y + unit),
                (x: x, y: y + unit),
            ];
            cells.push(GridCell { id, polygon: poly });
            id += 1;
            y += unit;
        }
        x += unit;
    }
    cells
}

fn cell_size(bounds: &Bounds, n_cells: usize) -> f64 {
    let span = bounds.width();
    if span <= 0.0 {
        // Degenerate bounds (a single point or a vertical line of
        // points): any positive cell size tiles them correctly.
        return 1.0;
    }
    span / n_cells.max(1) as f64
}

/// Point-in-cell join followed by a per-cell majority vote.
///
/// Each point is counted in the first cell that contains it (cell edges
/// are shared, so boundary points resolve to the lowest cell id). Ties
/// in the vote are broken by category label ascending, so the result is
/// independent of input order. Cells with no points do not appear.
pub fn assign_dominant(
    items: &[(Point<f64>, &str)],
    grid: &[GridCell],
) -> BTreeMap<usize, String> {
    let mut counts: BTreeMap<usize, BTreeMap<&str, u32>> = BTreeMap::new();

    for (point, category) in items {
        let Some(cell) = grid.iter().find(|c| c.polygon.intersects(point)) else {
            continue;
        };
        *counts
            .entry(cell.id)
            .or_default()
            .entry(category)
            .or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(cell_id, by_cat)| {
            // BTreeMap iterates label-ascending; strict > keeps the
            // first (lowest) label on ties.
            let mut best: (&str, u32) = ("", 0);
            for (cat, n) in by_cat {
                if n > best.1 {
                    best = (cat, n);
                }
            }
            (cell_id, best.0.to_string())
        })
        .collect()
}

/// Bin a selection by a categorical column, dropping empty geometries
/// and unclustered labels first. With `top_n` set, only the N most
/// common categories are gridded (count descending, ties by label), so
/// a dense view is not drowned out by singletons. Returns the grid
/// together with the dominant category per non-empty cell.
pub fn bin_by_category(
    subset: &SelectionSubset,
    column: &str,
    n_cells: usize,
    shape: GridShape,
    top_n: Option<usize>,
) -> Result<(Vec<GridCell>, BTreeMap<usize, String>)> {
    let points = subset.points()?;
    let labels = subset
        .frame()
        .column(column)
        .map_err(|_| crate::error::BtbError::MissingColumn(column.to_string()))?
        .str()?;

    let mut items: Vec<(Point<f64>, &str)> = points
        .iter()
        .zip(labels)
        .filter_map(|(p, label)| match (p, label) {
            (Some(p), Some(label)) if !is_unclustered(label) => Some((*p, label)),
            _ => None,
        })
        .collect();

    if let Some(n) = top_n {
        let keep = top_categories(&items, n);
        items.retain(|(_, label)| keep.contains(label));
    }

    let pts: Vec<Point<f64>> = items.iter().map(|(p, _)| *p).collect();
    let Some(bounds) = Bounds::from_points(&pts) else {
        return Ok((Vec::new(), BTreeMap::new()));
    };

    let grid = create_grid(bounds, n_cells, shape);
    let dominant = assign_dominant(&items, &grid);
    log::debug!(
        "binned {} points into {} of {} cells",
        items.len(),
        dominant.len(),
        grid.len()
    );
    Ok((grid, dominant))
}

/// The `n` most common category labels, count descending with ties
/// broken by label ascending.
fn top_categories<'a>(items: &[(Point<f64>, &'a str)], n: usize) -> Vec<&'a str> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for (_, label) in items {
        *counts.entry(label).or_insert(0) += 1;
    }
    // BTreeMap iterates label-ascending; the stable sort keeps that as
    // the tie-break.
    let mut ranked: Vec<(&str, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked.into_iter().map(|(label, _)| label).collect()
}

//! Shared geometry helpers: bounding boxes and point extraction from
//! X/Y coordinate columns. Null coordinates mean "no location" and are
//! surfaced as `None`, never coerced to (0,0).

use geo::Point;
use polars::prelude::*;

use crate::error::{BtbError, Result};

/// Axis-aligned bounding box in the projected coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Smallest box covering all points, or `None` if the set is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point<f64>>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Bounds::new(first.x(), first.y(), first.x(), first.y());
        for p in iter {
            b.xmin = b.xmin.min(p.x());
            b.ymin = b.ymin.min(p.y());
            b.xmax = b.xmax.max(p.x());
            b.ymax = b.ymax.max(p.y());
        }
        Some(b)
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: &Point<f64>) -> bool {
        p.x() >= self.xmin && p.x() <= self.xmax && p.y() >= self.ymin && p.y() <= self.ymax
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Extract per-row points from a pair of Float64 columns.
/// A row with a null in either column yields `None`.
pub fn points_from_columns(df: &DataFrame, xcol: &str, ycol: &str) -> Result<Vec<Option<Point<f64>>>> {
    let x = df
        .column(xcol)
        .map_err(|_| BtbError::MissingColumn(xcol.to_string()))?
        .f64()?;
    let y = df
        .column(ycol)
        .map_err(|_| BtbError::MissingColumn(ycol.to_string()))?
        .f64()?;

    let points = x
        .into_iter()
        .zip(y)
        .map(|(px, py)| match (px, py) {
            (Some(px), Some(py)) => Some(Point::new(px, py)),
            _ => None,
        })
        .collect();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_points() {
        let pts = [Point::new(1.0, 5.0), Point::new(-2.0, 3.0), Point::new(4.0, -1.0)];
        let b = Bounds::from_points(pts.iter()).unwrap();
        assert_eq!(b, Bounds::new(-2.0, -1.0, 4.0, 5.0));
        let empty: Vec<Point<f64>> = Vec::new();
        assert!(Bounds::from_points(&empty).is_none());
    }

    #[test]
    fn bounds_edges_are_inclusive() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains(&Point::new(0.0, 5.0)));
        assert!(b.contains(&Point::new(10.0, 10.0)));
        assert!(!b.contains(&Point::new(10.1, 5.0)));
    }

    #[test]
    fn null_coordinates_become_none() {
        let df = DataFrame::new(vec![
            Column::new("X_COORD".into(), &[Some(1.0), None, Some(3.0)]),
            Column::new("Y_COORD".into(), &[Some(2.0), Some(9.0), None]),
        ])
        .unwrap();
        let pts = points_from_columns(&df, "X_COORD", "Y_COORD").unwrap();
        assert_eq!(pts[0], Some(Point::new(1.0, 2.0)));
        assert_eq!(pts[1], None);
        assert_eq!(pts[2], None);
    }
}

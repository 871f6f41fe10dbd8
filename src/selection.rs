//! Spatial selection: the four ways a user picks samples (clade set,
//! county, map region, table rows) all funnel into one [`SelectionSubset`]
//! so the movement, color and binning code never needs to know how the
//! subset was made.

use geo::Point;
use polars::prelude::*;

use crate::error::{BtbError, Result};
use crate::geom::{points_from_columns, Bounds};
use crate::schema::sample;

/// A selection criterion. Building one is cheap; nothing is evaluated
/// until [`select`] runs it against a samples table.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Samples whose clade label at `level` is one of `labels`.
    Clades { level: String, labels: Vec<String> },
    /// Exact match on the county attribute.
    County(String),
    /// Samples whose geometry falls inside the box, bounds inclusive.
    /// Samples without coordinates never match.
    Region(Bounds),
    /// Samples at the given row positions, order preserved.
    Rows(Vec<u32>),
}

/// The active subset of samples driving the map and table views.
/// Replaced wholesale on every new selection, never mutated.
#[derive(Debug, Clone)]
pub struct SelectionSubset {
    frame: DataFrame,
    selection: Selection,
}

/// Typed per-row view of a subset, for callers that want records
/// rather than columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSite {
    pub sample_id: String,
    pub animal_id: String,
    pub herd: String,
    pub species: Option<String>,
    pub county: Option<String>,
    pub point: Option<Point<f64>>,
}

/// Run a selection against the samples table.
///
/// An empty result is a valid subset, not an error; only a missing
/// column (wrong level name, no county column) is fatal.
pub fn select(samples: &DataFrame, selection: &Selection) -> Result<SelectionSubset> {
    let frame = match selection {
        Selection::Clades { level, labels } => {
            if samples.column(level).is_err() {
                return Err(BtbError::MissingColumn(level.clone()));
            }
            let wanted = Series::new("labels".into(), labels.as_slice());
            samples
                .clone()
                .lazy()
                .filter(col(level.as_str()).is_in(lit(wanted), false))
                .collect()?
        }
        Selection::County(name) => {
            if samples.column(sample::COUNTY).is_err() {
                return Err(BtbError::MissingColumn(sample::COUNTY.to_string()));
            }
            samples
                .clone()
                .lazy()
                .filter(col(sample::COUNTY).eq(lit(name.as_str())))
                .collect()?
        }
        Selection::Region(bounds) => {
            // Null coordinates compare to null and drop out of the filter,
            // which is exactly the empty-geometry policy.
            samples
                .clone()
                .lazy()
                .filter(
                    col(sample::X_COORD)
                        .gt_eq(lit(bounds.xmin))
                        .and(col(sample::X_COORD).lt_eq(lit(bounds.xmax)))
                        .and(col(sample::Y_COORD).gt_eq(lit(bounds.ymin)))
                        .and(col(sample::Y_COORD).lt_eq(lit(bounds.ymax))),
                )
                .collect()?
        }
        Selection::Rows(indices) => {
            let idx = IdxCa::from_vec("idx".into(), indices.clone());
            samples.take(&idx)?
        }
    };

    log::debug!("selection {:?} -> {} rows", selection, frame.height());
    Ok(SelectionSubset {
        frame,
        selection: selection.clone(),
    })
}

impl SelectionSubset {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Display title summarizing how the subset was made.
    pub fn title(&self) -> String {
        let n = self.len();
        match &self.selection {
            Selection::Clades { level, labels } => {
                format!("{}={} n={}", level, labels.join(","), n)
            }
            Selection::County(name) => format!("{} n={}", name, n),
            Selection::Region(_) => format!("region n={}", n),
            Selection::Rows(_) => format!("(table selection) n={}", n),
        }
    }

    /// Per-row geometry; `None` where a sample has no coordinates.
    pub fn points(&self) -> Result<Vec<Option<Point<f64>>>> {
        points_from_columns(&self.frame, sample::X_COORD, sample::Y_COORD)
    }

    /// Typed rows. Species/county come back as `None` when those columns
    /// are absent; identity and herd columns are required.
    pub fn sites(&self) -> Result<Vec<SampleSite>> {
        let id = self.str_column(sample::SAMPLE_ID)?;
        let animal = self.str_column(sample::ANIMAL_ID)?;
        let herd = self.str_column(sample::HERD_NO)?;
        let species = self.frame.column(sample::SPECIES).ok().map(|c| c.str()).transpose()?;
        let county = self.frame.column(sample::COUNTY).ok().map(|c| c.str()).transpose()?;
        let points = self.points()?;

        let mut sites = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            sites.push(SampleSite {
                sample_id: id.get(i).unwrap_or_default().to_string(),
                animal_id: animal.get(i).unwrap_or_default().to_string(),
                herd: herd.get(i).unwrap_or_default().to_string(),
                species: species.and_then(|c| c.get(i)).map(str::to_string),
                county: county.and_then(|c| c.get(i)).map(str::to_string),
                point: points[i],
            });
        }
        Ok(sites)
    }

    fn str_column(&self, name: &str) -> Result<&StringChunked> {
        Ok(self
            .frame
            .column(name)
            .map_err(|_| BtbError::MissingColumn(name.to_string()))?
            .str()?)
    }
}

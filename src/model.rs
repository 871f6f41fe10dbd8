//! Top-level session model: owns the sample, movement and parcel
//! tables and exposes the selection, clade, movement and binning entry
//! points to a presentation layer.
//!
//! Datasets are only ever replaced wholesale (an `Option<DataFrame>`
//! swap), never mutated in place, and every computation below takes the
//! full input plus the selection criteria and returns a fresh result.
//! That keeps the core reentrant: a worker thread can run any of these
//! while the presentation thread stays responsive.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use geo::Line;
use polars::prelude::*;

use crate::binning::{self, GridCell, GridShape};
use crate::clades;
use crate::colors;
use crate::contact::ContactTracer;
use crate::error::{require_columns, BtbError, Result};
use crate::movement;
use crate::schema::{clade, movement as mov, parcel, sample};
use crate::selection::{self, Selection, SelectionSubset};

const SAMPLES_PARQUET: &str = "samples.parquet";
const MOVEMENTS_PARQUET: &str = "movements.parquet";
const CENTROIDS_PARQUET: &str = "parcel_centroids.parquet";

pub struct BtbProject {
    base_path: PathBuf,
    samples: Option<DataFrame>,
    movements: Option<DataFrame>,
    centroids: Option<DataFrame>,
    tracer: Option<ContactTracer>,
}

impl BtbProject {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
            samples: None,
            movements: None,
            centroids: None,
            tracer: None,
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load the sample metadata CSV.
    ///
    /// Required columns: sample_id, Animal_ID, HERD_NO, Species, County,
    /// X_COORD, Y_COORD. Coordinates are cast to Float64; missing values
    /// stay null (empty geometry). Clade level columns that are present
    /// have nulls normalized to the unclustered sentinel. All other
    /// columns are preserved as strings.
    pub fn load_samples(&mut self, filename: Option<&str>) -> Result<&DataFrame> {
        let fname = filename.unwrap_or("metadata.csv");
        let raw = self.read_csv_as_strings(fname, None)?;

        require_columns(
            &raw,
            &[
                sample::SAMPLE_ID,
                sample::ANIMAL_ID,
                sample::HERD_NO,
                sample::SPECIES,
                sample::COUNTY,
                sample::X_COORD,
                sample::Y_COORD,
            ],
        )?;

        let mut lazy = raw.clone().lazy().with_columns([
            col(sample::X_COORD).cast(DataType::Float64),
            col(sample::Y_COORD).cast(DataType::Float64),
        ]);
        for level in clade::LEVELS {
            if raw.column(level).is_ok() {
                lazy = lazy.with_columns([col(level).fill_null(lit(clade::UNCLUSTERED))]);
            }
        }
        let df = lazy.collect()?;

        log::info!("loaded {} samples from {}", df.height(), fname);
        self.samples = Some(df);
        Ok(self.samples.as_ref().unwrap())
    }

    /// Load the movement events CSV.
    ///
    /// Required columns: tag, move_from, move_to, move_date. The date is
    /// parsed as `%Y-%m-%d`.
    pub fn load_movements(&mut self, filename: Option<&str>) -> Result<&DataFrame> {
        let fname = filename.unwrap_or("moves.csv");
        let raw = self.read_csv_as_strings(fname, None)?;

        require_columns(&raw, &[mov::TAG, mov::MOVE_FROM, mov::MOVE_TO, mov::MOVE_DATE])?;
        let df = Self::parse_date(raw, mov::MOVE_DATE, "%Y-%m-%d")?;

        log::info!("loaded {} movement events from {}", df.height(), fname);
        self.movements = Some(df);
        self.tracer = None;
        Ok(self.movements.as_ref().unwrap())
    }

    /// Load the land-parcel centroid CSV.
    ///
    /// Required columns: SPH_HERD_N, X_COORD, Y_COORD.
    pub fn load_parcels(&mut self, filename: Option<&str>) -> Result<&DataFrame> {
        let fname = filename.unwrap_or("lpis_cent.csv");
        let raw = self.read_csv_as_strings(fname, None)?;

        require_columns(&raw, &[parcel::HERD_NO, parcel::X_COORD, parcel::Y_COORD])?;
        let df = raw
            .lazy()
            .with_columns([
                col(parcel::X_COORD).cast(DataType::Float64),
                col(parcel::Y_COORD).cast(DataType::Float64),
            ])
            .collect()?;

        log::info!("loaded {} parcel centroids from {}", df.height(), fname);
        self.centroids = Some(df);
        Ok(self.centroids.as_ref().unwrap())
    }

    // ── Parse helpers ───────────────────────────────────────────────────────

    /// Parse a string column to Date using the given format string.
    pub fn parse_date(df: DataFrame, column: &str, format: &str) -> Result<DataFrame> {
        let df = df
            .lazy()
            .with_columns([col(column)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .str()
                .to_date(StrptimeOptions {
                    format: Some(format.into()),
                    strict: true,
                    ..Default::default()
                })])
            .collect()?;
        Ok(df)
    }

    /// Parse a string column to Float64.
    pub fn parse_float(df: DataFrame, column: &str) -> Result<DataFrame> {
        let df = df
            .lazy()
            .with_columns([col(column)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::Float64)])
            .collect()?;
        Ok(df)
    }

    // ── Selection ───────────────────────────────────────────────────────────

    /// Run a selection against the loaded samples. The returned subset
    /// replaces any previous one; it is never mutated.
    pub fn select(&self, selection: &Selection) -> Result<SelectionSubset> {
        selection::select(self.samples()?, selection)
    }

    // ── Clades ──────────────────────────────────────────────────────────────

    pub fn clade_counts(&self, level: &str) -> Result<BTreeMap<String, u32>> {
        clades::counts_by_level(self.samples()?, level, false)
    }

    pub fn cluster_members(&self, level: &str, min_size: u32) -> Result<Vec<String>> {
        clades::cluster_members(self.samples()?, level, min_size)
    }

    // ── Movement ────────────────────────────────────────────────────────────

    /// Waypoint table for a subset (see [`movement::join_moves`]).
    pub fn moves_for(&self, subset: &SelectionSubset) -> Result<DataFrame> {
        movement::join_moves(subset, self.movements()?, self.centroids()?)
    }

    /// Movement trace line segments per animal in the subset.
    pub fn traces_for(&self, subset: &SelectionSubset) -> Result<BTreeMap<String, Vec<Line<f64>>>> {
        movement::resolve(subset, self.movements()?, self.centroids()?)
    }

    /// Movement events with a date inside [start, end], inclusive.
    pub fn movements_between(&self, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        let epoch = NaiveDate::default();
        let start_days = start.signed_duration_since(epoch).num_days() as i32;
        let end_days = end.signed_duration_since(epoch).num_days() as i32;

        let df = self
            .movements()?
            .clone()
            .lazy()
            .filter(
                col(mov::MOVE_DATE)
                    .cast(DataType::Int32)
                    .gt_eq(lit(start_days))
                    .and(col(mov::MOVE_DATE).cast(DataType::Int32).lt_eq(lit(end_days))),
            )
            .collect()?;
        Ok(df)
    }

    // ── Colors / binning ────────────────────────────────────────────────────

    /// Per-row colors and legend map for a categorical column of the subset.
    pub fn colors_for(
        &self,
        subset: &SelectionSubset,
        column: &str,
        seed: u64,
    ) -> Result<(Vec<String>, BTreeMap<String, String>)> {
        colors::column_colors(subset.frame(), column, seed)
    }

    /// Grid cells plus dominant category per cell for a subset; `top_n`
    /// limits the grid to the N most common categories.
    pub fn bin_selection(
        &self,
        subset: &SelectionSubset,
        column: &str,
        n_cells: usize,
        shape: GridShape,
        top_n: Option<usize>,
    ) -> Result<(Vec<GridCell>, BTreeMap<usize, String>)> {
        binning::bin_by_category(subset, column, n_cells, shape, top_n)
    }

    // ── Contact tracing ─────────────────────────────────────────────────────

    /// Herds reachable from the origin herds through recorded movements.
    /// The contact graph is built on first use and rebuilt after a
    /// movement reload.
    pub fn contact_trace(&mut self, origin_herds: &[String]) -> Result<DataFrame> {
        let tracer = self.get_or_build_tracer()?;
        tracer.trace(origin_herds)
    }

    // ── Project persistence ─────────────────────────────────────────────────

    /// Write the loaded tables to a directory as parquet, one file per
    /// table. Only tables that are loaded are written.
    pub fn save_project(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        for (name, table) in [
            (SAMPLES_PARQUET, &self.samples),
            (MOVEMENTS_PARQUET, &self.movements),
            (CENTROIDS_PARQUET, &self.centroids),
        ] {
            if let Some(df) = table {
                let file = File::create(dir.join(name))?;
                ParquetWriter::new(file).finish(&mut df.clone())?;
            }
        }
        log::info!("saved project to {}", dir.display());
        Ok(())
    }

    /// Replace the loaded tables from a project directory. Each table is
    /// swapped in whole; a file that is absent leaves that table empty.
    pub fn load_project(&mut self, dir: &Path) -> Result<()> {
        self.samples = Self::read_parquet(&dir.join(SAMPLES_PARQUET))?;
        self.movements = Self::read_parquet(&dir.join(MOVEMENTS_PARQUET))?;
        self.centroids = Self::read_parquet(&dir.join(CENTROIDS_PARQUET))?;
        self.tracer = None;
        log::info!("loaded project from {}", dir.display());
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn samples(&self) -> Result<&DataFrame> {
        self.samples
            .as_ref()
            .ok_or_else(|| BtbError::NotLoaded("samples".into()))
    }

    pub fn movements(&self) -> Result<&DataFrame> {
        self.movements
            .as_ref()
            .ok_or_else(|| BtbError::NotLoaded("movements".into()))
    }

    pub fn centroids(&self) -> Result<&DataFrame> {
        self.centroids
            .as_ref()
            .ok_or_else(|| BtbError::NotLoaded("parcel centroids".into()))
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl BtbProject {
    /// Read a CSV file with all columns as String dtype.
    /// Trims whitespace from column names and applies optional rename.
    fn read_csv_as_strings(
        &self,
        filename: &str,
        rename: Option<Vec<(String, String)>>,
    ) -> Result<DataFrame> {
        let path = self.base_path.join(filename);
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0)) // all columns as String
            .try_into_reader_with_file_path(Some(path))?
            .finish()?;

        let trimmed: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        df.set_column_names(trimmed.as_slice())?;

        if let Some(map) = rename {
            let old: Vec<&str> = map.iter().map(|(o, _)| o.as_str()).collect();
            let new: Vec<&str> = map.iter().map(|(_, n)| n.as_str()).collect();
            df = df.lazy().rename(old, new, true).collect()?;
        }

        Ok(df)
    }

    fn read_parquet(path: &Path) -> Result<Option<DataFrame>> {
        if !path.exists() {
            return Ok(None);
        }
        let df = ParquetReader::new(File::open(path)?).finish()?;
        Ok(Some(df))
    }

    fn get_or_build_tracer(&mut self) -> Result<&ContactTracer> {
        if self.tracer.is_none() {
            let movements = self
                .movements
                .as_ref()
                .ok_or_else(|| BtbError::NotLoaded("movements".into()))?;
            self.tracer = Some(ContactTracer::from_movements(movements)?);
        }
        Ok(self.tracer.as_ref().unwrap())
    }
}

//! btb-tracekit: the data-transform core of a bovine TB outbreak
//! mapping tool. Takes tabular sample, movement and land-parcel
//! datasets and produces the derived structures a map/table view
//! renders: selection subsets, clade counts, per-category colors,
//! movement trace lines, herd contact traces and binned grids.
//!
//! All computations are synchronous and pure: they borrow the input
//! tables, hold no hidden state between calls, and return fresh
//! results, so they are safe to re-run on every selection change and
//! to call from a worker thread.

pub mod binning;
pub mod clades;
pub mod colors;
pub mod contact;
pub mod error;
pub mod geom;
pub mod model;
pub mod movement;
pub mod schema;
pub mod selection;

pub use binning::{GridCell, GridShape};
pub use contact::ContactTracer;
pub use error::{BtbError, Result};
pub use geom::Bounds;
pub use model::BtbProject;
pub use selection::{SampleSite, Selection, SelectionSubset};

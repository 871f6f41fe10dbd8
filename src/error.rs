use thiserror::Error;

#[derive(Error, Debug)]
pub enum BtbError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, BtbError>;

/// Eager column-presence check. A missing required column is fatal to
/// the operation that needs it, never silently defaulted.
pub(crate) fn require_columns(df: &polars::prelude::DataFrame, required: &[&str]) -> Result<()> {
    for &name in required {
        if df.column(name).is_err() {
            return Err(BtbError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

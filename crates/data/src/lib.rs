pub mod csv_loader;
pub mod export;

use insights_core::ValidationError;

/// Errors that can occur while reading or writing bar data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationError),
}

pub use csv_loader::{load_bars_from_csv, load_bars_from_reader};
pub use export::write_series_csv;

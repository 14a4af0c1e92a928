use chrono::NaiveDate;
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// Malformed bar data, rejected before any indicator runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Series is empty")]
    EmptySeries,
    #[error("Bar {index} dated {current} precedes previous bar dated {previous}")]
    UnsortedDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
    #[error("Duplicate date {date} at bar {index}")]
    DuplicateDate { index: usize, date: NaiveDate },
    #[error("Non-positive {field} price {value} at bar {index}")]
    NonPositivePrice {
        index: usize,
        field: &'static str,
        value: Decimal,
    },
    #[error("{field} price {value} at bar {index} exceeds the supported maximum {maximum}")]
    PriceTooLarge {
        index: usize,
        field: &'static str,
        value: Decimal,
        maximum: Decimal,
    },
    #[error("Negative volume {value} at bar {index}")]
    NegativeVolume { index: usize, value: Decimal },
    #[error("Fractional volume {value} at bar {index}")]
    FractionalVolume { index: usize, value: Decimal },
    #[error("High {high} below low {low} at bar {index}")]
    InvertedRange {
        index: usize,
        high: Decimal,
        low: Decimal,
    },
    #[error("Non-finite or unrepresentable {field} value")]
    NonFinite { field: &'static str },
}

// ---------------------------------------------------------------------------
// Column store
// ---------------------------------------------------------------------------

/// Errors raised by derived-column lookups and writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    #[error("Column {column} has {actual} values, series has {expected} bars")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{SeriesError, ValidationError};

/// A derived indicator column. `None` marks positions before a window has filled.
pub type Column = Vec<Option<Decimal>>;

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// A single daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Build a bar from floating-point quotes, rejecting NaN and infinities.
    pub fn from_f64(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            date,
            open: finite(open, "open")?,
            high: finite(high, "high")?,
            low: finite(low, "low")?,
            close: finite(close, "close")?,
            volume: finite(volume, "volume")?,
        })
    }

    /// Read one of the raw price/volume fields.
    pub fn field(&self, field: PriceField) -> Decimal {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }
}

fn finite(value: f64, field: &'static str) -> Result<Decimal, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    Decimal::try_from(value).map_err(|_| ValidationError::NonFinite { field })
}

/// The raw columns every series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// Largest accepted open/high/low/close (1e12). Squared deviations of prices
/// up to this bound stay inside `Decimal`'s range for every indicator.
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Check the ordering and value constraints a bar sequence must satisfy.
pub fn validate_bars(bars: &[Bar]) -> Result<(), ValidationError> {
    if bars.is_empty() {
        return Err(ValidationError::EmptySeries);
    }

    for (index, bar) in bars.iter().enumerate() {
        for (field, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if value <= Decimal::ZERO {
                return Err(ValidationError::NonPositivePrice { index, field, value });
            }
            if value > MAX_PRICE {
                return Err(ValidationError::PriceTooLarge {
                    index,
                    field,
                    value,
                    maximum: MAX_PRICE,
                });
            }
        }
        if bar.high < bar.low {
            return Err(ValidationError::InvertedRange {
                index,
                high: bar.high,
                low: bar.low,
            });
        }
        if bar.volume < Decimal::ZERO {
            return Err(ValidationError::NegativeVolume {
                index,
                value: bar.volume,
            });
        }
        if !bar.volume.fract().is_zero() {
            return Err(ValidationError::FractionalVolume {
                index,
                value: bar.volume,
            });
        }

        if index > 0 {
            let previous = bars[index - 1].date;
            if bar.date == previous {
                return Err(ValidationError::DuplicateDate {
                    index,
                    date: bar.date,
                });
            }
            if bar.date < previous {
                return Err(ValidationError::UnsortedDates {
                    index,
                    previous,
                    current: bar.date,
                });
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// An ordered, validated bar sequence plus the derived columns computed over it.
///
/// Bars are fixed at construction. Every derived column has exactly one value
/// per bar, aligned by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    symbol: Option<String>,
    bars: Vec<Bar>,
    columns: BTreeMap<String, Column>,
}

impl Series {
    /// Validate `bars` and wrap them in a series with no derived columns.
    pub fn from_bars(bars: Vec<Bar>) -> Result<Self, ValidationError> {
        validate_bars(&bars)?;
        Ok(Self {
            symbol: None,
            bars,
            columns: BTreeMap::new(),
        })
    }

    /// Tag the series with the instrument symbol it was fetched for.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    /// Collect one raw field across all bars.
    pub fn prices(&self, field: PriceField) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.field(field)).collect()
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.prices(PriceField::Close)
    }

    /// Look up a derived column by name.
    pub fn get_column(&self, name: &str) -> Result<&[Option<Decimal>], SeriesError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SeriesError::UnknownColumn(name.to_string()))
    }

    /// Store a derived column, replacing any previous column of the same name.
    pub fn set_column(&mut self, name: impl Into<String>, values: Column) -> Result<(), SeriesError> {
        let name = name.into();
        if values.len() != self.bars.len() {
            return Err(SeriesError::LengthMismatch {
                column: name,
                expected: self.bars.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Derived column names in lexical order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> &BTreeMap<String, Column> {
        &self.columns
    }
}

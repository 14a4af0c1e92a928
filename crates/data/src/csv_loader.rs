use chrono::{DateTime, NaiveDate, NaiveDateTime};
use insights_core::Bar;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::DataError;

/// Load daily OHLCV bars from a CSV file.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `date` (or `timestamp`, `datetime`, `time`), `open`, `high`, `low`, `close`,
/// `volume`; the short forms `o`, `h`, `l`, `c`, `v`/`vol` also resolve.
/// A missing volume column reads as zero volume. Extra columns such as
/// `adj close` are ignored.
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }
    let file = std::fs::File::open(path)?;
    let bars = load_bars_from_reader(file)?;
    debug!(path = %path.display(), bars = bars.len(), "Loaded bars from CSV");
    Ok(bars)
}

/// Load bars from any CSV source. Rows are sorted by date; duplicate dates are
/// kept and left for series validation to reject.
pub fn load_bars_from_reader<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let col_map = resolve_bar_columns(&headers)?;

    let mut bars = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| DataError::ParseError(format!("CSV record error: {}", e)))?;
        let cell = |idx: usize| {
            record.get(idx).ok_or_else(|| {
                DataError::ParseError(format!("Row {} is missing column {}", row + 1, idx + 1))
            })
        };

        let date = parse_date(cell(col_map.date)?)?;
        let open = parse_decimal(cell(col_map.open)?, "open")?;
        let high = parse_decimal(cell(col_map.high)?, "high")?;
        let low = parse_decimal(cell(col_map.low)?, "low")?;
        let close = parse_decimal(cell(col_map.close)?, "close")?;
        let volume = match col_map.volume {
            Some(vol_idx) => parse_decimal(cell(vol_idx)?, "volume")?,
            None => Decimal::ZERO,
        };

        bars.push(Bar::new(date, open, high, low, close, volume));
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct BarColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn resolve_bar_columns(headers: &csv::StringRecord) -> Result<BarColumnMap, DataError> {
    let date = find_column(headers, &["date", "timestamp", "datetime", "time"])
        .ok_or_else(|| DataError::ParseError("No date column found".into()))?;
    let open = find_column(headers, &["open", "o"])
        .ok_or_else(|| DataError::ParseError("No open column found".into()))?;
    let high = find_column(headers, &["high", "h"])
        .ok_or_else(|| DataError::ParseError("No high column found".into()))?;
    let low = find_column(headers, &["low", "l"])
        .ok_or_else(|| DataError::ParseError("No low column found".into()))?;
    let close = find_column(headers, &["close", "c"])
        .ok_or_else(|| DataError::ParseError("No close column found".into()))?;
    let volume = find_column(headers, &["volume", "vol", "v"]);

    Ok(BarColumnMap {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let h = header.trim().to_lowercase();
        names.iter().any(|name| h == *name)
    })
}

fn parse_decimal(s: &str, field: &str) -> Result<Decimal, DataError> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|e| DataError::ParseError(format!("Failed to parse {} '{}': {}", field, s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate, DataError> {
    let s = s.trim();

    let date_formats = ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d", "%d-%b-%Y"];
    for fmt in &date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    // Timestamps with an offset keep their local calendar date.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.date_naive());
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"];
    for fmt in &datetime_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.date());
        }
    }

    Err(DataError::ParseError(format!("Unable to parse date: '{}'", s)))
}

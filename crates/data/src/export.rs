use insights_core::Series;
use std::io::Write;

use crate::DataError;

/// Write a series as CSV: date, raw OHLCV, then every derived column by name.
///
/// Undefined values become empty cells.
pub fn write_series_csv<W: Write>(series: &Series, writer: W) -> Result<(), DataError> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = vec!["Date", "Open", "High", "Low", "Close", "Volume"];
    header.extend(series.column_names());
    out.write_record(&header).map_err(csv_error)?;

    let columns: Vec<_> = series.columns().values().collect();
    for (i, bar) in series.bars().iter().enumerate() {
        let mut record = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ];
        record.extend(
            columns
                .iter()
                .map(|col| col[i].map(|v| v.normalize().to_string()).unwrap_or_default()),
        );
        out.write_record(&record).map_err(csv_error)?;
    }

    out.flush()?;
    Ok(())
}

fn csv_error(e: csv::Error) -> DataError {
    DataError::ParseError(format!("CSV write error: {}", e))
}

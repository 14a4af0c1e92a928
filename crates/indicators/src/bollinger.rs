use crate::sma::Sma;
use crate::stddev::RollingStd;
use crate::Indicator;
use insights_core::Column;
use rust_decimal::Decimal;

/// Bollinger Bands.
///
/// Middle band is the SMA; the bands sit `num_std` sample standard deviations
/// above and below it. Returns the middle band; use `next_output()` for the rest.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    len: usize,
    num_std: Decimal,
    sma: Sma,
    std: RollingStd,
    last: Option<BollingerOutput>,
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerOutput {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    pub std_dev: Decimal,
    pub bandwidth: Decimal,
}

impl BollingerBands {
    pub fn new(period: usize, num_std_dev: Decimal) -> Self {
        assert!(num_std_dev > Decimal::ZERO, "Bollinger multiplier must be > 0");
        Self {
            len: period,
            num_std: num_std_dev,
            sma: Sma::new(period),
            std: RollingStd::new(period),
            last: None,
        }
    }

    /// Standard Bollinger Bands (20, 2).
    pub fn default_periods() -> Self {
        Self::new(20, Decimal::TWO)
    }

    pub fn output(&self) -> Option<BollingerOutput> {
        self.last
    }

    pub fn next_output(&mut self, value: Decimal) -> Option<BollingerOutput> {
        let middle = self.sma.next(value);
        let std_dev = self.std.next(value);
        self.last = match (middle, std_dev) {
            (Some(m), Some(sd)) => Some(bands(m, sd, self.num_std)),
            _ => None,
        };
        self.last
    }
}

fn bands(middle: Decimal, std_dev: Decimal, num_std: Decimal) -> BollingerOutput {
    let offset = num_std * std_dev;
    BollingerOutput {
        upper: middle + offset,
        middle,
        lower: middle - offset,
        std_dev,
        bandwidth: offset + offset,
    }
}

impl Indicator for BollingerBands {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.next_output(value).map(|o| o.middle)
    }

    fn reset(&mut self) {
        self.sma.reset();
        self.std.reset();
        self.last = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }
}

pub const UPPER_COLUMN: &str = "Bollinger_Upper";
pub const LOWER_COLUMN: &str = "Bollinger_Lower";

/// Columns written by the Bollinger node. The middle band is the SMA column it
/// depends on and is not rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerColumns {
    pub std_dev: Column,
    pub upper: Column,
    pub lower: Column,
}

/// Bands around an already computed `middle` (SMA) column.
///
/// Undefined wherever the middle band or the rolling deviation is undefined.
pub fn bollinger_columns(
    closes: &[Decimal],
    middle: &[Option<Decimal>],
    period: usize,
    num_std: Decimal,
) -> BollingerColumns {
    let mut std = RollingStd::new(period);
    let mut out = BollingerColumns {
        std_dev: Vec::with_capacity(closes.len()),
        upper: Vec::with_capacity(closes.len()),
        lower: Vec::with_capacity(closes.len()),
    };
    for (close, mid) in closes.iter().zip(middle) {
        let sd = std.next(*close);
        let b = match (*mid, sd) {
            (Some(m), Some(s)) => Some(bands(m, s, num_std)),
            _ => None,
        };
        out.std_dev.push(sd);
        out.upper.push(b.map(|o| o.upper));
        out.lower.push(b.map(|o| o.lower));
    }
    out
}

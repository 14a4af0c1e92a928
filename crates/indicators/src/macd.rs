use crate::ema::Ema;
use crate::Indicator;
use insights_core::Column;
use rust_decimal::Decimal;

/// MACD (Moving Average Convergence Divergence).
///
/// Composed of three EMAs:
/// - Fast EMA (default 12)
/// - Slow EMA (default 26)
/// - Signal EMA (default 9), run over the MACD line itself
///
/// All EMAs seed with their first input, so every output is defined from the
/// first bar on. Returns the MACD line value; use `next_output()` for the rest.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: Ema,
    slow_ema: Ema,
    signal_ema: Ema,
    last: Option<MacdOutput>,
}

/// MACD output with all components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub fast_ema: Decimal,
    pub slow_ema: Decimal,
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        assert!(fast_period < slow_period, "Fast period must be less than slow period");
        Self {
            fast_ema: Ema::new(fast_period),
            slow_ema: Ema::new(slow_period),
            signal_ema: Ema::new(signal_period),
            last: None,
        }
    }

    /// Standard MACD (12, 26, 9).
    pub fn default_periods() -> Self {
        Self::new(12, 26, 9)
    }

    pub fn output(&self) -> Option<MacdOutput> {
        self.last
    }

    /// Process next value and return the full output.
    pub fn next_output(&mut self, value: Decimal) -> MacdOutput {
        let fast = self.fast_ema.next(value).unwrap_or(value);
        let slow = self.slow_ema.next(value).unwrap_or(value);
        let macd = fast - slow;
        let signal = self.signal_ema.next(macd).unwrap_or(macd);

        let out = MacdOutput {
            fast_ema: fast,
            slow_ema: slow,
            macd,
            signal,
            histogram: macd - signal,
        };
        self.last = Some(out);
        out
    }
}

impl Indicator for Macd {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        Some(self.next_output(value).macd)
    }

    fn reset(&mut self) {
        self.fast_ema.reset();
        self.slow_ema.reset();
        self.signal_ema.reset();
        self.last = None;
    }

    fn period(&self) -> usize {
        self.slow_ema.period()
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }
}

pub const MACD_COLUMN: &str = "MACD";
pub const SIGNAL_COLUMN: &str = "Signal_Line";
pub const HISTOGRAM_COLUMN: &str = "MACD_Histogram";

/// Every column the MACD node writes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub fast_ema: Column,
    pub slow_ema: Column,
    pub macd: Column,
    pub signal: Column,
    pub histogram: Column,
}

pub fn macd_columns(closes: &[Decimal], fast: usize, slow: usize, signal: usize) -> MacdColumns {
    let mut macd = Macd::new(fast, slow, signal);
    let mut out = MacdColumns {
        fast_ema: Vec::with_capacity(closes.len()),
        slow_ema: Vec::with_capacity(closes.len()),
        macd: Vec::with_capacity(closes.len()),
        signal: Vec::with_capacity(closes.len()),
        histogram: Vec::with_capacity(closes.len()),
    };
    for close in closes {
        let o = macd.next_output(*close);
        out.fast_ema.push(Some(o.fast_ema));
        out.slow_ema.push(Some(o.slow_ema));
        out.macd.push(Some(o.macd));
        out.signal.push(Some(o.signal));
        out.histogram.push(Some(o.histogram));
    }
    out
}

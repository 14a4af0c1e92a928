use crate::Indicator;
use insights_core::Column;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Simple Moving Average (SMA) over a strict trailing window.
#[derive(Debug, Clone)]
pub struct Sma {
    len: usize,
    buffer: VecDeque<Decimal>,
    sum: Decimal,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "SMA period must be > 0");
        Self {
            len: period,
            buffer: VecDeque::with_capacity(period + 1),
            sum: Decimal::ZERO,
        }
    }

    /// Get the current SMA value without feeding new data.
    pub fn value(&self) -> Option<Decimal> {
        if self.buffer.len() == self.len {
            Some(self.sum / Decimal::from(self.len))
        } else {
            None
        }
    }
}

impl Indicator for Sma {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.sum += value;
        self.buffer.push_back(value);

        if self.buffer.len() > self.len {
            if let Some(removed) = self.buffer.pop_front() {
                self.sum -= removed;
            }
        }

        self.value()
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.buffer.len() == self.len
    }
}

/// Column name for an SMA of the given period, e.g. `SMA_20`.
pub fn sma_column_name(period: usize) -> String {
    format!("SMA_{}", period)
}

/// SMA over `values`; the first `period - 1` positions are undefined.
pub fn sma_column(values: &[Decimal], period: usize) -> Column {
    let mut sma = Sma::new(period);
    values.iter().map(|v| sma.next(*v)).collect()
}

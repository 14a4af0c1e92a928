use crate::Indicator;
use insights_core::Column;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Rolling sample standard deviation (n - 1 denominator) over a strict window.
///
/// Each value is a two-pass sum of squared deviations over the window, so a
/// window of identical prices is exactly zero whatever their precision.
#[derive(Debug, Clone)]
pub struct RollingStd {
    len: usize,
    buffer: VecDeque<Decimal>,
}

impl RollingStd {
    pub fn new(period: usize) -> Self {
        assert!(period > 1, "Sample standard deviation period must be > 1");
        Self {
            len: period,
            buffer: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        if self.buffer.len() < self.len {
            return None;
        }
        let n = Decimal::from(self.len);
        let denominator = n - Decimal::ONE;

        // Offsets from the first value subtract exactly, keeping the mean and
        // the squares within the window's own range.
        let origin = *self.buffer.front()?;
        let mean = self.buffer.iter().map(|v| *v - origin).sum::<Decimal>() / n;
        let variance = self
            .buffer
            .iter()
            .map(|v| {
                let deviation = *v - origin - mean;
                deviation * deviation / denominator
            })
            .sum::<Decimal>();
        Some(decimal_sqrt(variance))
    }
}

impl Indicator for RollingStd {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.buffer.push_back(value);
        if self.buffer.len() > self.len {
            self.buffer.pop_front();
        }
        self.value()
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.buffer.len() == self.len
    }
}

/// Column name for a rolling standard deviation, e.g. `STD_20`.
pub fn std_column_name(period: usize) -> String {
    format!("STD_{}", period)
}

pub fn std_column(values: &[Decimal], period: usize) -> Column {
    let mut std = RollingStd::new(period);
    values.iter().map(|v| std.next(*v)).collect()
}

/// Newton's method square root for Decimal.
pub fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = if value > Decimal::ONE {
        value / Decimal::TWO
    } else {
        Decimal::ONE
    };
    let epsilon = Decimal::new(1, 16);
    for _ in 0..200 {
        let next_guess = (guess + value / guess) / Decimal::TWO;
        let diff = (next_guess - guess).abs();
        guess = next_guess;
        if diff < epsilon {
            break;
        }
    }
    guess
}

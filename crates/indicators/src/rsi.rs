use crate::Indicator;
use insights_core::Column;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Relative Strength Index (RSI).
///
/// Average gain and loss are simple means over the trailing `period` changes.
/// Until `period` observations exist the mean expands over all of them, so the
/// indicator is defined from the very first value. The first observation
/// contributes a zero change.
#[derive(Debug, Clone)]
pub struct Rsi {
    len: usize,
    prev_value: Option<Decimal>,
    gains: VecDeque<Decimal>,
    losses: VecDeque<Decimal>,
    gain_sum: Decimal,
    loss_sum: Decimal,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "RSI period must be > 0");
        Self {
            len: period,
            prev_value: None,
            gains: VecDeque::with_capacity(period + 1),
            losses: VecDeque::with_capacity(period + 1),
            gain_sum: Decimal::ZERO,
            loss_sum: Decimal::ZERO,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        if self.gains.is_empty() {
            return None;
        }
        let n = Decimal::from(self.gains.len());
        Some(rsi_from_averages(self.gain_sum / n, self.loss_sum / n))
    }
}

/// RSI from average gain and loss.
///
/// A zero average loss means unbounded relative strength (RSI 100), except when
/// the average gain is zero too: no movement at all reads as a neutral 50.
pub fn rsi_from_averages(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        if avg_gain.is_zero() {
            return Decimal::ONE_HUNDRED / Decimal::TWO;
        }
        return Decimal::ONE_HUNDRED;
    }
    // A relative strength beyond Decimal's range reads as 100, like a zero loss.
    match avg_gain.checked_div(avg_loss) {
        Some(rs) => Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs),
        None => Decimal::ONE_HUNDRED,
    }
}

impl Indicator for Rsi {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        let change = match self.prev_value {
            Some(prev) => value - prev,
            None => Decimal::ZERO,
        };
        let gain = change.max(Decimal::ZERO);
        let loss = (-change).max(Decimal::ZERO);

        self.gains.push_back(gain);
        self.losses.push_back(loss);
        self.gain_sum += gain;
        self.loss_sum += loss;

        if self.gains.len() > self.len {
            if let (Some(g), Some(l)) = (self.gains.pop_front(), self.losses.pop_front()) {
                self.gain_sum -= g;
                self.loss_sum -= l;
            }
        }

        self.prev_value = Some(value);
        self.value()
    }

    fn reset(&mut self) {
        self.prev_value = None;
        self.gains.clear();
        self.losses.clear();
        self.gain_sum = Decimal::ZERO;
        self.loss_sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        !self.gains.is_empty()
    }
}

pub const RSI_COLUMN: &str = "RSI";

pub fn rsi_column(closes: &[Decimal], period: usize) -> Column {
    let mut rsi = Rsi::new(period);
    closes.iter().map(|v| rsi.next(*v)).collect()
}

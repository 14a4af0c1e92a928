use crate::Indicator;
use insights_core::{Bar, Column};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Average True Range (ATR).
///
/// Simple mean of the true range over a strict trailing window: undefined until
/// `period` bars have been seen. Feed via `next_hlc()`, or use `next()` with a
/// single price, which treats it as high, low and close at once.
#[derive(Debug, Clone)]
pub struct Atr {
    len: usize,
    prev_close: Option<Decimal>,
    tr_values: VecDeque<Decimal>,
    tr_sum: Decimal,
    last_tr: Option<Decimal>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "ATR period must be > 0");
        Self {
            len: period,
            prev_close: None,
            tr_values: VecDeque::with_capacity(period + 1),
            tr_sum: Decimal::ZERO,
            last_tr: None,
        }
    }

    /// Feed high, low, close and compute ATR (preferred method).
    pub fn next_hlc(&mut self, high: Decimal, low: Decimal, close: Decimal) -> Option<Decimal> {
        let tr = true_range(high, low, self.prev_close);
        self.prev_close = Some(close);
        self.last_tr = Some(tr);

        self.tr_sum += tr;
        self.tr_values.push_back(tr);
        if self.tr_values.len() > self.len {
            if let Some(removed) = self.tr_values.pop_front() {
                self.tr_sum -= removed;
            }
        }

        self.value()
    }

    pub fn value(&self) -> Option<Decimal> {
        if self.tr_values.len() == self.len {
            Some(self.tr_sum / Decimal::from(self.len))
        } else {
            None
        }
    }

    /// True range of the most recent bar.
    pub fn last_true_range(&self) -> Option<Decimal> {
        self.last_tr
    }
}

/// True range of one bar; the first bar (no previous close) uses `high - low`.
pub fn true_range(high: Decimal, low: Decimal, prev_close: Option<Decimal>) -> Decimal {
    let hl = high - low;
    match prev_close {
        Some(prev_c) => {
            let hc = (high - prev_c).abs();
            let lc = (low - prev_c).abs();
            hl.max(hc).max(lc)
        }
        None => hl,
    }
}

impl Indicator for Atr {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.next_hlc(value, value, value)
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.tr_values.clear();
        self.tr_sum = Decimal::ZERO;
        self.last_tr = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.tr_values.len() == self.len
    }
}

pub const TR_COLUMN: &str = "TR";
pub const ATR_COLUMN: &str = "ATR";

/// True range and ATR columns for a bar sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AtrColumns {
    pub true_range: Column,
    pub atr: Column,
}

pub fn atr_columns(bars: &[Bar], period: usize) -> AtrColumns {
    let mut atr = Atr::new(period);
    let mut out = AtrColumns {
        true_range: Vec::with_capacity(bars.len()),
        atr: Vec::with_capacity(bars.len()),
    };
    for bar in bars {
        out.atr.push(atr.next_hlc(bar.high, bar.low, bar.close));
        out.true_range.push(atr.last_true_range());
    }
    out
}

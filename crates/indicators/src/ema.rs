use crate::Indicator;
use insights_core::Column;
use rust_decimal::Decimal;

/// Exponential Moving Average (EMA) with `alpha = 2 / (span + 1)`.
///
/// Seeded with the first observation, so it is defined from the first value on.
#[derive(Debug, Clone)]
pub struct Ema {
    len: usize,
    multiplier: Decimal,
    current: Option<Decimal>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "EMA period must be > 0");
        let multiplier = Decimal::TWO / (Decimal::from(period) + Decimal::ONE);
        Self {
            len: period,
            multiplier,
            current: None,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        self.current
    }

    pub fn multiplier(&self) -> Decimal {
        self.multiplier
    }
}

impl Indicator for Ema {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        let ema = match self.current {
            None => value,
            Some(prev) => (value - prev) * self.multiplier + prev,
        };
        self.current = Some(ema);
        self.current
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

/// Column name for an EMA of the given span, e.g. `EMA_12`.
pub fn ema_column_name(period: usize) -> String {
    format!("EMA_{}", period)
}

pub fn ema_column(values: &[Decimal], period: usize) -> Column {
    let mut ema = Ema::new(period);
    values.iter().map(|v| ema.next(*v)).collect()
}

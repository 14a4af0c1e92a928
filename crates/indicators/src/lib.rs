pub mod atr;
pub mod bollinger;
pub mod config;
pub mod ema;
pub mod engine;
pub mod error;
pub mod macd;
pub mod plan;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use config::{IndicatorConfig, MAX_BOLLINGER_K};
pub use engine::{compute_all, compute_bars};
pub use error::{ConfigError, IndicatorError, PlanError};
pub use plan::{ExecutionPlan, IndicatorNode, PlanBuilder};

use rust_decimal::Decimal;

/// Trait for streaming (incremental) indicators.
/// Feed one value at a time; the indicator maintains internal state.
pub trait Indicator: Send + Sync {
    /// Process the next value and return the indicator output (if defined yet).
    fn next(&mut self, value: Decimal) -> Option<Decimal>;

    /// Reset the indicator to its initial state.
    fn reset(&mut self);

    /// The window length the indicator was built with.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;
}

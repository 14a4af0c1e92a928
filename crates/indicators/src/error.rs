use insights_core::{SeriesError, ValidationError};

/// Invalid indicator parameters, caught before any computation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be > 0")]
    NonPositivePeriod { field: &'static str },
    #[error("{field} must be at least {minimum}, got {period}")]
    PeriodTooShort {
        field: &'static str,
        period: usize,
        minimum: usize,
    },
    #[error("MACD fast span {fast} must be less than slow span {slow}")]
    FastNotBelowSlow { fast: usize, slow: usize },
    #[error("Bollinger multiplier must be > 0, got {0}")]
    NonPositiveMultiplier(rust_decimal::Decimal),
    #[error("Bollinger multiplier {value} exceeds the maximum {maximum}")]
    MultiplierTooLarge {
        value: rust_decimal::Decimal,
        maximum: rust_decimal::Decimal,
    },
    #[error("Config parse error: {0}")]
    Parse(String),
    #[error("Config serialize error: {0}")]
    Serialize(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Problems assembling the indicator dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Cyclic dependency involving {0}")]
    CyclicDependency(String),
    #[error("{node} depends on unknown node {dependency}")]
    MissingDependency { node: String, dependency: String },
    #[error("Node {0} registered twice")]
    DuplicateNode(String),
}

/// Any failure of a full indicator run. The input series is never modified.
#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    #[error("Invalid series: {0}")]
    Validation(#[from] ValidationError),
    #[error("Column error: {0}")]
    Series(#[from] SeriesError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid indicator plan: {0}")]
    Plan(#[from] PlanError),
}

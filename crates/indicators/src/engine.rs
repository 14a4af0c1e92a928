use insights_core::{Bar, Series};
use tracing::{debug, info};

use crate::config::IndicatorConfig;
use crate::error::IndicatorError;
use crate::plan::ExecutionPlan;

/// Compute every indicator in `config` over `series`.
///
/// Nodes run in dependency order against a staged copy; the enriched copy is
/// returned and `series` itself is never touched, so a failure leaves no
/// partial columns behind. Re-running over an already enriched series
/// overwrites each column with identical values.
pub fn compute_all(series: &Series, config: &IndicatorConfig) -> Result<Series, IndicatorError> {
    config.validate()?;
    let plan = ExecutionPlan::from_config(config)?;

    let mut staged = series.clone();
    for node in plan.nodes() {
        let outputs = node.compute(&staged)?;
        debug!(node = %node.id(), columns = outputs.len(), "Computed indicator");
        for (name, column) in outputs {
            staged.set_column(name, column)?;
        }
    }

    info!(
        symbol = staged.symbol().unwrap_or("-"),
        bars = staged.len(),
        columns = staged.columns().len(),
        "Computed indicator columns"
    );
    Ok(staged)
}

/// Validate a raw bar sequence and compute every indicator over it.
pub fn compute_bars(bars: Vec<Bar>, config: &IndicatorConfig) -> Result<Series, IndicatorError> {
    let series = Series::from_bars(bars)?;
    compute_all(&series, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use chrono::{Days, NaiveDate};
    use insights_core::{ValidationError, MAX_PRICE};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bars_from_closes(closes: &[Decimal]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let date = start.checked_add_days(Days::new(i as u64)).unwrap();
                Bar::new(date, *c, *c + dec!(0.5), *c - dec!(0.5), *c, dec!(1000))
            })
            .collect()
    }

    /// Bars from float quotes as a market-data feed delivers them: `(close, high%, low%)`.
    fn float_bars(quotes: &[(f64, f64, f64)]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        quotes
            .iter()
            .enumerate()
            .map(|(i, (close, up, down))| {
                let date = start.checked_add_days(Days::new(i as u64)).unwrap();
                let (high, low) = (close * (1.0 + up), close * (1.0 - down));
                Bar::from_f64(date, *close, high, low, *close, 250000.0).unwrap()
            })
            .collect()
    }

    fn wavy_closes(n: usize) -> Vec<Decimal> {
        (0..n)
            .map(|i| dec!(100) + Decimal::from((i * 13) % 17) - Decimal::from(i % 5) / dec!(4))
            .collect()
    }

    fn flat_series(n: usize) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..n)
            .map(|i| {
                let date = start.checked_add_days(Days::new(i as u64)).unwrap();
                Bar::new(date, dec!(10), dec!(10), dec!(10), dec!(10), dec!(500))
            })
            .collect();
        Series::from_bars(bars).unwrap()
    }

    #[test]
    fn test_compute_all_writes_every_column() {
        let series = Series::from_bars(bars_from_closes(&wavy_closes(40))).unwrap();
        let out = compute_all(&series, &IndicatorConfig::default()).unwrap();
        let plan = ExecutionPlan::from_config(&IndicatorConfig::default()).unwrap();
        for name in plan.output_columns() {
            assert_eq!(out.get_column(&name).unwrap().len(), 40, "{}", name);
        }
        assert_eq!(out.columns().len(), plan.output_columns().len());
        // input untouched
        assert!(series.columns().is_empty());
    }

    #[test]
    fn test_properties_over_default_config() {
        let series = Series::from_bars(bars_from_closes(&wavy_closes(60))).unwrap();
        let out = compute_all(&series, &IndicatorConfig::default()).unwrap();

        for v in out.get_column("RSI").unwrap() {
            let v = v.unwrap();
            assert!(v >= Decimal::ZERO && v <= dec!(100));
        }

        let atr = out.get_column("ATR").unwrap();
        assert!(atr[..13].iter().all(Option::is_none));
        assert!(atr[13..].iter().all(|v| v.unwrap() >= Decimal::ZERO));

        for p in [5, 10, 20, 30] {
            let sma = out.get_column(&format!("SMA_{}", p)).unwrap();
            assert!(sma[..p - 1].iter().all(Option::is_none));
            assert!(sma[p - 1..].iter().all(Option::is_some));
        }

        for name in ["MACD", "Signal_Line", "MACD_Histogram", "EMA_12", "EMA_26"] {
            assert!(out.get_column(name).unwrap().iter().all(Option::is_some), "{}", name);
        }

        let upper = out.get_column("Bollinger_Upper").unwrap();
        let lower = out.get_column("Bollinger_Lower").unwrap();
        let std = out.get_column("STD_20").unwrap();
        for i in 0..60 {
            match (upper[i], lower[i]) {
                (Some(u), Some(l)) => {
                    assert!(u >= l);
                    assert_eq!(u == l, std[i].unwrap().is_zero());
                }
                (None, None) => assert!(i < 19),
                _ => panic!("bands defined asymmetrically at {}", i),
            }
        }
    }

    #[test]
    fn test_flat_series_scenario() {
        let out = compute_all(&flat_series(15), &IndicatorConfig::default()).unwrap();
        assert!(out.get_column("RSI").unwrap().iter().all(|v| *v == Some(dec!(50))));
        let atr = out.get_column("ATR").unwrap();
        assert_eq!(atr[13], Some(Decimal::ZERO));
        assert_eq!(atr[14], Some(Decimal::ZERO));
        // 15 bars never fill the 20-bar band window
        assert!(out.get_column("Bollinger_Upper").unwrap().iter().all(Option::is_none));
    }

    #[test]
    fn test_short_sma_scenario() {
        let config = IndicatorConfig {
            sma_periods: [3].into_iter().collect(),
            bollinger_period: 3,
            ..Default::default()
        };
        let closes = [dec!(10), dec!(12), dec!(11), dec!(13), dec!(15)];
        let out = compute_bars(bars_from_closes(&closes), &config).unwrap();
        assert_eq!(
            out.get_column("SMA_3").unwrap(),
            &[None, None, Some(dec!(11)), Some(dec!(12)), Some(dec!(13))]
        );
    }

    #[test]
    fn test_rising_series_rsi_reaches_100() {
        let closes: Vec<Decimal> = (1..=30).map(Decimal::from).collect();
        let out = compute_bars(bars_from_closes(&closes), &IndicatorConfig::default()).unwrap();
        let rsi = out.get_column("RSI").unwrap();
        assert_eq!(rsi[0], Some(dec!(50)));
        assert_eq!(rsi[29], Some(dec!(100)));
    }

    #[test]
    fn test_idempotent() {
        let series = Series::from_bars(bars_from_closes(&wavy_closes(45))).unwrap();
        let config = IndicatorConfig::default();
        let once = compute_all(&series, &config).unwrap();
        let twice = compute_all(&once, &config).unwrap();
        assert_eq!(once, twice);
        assert_eq!(compute_all(&series, &config).unwrap(), once);
    }

    #[test]
    fn test_round_trip_through_bars() {
        let config = IndicatorConfig::default();
        let out = compute_bars(bars_from_closes(&wavy_closes(35)), &config).unwrap();
        let again = compute_bars(out.bars().to_vec(), &config).unwrap();
        assert_eq!(out.columns(), again.columns());
    }

    #[test]
    fn test_invalid_config_fails_atomically() {
        let series = Series::from_bars(bars_from_closes(&wavy_closes(10))).unwrap();
        let config = IndicatorConfig {
            macd_fast: 30,
            ..Default::default()
        };
        let err = compute_all(&series, &config).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::Config(ConfigError::FastNotBelowSlow { fast: 30, slow: 26 })
        ));
        assert!(series.columns().is_empty());
    }

    #[test]
    fn test_invalid_bars_rejected_before_compute() {
        let err = compute_bars(Vec::new(), &IndicatorConfig::default()).unwrap_err();
        assert!(matches!(err, IndicatorError::Validation(ValidationError::EmptySeries)));

        let mut bars = bars_from_closes(&wavy_closes(5));
        bars.swap(1, 2);
        let err = compute_bars(bars, &IndicatorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::Validation(ValidationError::UnsortedDates { index: 2, .. })
        ));
    }

    #[test]
    fn test_flat_float_quotes_collapse_bands() {
        for quote in [1523.449951171875_f64, 1234.567890123456789] {
            let out = compute_bars(float_bars(&vec![(quote, 0.0, 0.0); 30]), &IndicatorConfig::default())
                .unwrap();
            let std = out.get_column("STD_20").unwrap();
            let upper = out.get_column("Bollinger_Upper").unwrap();
            let lower = out.get_column("Bollinger_Lower").unwrap();
            for i in 19..30 {
                assert_eq!(std[i], Some(Decimal::ZERO), "{} at {}", quote, i);
                assert_eq!(upper[i], lower[i], "{} at {}", quote, i);
            }
        }
    }

    #[test]
    fn test_prices_above_maximum_rejected() {
        let closes: Vec<Decimal> = (0..25).map(|i| dec!(30000000000000) + Decimal::from(i)).collect();
        let err = compute_bars(bars_from_closes(&closes), &IndicatorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::Validation(ValidationError::PriceTooLarge { index: 0, field: "open", .. })
        ));
    }

    #[test]
    fn test_extreme_price_swings_compute() {
        // highs land exactly on the maximum
        let top = MAX_PRICE - dec!(0.5);
        let closes: Vec<Decimal> = (0..40)
            .map(|i| if i % 2 == 0 { dec!(1) } else { top })
            .collect();
        let out = compute_bars(bars_from_closes(&closes), &IndicatorConfig::default()).unwrap();

        for v in out.get_column("STD_20").unwrap()[19..].iter() {
            assert!(v.unwrap() > Decimal::ZERO);
        }
        for v in out.get_column("RSI").unwrap() {
            let v = v.unwrap();
            assert!(v >= Decimal::ZERO && v <= dec!(100));
        }
        let upper = out.get_column("Bollinger_Upper").unwrap();
        let lower = out.get_column("Bollinger_Lower").unwrap();
        assert!(upper[19].unwrap() > lower[19].unwrap());
    }

    fn random_walk() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
        (
            5.0..5000.0_f64,
            prop::collection::vec((-0.04..0.04_f64, 0.0..0.02_f64, 0.0..0.02_f64), 25..90),
        )
            .prop_map(|(start, steps)| {
                let mut close = start;
                steps
                    .into_iter()
                    .map(|(step, up, down)| {
                        close *= 1.0 + step;
                        (close, up, down)
                    })
                    .collect()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_float_quotes_keep_indicator_bounds(quotes in random_walk()) {
            let out = compute_bars(float_bars(&quotes), &IndicatorConfig::default()).unwrap();

            for v in out.get_column("RSI").unwrap().iter().flatten() {
                prop_assert!(*v >= Decimal::ZERO && *v <= dec!(100));
            }
            for v in out.get_column("ATR").unwrap().iter().flatten() {
                prop_assert!(*v >= Decimal::ZERO);
            }
            let std = out.get_column("STD_20").unwrap();
            let upper = out.get_column("Bollinger_Upper").unwrap();
            let lower = out.get_column("Bollinger_Lower").unwrap();
            for i in 0..out.len() {
                if let (Some(sd), Some(u), Some(l)) = (std[i], upper[i], lower[i]) {
                    prop_assert!(sd >= Decimal::ZERO);
                    prop_assert!(u >= l);
                }
            }
        }

        #[test]
        fn prop_flat_float_quotes_have_zero_deviation(quote in 0.5..20000.0_f64, len in 20usize..45) {
            let out = compute_bars(float_bars(&vec![(quote, 0.0, 0.0); len]), &IndicatorConfig::default())
                .unwrap();
            let std = out.get_column("STD_20").unwrap();
            prop_assert!(std[19..].iter().all(|v| *v == Some(Decimal::ZERO)));
            prop_assert_eq!(out.get_column("Bollinger_Upper").unwrap(), out.get_column("Bollinger_Lower").unwrap());
            prop_assert!(out.get_column("RSI").unwrap().iter().all(|v| *v == Some(dec!(50))));
        }
    }
}

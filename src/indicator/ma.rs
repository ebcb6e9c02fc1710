use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, Series, close_prices, defined, rolling_mean};
use crate::model::Bar;

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Series {
        rolling_mean(&defined(prices), self.period)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_prices(&close_prices(bars))
    }
}

/// Exponential Moving Average.
///
/// Seeded with the first price and without warm-up bias correction, so every
/// entry is defined.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<f64> {
        let k = 2.0 / (self.period as f64 + 1.0);
        let mut results = Vec::with_capacity(prices.len());
        let Some(&seed) = prices.first() else {
            return results;
        };

        let mut ema = seed;
        results.push(ema);
        for &price in &prices[1..] {
            ema = price * k + ema * (1.0 - k);
            results.push(ema);
        }
        results
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        "ema"
    }

    fn required_bars(&self) -> usize {
        1
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        defined(&self.calculate_prices(&close_prices(bars)))
    }
}

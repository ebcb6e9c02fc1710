use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, Series, close_prices, rolling_std};
use crate::model::Bar;

/// Rolling sample standard deviation of bar-to-bar percentage change.
pub struct Volatility {
    period: usize,
}

impl Volatility {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be >= 2".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Series {
        rolling_std(&pct_change(prices), self.period)
    }
}

/// Percentage change from the previous price; undefined after a zero price.
fn pct_change(prices: &[f64]) -> Series {
    (0..prices.len())
        .map(|i| {
            let prev = prices[i.checked_sub(1)?];
            (prev != 0.0).then(|| prices[i] / prev - 1.0)
        })
        .collect()
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        "volatility"
    }

    fn required_bars(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_prices(&close_prices(bars))
    }
}

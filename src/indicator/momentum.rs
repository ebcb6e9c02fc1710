use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, Series, close_prices};
use crate::model::Bar;

/// Price change over `period` bars: `price[i] - price[i - period]`.
pub struct Momentum {
    period: usize,
}

impl Momentum {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Series {
        (0..prices.len())
            .map(|i| {
                i.checked_sub(self.period)
                    .map(|back| prices[i] - prices[back])
            })
            .collect()
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn required_bars(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_prices(&close_prices(bars))
    }
}

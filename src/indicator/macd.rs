use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::ma::Ema;
use crate::indicator::{Indicator, Series, close_prices};
use crate::model::Bar;

/// MACD, signal and histogram lines aligned with the input prices.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    slow_period: usize,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidParameter {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast: Ema::new(fast_period)?,
            slow: Ema::new(slow_period)?,
            signal: Ema::new(signal_period)?,
            slow_period,
        })
    }

    /// The 12/26/9 configuration.
    pub fn standard() -> Result<Self, Report<IndicatorError>> {
        Self::new(12, 26, 9)
    }

    /// Both EMAs run from the first price. Entries before the slow span has
    /// seen `slow_period` prices are reported as undefined.
    pub fn calculate_full(&self, prices: &[f64]) -> MacdLines {
        let fast = self.fast.calculate_prices(prices);
        let slow = self.slow.calculate_prices(prices);

        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = self.signal.calculate_prices(&macd);

        let warm_up = self.slow_period - 1;
        let mask = |values: Vec<f64>| -> Series {
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i >= warm_up).then_some(v))
                .collect()
        };

        let histogram: Vec<f64> = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

        MacdLines {
            macd: mask(macd),
            signal: mask(signal),
            histogram: mask(histogram),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn required_bars(&self) -> usize {
        self.slow_period
    }

    /// Returns MACD line values only.
    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_full(&close_prices(bars)).macd
    }
}

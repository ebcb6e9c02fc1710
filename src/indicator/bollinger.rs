use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Indicator, Series, close_prices, defined, rolling_std_about};
use crate::model::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct Bands {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

/// Bollinger Bands around an SMA, using the sample standard deviation
/// (ddof = 1) of each window.
pub struct BollingerBands {
    sma: Sma,
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        if period < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be >= 2".into(),
            });
        }
        if std_dev_multiplier <= 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "std_dev_multiplier must be > 0".into(),
            });
        }
        Ok(Self {
            sma: Sma::new(period)?,
            period,
            std_dev_multiplier,
        })
    }

    pub fn calculate_bands(&self, prices: &[f64]) -> Bands {
        let middle = self.sma.calculate_prices(prices);
        let std_dev = rolling_std_about(&defined(prices), &middle, self.period);

        let (upper, lower): (Series, Series) = middle
            .iter()
            .zip(&std_dev)
            .map(|(m, sd)| match (m, sd) {
                (Some(m), Some(sd)) => (
                    Some(m + self.std_dev_multiplier * sd),
                    Some(m - self.std_dev_multiplier * sd),
                ),
                _ => (None, None),
            })
            .unzip();

        Bands {
            upper,
            middle,
            lower,
        }
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    /// Returns middle band (SMA) values only.
    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_bands(&close_prices(bars)).middle
    }
}

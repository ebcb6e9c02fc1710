use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, Series, close_prices, rolling_mean};
use crate::model::Bar;

/// RSI (Relative Strength Index) over simple rolling means of gains and losses.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Series {
        // The first price has no predecessor, so its delta is undefined.
        let deltas: Series = std::iter::once(None)
            .chain(prices.windows(2).map(|w| Some(w[1] - w[0])))
            .take(prices.len())
            .collect();

        let gains: Series = deltas.iter().map(|d| d.map(|d| d.max(0.0))).collect();
        let losses: Series = deltas.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        avg_gain
            .into_iter()
            .zip(avg_loss)
            .map(|(gain, loss)| Some(rsi_value(gain?, loss?)))
            .collect()
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_bars(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_prices(&close_prices(bars))
    }
}

/// A window without losses is fully overbought: RSI is 100, not NaN.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    // Running sums can leave a residue just below zero.
    let avg_gain = avg_gain.max(0.0);
    let avg_loss = avg_loss.max(0.0);
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

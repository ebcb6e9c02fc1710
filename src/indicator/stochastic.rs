use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{
    Indicator, Series, close_prices, high_prices, low_prices, rolling_max, rolling_min,
};
use crate::model::Bar;

/// Stochastic oscillator %K. Undefined where the window's high-low range is zero.
pub struct Stochastic {
    period: usize,
}

impl Stochastic {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        "stochastic_k"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        let closes = close_prices(bars);
        let lowest = rolling_min(&low_prices(bars), self.period);
        let highest = rolling_max(&high_prices(bars), self.period);

        closes
            .iter()
            .zip(lowest.iter().zip(&highest))
            .map(|(close, (low, high))| {
                let (low, high) = ((*low)?, (*high)?);
                let range = high - low;
                (range > 0.0).then(|| 100.0 * (close - low) / range)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{bars_from_closes, bars_with_wicks};

    #[test]
    fn stochastic_period_zero_invalid() {
        assert!(Stochastic::new(0).is_err());
    }

    #[test]
    fn stochastic_zero_range_undefined() {
        let values = Stochastic::new(5).unwrap().calculate(&bars_from_closes(&[1.1; 10]));
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn stochastic_close_at_window_high_is_100() {
        let values = Stochastic::new(3).unwrap().calculate(&bars_from_closes(&[1.0, 2.0, 3.0]));
        assert_eq!(values[2], Some(100.0));
    }

    #[test]
    fn stochastic_bounded() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 1.05 + 0.002 * ((i as f64) * 0.9).sin())
            .collect();
        let values = Stochastic::new(14).unwrap().calculate(&bars_with_wicks(&closes, 0.0003));
        assert!(values[..13].iter().all(Option::is_none));
        for v in values.iter().flatten() {
            assert!((0.0..=100.0).contains(v), "%K out of range: {v}");
        }
    }
}

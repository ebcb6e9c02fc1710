use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, Series, defined, rolling_mean};
use crate::model::Bar;

/// True range per bar. The first bar has no previous close, so its range is
/// just `high - low`.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let high_low = bar.high - bar.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev_close) => high_low
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs()),
                None => high_low,
            }
        })
        .collect()
}

/// Average True Range as a simple rolling mean of the true range.
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        "atr"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        rolling_mean(&defined(&true_range(bars)), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{bars_from_closes, bars_with_wicks};

    #[test]
    fn atr_period_zero_invalid() {
        assert!(Atr::new(0).is_err());
    }

    #[test]
    fn true_range_uses_gap_from_previous_close() {
        let mut bars = bars_from_closes(&[1.0, 1.0]);
        bars[1].open = 1.5;
        bars[1].high = 1.6;
        bars[1].low = 1.4;
        bars[1].close = 1.5;
        let tr = true_range(&bars);
        assert_eq!(tr[0], 0.0);
        // |1.6 - 1.0| dominates 1.6 - 1.4
        assert!((tr[1] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn atr_constant_wicks() {
        let bars = bars_with_wicks(&[2.0; 10], 0.5);
        let atr = Atr::new(3).unwrap().calculate(&bars);
        assert_eq!(atr[1], None);
        for v in atr[2..].iter() {
            assert!((v.unwrap() - 1.0).abs() < 1e-9);
        }
    }
}

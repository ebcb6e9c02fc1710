use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, Series};
use crate::model::Bar;

/// Parabolic stop-and-reverse.
///
/// The first two entries are the closes themselves and the trend starts up.
/// On each bar the SAR moves toward the trend's extreme point by the
/// acceleration factor, which grows by `step` on every new extreme up to
/// `max_step`. Price crossing the SAR flips the trend and resets the factor.
pub struct ParabolicSar {
    step: f64,
    max_step: f64,
}

impl ParabolicSar {
    pub fn new(step: f64, max_step: f64) -> Result<Self, Report<IndicatorError>> {
        if step <= 0.0 || max_step < step {
            bail!(IndicatorError::InvalidParameter {
                name: "require 0 < step <= max_step".into(),
            });
        }
        Ok(Self { step, max_step })
    }

    pub fn standard() -> Result<Self, Report<IndicatorError>> {
        Self::new(0.02, 0.2)
    }

    pub fn calculate_values(&self, bars: &[Bar]) -> Vec<f64> {
        let mut sar: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let Some(first) = bars.first() else {
            return sar;
        };

        let mut up_trend = true;
        let mut af = self.step;
        let mut extreme_high = first.high;
        let mut extreme_low = first.low;

        for i in 2..bars.len() {
            let bar = &bars[i];
            let prev = sar[i - 1];
            let mut reversal = false;

            if up_trend {
                let mut value = prev + af * (extreme_high - prev);
                if bar.low < value {
                    reversal = true;
                    value = extreme_high;
                    extreme_low = bar.low;
                    af = self.step;
                } else {
                    if bar.high > extreme_high {
                        extreme_high = bar.high;
                        af = (af + self.step).min(self.max_step);
                    }
                    // SAR never rises above the prior two lows.
                    value = value.min(bars[i - 1].low).min(bars[i - 2].low);
                }
                sar[i] = value;
            } else {
                let mut value = prev - af * (prev - extreme_low);
                if bar.high > value {
                    reversal = true;
                    value = extreme_low;
                    extreme_high = bar.high;
                    af = self.step;
                } else {
                    if bar.low < extreme_low {
                        extreme_low = bar.low;
                        af = (af + self.step).min(self.max_step);
                    }
                    // SAR never falls below the prior two highs.
                    value = value.max(bars[i - 1].high).max(bars[i - 2].high);
                }
                sar[i] = value;
            }

            if reversal {
                up_trend = !up_trend;
            }
        }
        sar
    }
}

impl Indicator for ParabolicSar {
    fn name(&self) -> &str {
        "psar"
    }

    fn required_bars(&self) -> usize {
        1
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_values(bars).into_iter().map(Some).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::bars_with_wicks;

    #[test]
    fn psar_invalid_steps() {
        assert!(ParabolicSar::new(0.0, 0.2).is_err());
        assert!(ParabolicSar::new(0.3, 0.2).is_err());
    }

    #[test]
    fn psar_seeded_with_closes() {
        let bars = bars_with_wicks(&[1.0, 1.01, 1.02], 0.001);
        let sar = ParabolicSar::standard().unwrap().calculate_values(&bars);
        assert_eq!(sar.len(), 3);
        assert_eq!(sar[0], 1.0);
        assert_eq!(sar[1], 1.01);
    }

    #[test]
    fn psar_trails_below_rising_prices() {
        let closes: Vec<f64> = (0..40).map(|i| 1.0 + 0.01 * i as f64).collect();
        let bars = bars_with_wicks(&closes, 0.001);
        let sar = ParabolicSar::standard().unwrap().calculate_values(&bars);
        for i in 2..bars.len() {
            assert!(sar[i] <= bars[i].low, "sar above low at {i}");
        }
    }

    #[test]
    fn psar_flips_above_after_crash() {
        let mut closes: Vec<f64> = (0..20).map(|i| 1.0 + 0.01 * i as f64).collect();
        closes.extend((1..=10).map(|i| 1.19 - 0.03 * i as f64));
        let bars = bars_with_wicks(&closes, 0.001);
        let sar = ParabolicSar::standard().unwrap().calculate_values(&bars);
        let last = bars.len() - 1;
        assert!(sar[last] > bars[last].high);
    }

    #[test]
    fn psar_empty_input() {
        assert!(ParabolicSar::standard().unwrap().calculate_values(&[]).is_empty());
    }
}

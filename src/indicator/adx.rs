use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::atr::Atr;
use crate::indicator::{Indicator, Series, high_prices, low_prices, rolling_mean};
use crate::model::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalIndex {
    pub adx: Series,
    pub plus_di: Series,
    pub minus_di: Series,
}

/// Average Directional Index with simple rolling means throughout.
///
/// +DI/-DI are undefined where the ATR is zero, and DX is undefined where
/// +DI + -DI is zero. ADX inherits any undefined DX inside its window.
pub struct Adx {
    period: usize,
    atr: Atr,
}

impl Adx {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self {
            period,
            atr: Atr::new(period)?,
        })
    }

    pub fn calculate_full(&self, bars: &[Bar]) -> DirectionalIndex {
        let highs = high_prices(bars);
        let lows = low_prices(bars);

        let movement = |f: &dyn Fn(usize) -> f64| -> Series {
            (0..bars.len())
                .map(|i| (i > 0).then(|| f(i).max(0.0)))
                .collect()
        };
        let plus_dm = movement(&|i| highs[i] - highs[i - 1]);
        let minus_dm = movement(&|i| lows[i - 1] - lows[i]);

        let atr = self.atr.calculate(bars);
        let plus_di = directional_index(&rolling_mean(&plus_dm, self.period), &atr);
        let minus_di = directional_index(&rolling_mean(&minus_dm, self.period), &atr);

        let dx: Series = plus_di
            .iter()
            .zip(&minus_di)
            .map(|(p, m)| {
                let (p, m) = ((*p)?, (*m)?);
                let total = p + m;
                (total > 0.0).then(|| 100.0 * (p - m).abs() / total)
            })
            .collect();

        let adx = rolling_mean(&dx, self.period)
            .into_iter()
            .map(|v| v.map(|v| v.clamp(0.0, 100.0)))
            .collect();

        DirectionalIndex {
            adx,
            plus_di,
            minus_di,
        }
    }
}

fn directional_index(smoothed_dm: &[Option<f64>], atr: &[Option<f64>]) -> Series {
    smoothed_dm
        .iter()
        .zip(atr)
        .map(|(dm, atr)| {
            let (dm, atr) = ((*dm)?, (*atr)?);
            (atr > 0.0).then(|| 100.0 * dm.max(0.0) / atr)
        })
        .collect()
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        "adx"
    }

    /// One window to smooth +DM/-DM and a second to average DX.
    fn required_bars(&self) -> usize {
        2 * self.period
    }

    /// Returns ADX values only.
    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_full(bars).adx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::latest;
    use crate::model::test_support::{bars_from_closes, bars_with_wicks};

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1.1 + 0.001 * i as f64).collect()
    }

    #[test]
    fn adx_period_zero_invalid() {
        assert!(Adx::new(0).is_err());
    }

    #[test]
    fn adx_first_defined_after_two_windows() {
        let adx = Adx::new(14).unwrap();
        let values = adx.calculate(&bars_with_wicks(&rising(28), 0.0005));
        assert!(values[..27].iter().all(Option::is_none));
        assert!(values[27].is_some());
        assert_eq!(latest(&adx.calculate(&bars_with_wicks(&rising(27), 0.0005))), None);
    }

    #[test]
    fn adx_strong_uptrend() {
        let full = Adx::new(14)
            .unwrap()
            .calculate_full(&bars_with_wicks(&rising(60), 0.0005));
        let plus = latest(&full.plus_di).unwrap();
        let minus = latest(&full.minus_di).unwrap();
        assert!(plus > minus);
        assert!((latest(&full.adx).unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn adx_flat_market_undefined() {
        let full = Adx::new(14).unwrap().calculate_full(&bars_from_closes(&[1.1; 60]));
        assert!(full.adx.iter().all(Option::is_none));
        assert!(full.plus_di.iter().all(Option::is_none));
    }

    #[test]
    fn adx_directional_index_undefined_once_market_goes_flat() {
        let mut closes = vec![1.1, 1.3, 1.2, 1.7, 1.4, 1.9, 1.6, 2.1, 1.8, 2.3];
        closes.extend([1.9; 20]);
        let bars = bars_from_closes(&closes);
        let atr = Atr::new(14).unwrap().calculate(&bars);
        assert_eq!(atr[29], Some(0.0));
        let full = Adx::new(14).unwrap().calculate_full(&bars);
        assert_eq!(full.plus_di[29], None);
        assert_eq!(full.minus_di[29], None);
    }

    #[test]
    fn adx_bounded() {
        let closes: Vec<f64> = (0..150)
            .map(|i| 1.25 + 0.003 * ((i as f64) * 0.37).sin() + 0.001 * ((i as f64) * 1.3).cos())
            .collect();
        let full = Adx::new(14).unwrap().calculate_full(&bars_with_wicks(&closes, 0.0004));
        for series in [&full.adx, &full.plus_di, &full.minus_di] {
            for v in series.iter().flatten() {
                assert!(*v >= 0.0);
            }
        }
        for v in full.adx.iter().flatten() {
            assert!(*v <= 100.0);
        }
    }
}

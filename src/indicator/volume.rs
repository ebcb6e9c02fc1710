use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, Series, defined, latest, rolling_mean, volumes};
use crate::model::Bar;

/// Simple moving average of traded volume.
pub struct VolumeMA {
    period: usize,
}

impl VolumeMA {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Whether the most recent volume is above its rolling average.
    ///
    /// `None` when there are fewer than `period` bars.
    pub fn signal(&self, bars: &[Bar]) -> Option<bool> {
        let average = latest(&self.calculate(bars))?;
        let current = bars.last()?.volume;
        Some(current > average)
    }
}

impl Indicator for VolumeMA {
    fn name(&self) -> &str {
        "volume_ma"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    /// Returns volume MA values.
    fn calculate(&self, bars: &[Bar]) -> Series {
        rolling_mean(&defined(&volumes(bars)), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::bars_from_closes;

    fn bars_with_volumes(vols: &[f64]) -> Vec<Bar> {
        let mut bars = bars_from_closes(&vec![100.0; vols.len()]);
        for (bar, &v) in bars.iter_mut().zip(vols) {
            bar.volume = v;
        }
        bars
    }

    #[test]
    fn volume_ma_period_zero_invalid() {
        assert!(VolumeMA::new(0).is_err());
    }

    #[test]
    fn volume_ma_known_value() {
        let vma = VolumeMA::new(3).unwrap();
        let values = vma.calculate(&bars_with_volumes(&[1.0, 2.0, 3.0, 4.0]));
        // (1+2+3)/3 = 2.0, (2+3+4)/3 = 3.0
        assert!((values[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((values[3].unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn volume_signal_detects_surge() {
        let vma = VolumeMA::new(3).unwrap();
        assert_eq!(vma.signal(&bars_with_volumes(&[1.0, 1.0, 1.0, 5.0])), Some(true));
        assert_eq!(vma.signal(&bars_with_volumes(&[5.0, 5.0, 5.0, 1.0])), Some(false));
    }

    #[test]
    fn volume_signal_flat_is_not_above() {
        let vma = VolumeMA::new(3).unwrap();
        assert_eq!(vma.signal(&bars_with_volumes(&[2.0; 5])), Some(false));
    }

    #[test]
    fn volume_signal_insufficient_bars() {
        let vma = VolumeMA::new(20).unwrap();
        assert_eq!(vma.signal(&bars_with_volumes(&[1.0; 5])), None);
    }
}

use crate::indicator::{Indicator, Series, close_prices, volumes};
use crate::model::Bar;

/// Volume-weighted average price accumulated from the first bar.
///
/// Not a rolling window: every entry covers the whole prefix. Undefined while
/// no volume has traded.
pub fn vwap(prices: &[f64], volumes: &[f64]) -> Series {
    let mut cumulative_pv = 0.0;
    let mut cumulative_volume = 0.0;
    prices
        .iter()
        .zip(volumes)
        .map(|(price, volume)| {
            cumulative_pv += price * volume;
            cumulative_volume += volume;
            (cumulative_volume > 0.0).then(|| cumulative_pv / cumulative_volume)
        })
        .collect()
}

pub struct Vwap;

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn required_bars(&self) -> usize {
        1
    }

    fn calculate(&self, bars: &[Bar]) -> Series {
        vwap(&close_prices(bars), &volumes(bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vwap_running_accumulation() {
        let values = vwap(&[1.0, 2.0, 4.0], &[1.0, 1.0, 2.0]);
        assert_eq!(values[0], Some(1.0));
        assert!((values[1].unwrap() - 1.5).abs() < 1e-12);
        // (1 + 2 + 8) / 4
        assert!((values[2].unwrap() - 2.75).abs() < 1e-12);
    }

    #[test]
    fn vwap_zero_volume_prefix_undefined() {
        let values = vwap(&[1.0, 2.0], &[0.0, 3.0]);
        assert_eq!(values[0], None);
        assert_eq!(values[1], Some(2.0));
    }
}

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, Series, high_prices, low_prices, rolling_max, rolling_min};
use crate::model::Bar;

/// Leading spans of the Ichimoku cloud, unshifted (aligned with the bar that
/// produced them).
#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuLines {
    pub span_a: Series,
    pub span_b: Series,
}

pub struct Ichimoku {
    conversion_period: usize,
    base_period: usize,
    span_b_period: usize,
}

impl Ichimoku {
    pub fn new(
        conversion_period: usize,
        base_period: usize,
        span_b_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if conversion_period == 0 || base_period == 0 || span_b_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        Ok(Self {
            conversion_period,
            base_period,
            span_b_period,
        })
    }

    /// The 9/26/52 configuration.
    pub fn standard() -> Result<Self, Report<IndicatorError>> {
        Self::new(9, 26, 52)
    }

    pub fn calculate_lines(&self, bars: &[Bar]) -> IchimokuLines {
        let highs = high_prices(bars);
        let lows = low_prices(bars);

        let conversion = midpoint(&highs, &lows, self.conversion_period);
        let base = midpoint(&highs, &lows, self.base_period);
        let span_a = conversion
            .iter()
            .zip(&base)
            .map(|(c, b)| Some((c.as_ref()? + b.as_ref()?) / 2.0))
            .collect();

        IchimokuLines {
            span_a,
            span_b: midpoint(&highs, &lows, self.span_b_period),
        }
    }
}

/// Midpoint of the highest high and lowest low over `period` bars.
fn midpoint(highs: &[f64], lows: &[f64], period: usize) -> Series {
    rolling_max(highs, period)
        .into_iter()
        .zip(rolling_min(lows, period))
        .map(|(high, low)| Some((high? + low?) / 2.0))
        .collect()
}

impl Indicator for Ichimoku {
    fn name(&self) -> &str {
        "ichimoku"
    }

    fn required_bars(&self) -> usize {
        self.span_b_period
    }

    /// Returns span A only.
    fn calculate(&self, bars: &[Bar]) -> Series {
        self.calculate_lines(bars).span_a
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::SeriesError;

/// Bar interval in minutes.
///
/// Only the intervals offered by the upstream forex feed are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Min5,
    Min15,
    Hour1,
    Hour4,
}

impl Interval {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            5 => Some(Self::Min5),
            15 => Some(Self::Min15),
            60 => Some(Self::Hour1),
            240 => Some(Self::Hour4),
            _ => None,
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Min5 => 5,
            Self::Min15 => 15,
            Self::Hour1 => 60,
            Self::Hour4 => 240,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns the reason this bar violates the OHLCV invariants, if any.
    fn violation(&self) -> Option<String> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Some("non-finite field".into());
        }
        if self.volume < 0.0 {
            return Some(format!("negative volume {}", self.volume));
        }
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || body_high > self.high {
            return Some(format!(
                "OHLC out of order: o={} h={} l={} c={}",
                self.open, self.high, self.low, self.close
            ));
        }
        None
    }
}

/// Validated bars in strictly increasing timestamp order.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and wrap `bars`. A violating series is rejected, never repaired.
    pub fn new(bars: Vec<Bar>) -> Result<Self, Report<SeriesError>> {
        for (index, bar) in bars.iter().enumerate() {
            if let Some(reason) = bar.violation() {
                bail!(SeriesError::InvalidBar { index, reason });
            }
        }
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                bail!(SeriesError::InvalidBar {
                    index: index + 1,
                    reason: format!(
                        "timestamp {} does not follow {}",
                        pair[1].timestamp, pair[0].timestamp
                    ),
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The most recent `n` bars (or all of them when shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }
}

/// One point of the close-price chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};

    use super::Bar;

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// Flat bars (open = high = low = close) one minute apart.
    pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: start() + Duration::minutes(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect()
    }

    /// Bars opening at the previous close with a fixed wick around the body.
    pub fn bars_with_wicks(closes: &[f64], wick: f64) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let open = if i == 0 { c } else { closes[i - 1] };
                Bar {
                    timestamp: start() + Duration::minutes(i as i64),
                    open,
                    high: open.max(c) + wick,
                    low: open.min(c) - wick,
                    close: c,
                    volume: 100.0 + i as f64,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::bars_from_closes;
    use super::*;

    #[test]
    fn interval_minutes_round_trip() {
        for minutes in [5, 15, 60, 240] {
            let interval = Interval::from_minutes(minutes).unwrap();
            assert_eq!(interval.minutes(), minutes);
        }
    }

    #[test]
    fn interval_unsupported_minutes_returns_none() {
        assert_eq!(Interval::from_minutes(1), None);
        assert_eq!(Interval::from_minutes(1440), None);
    }

    #[test]
    fn valid_series_accepted() {
        let series = BarSeries::new(bars_from_closes(&[1.0, 1.1, 1.2])).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last().unwrap().close, 1.2);
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let mut bars = bars_from_closes(&[1.0, 1.1]);
        bars[1].timestamp = bars[0].timestamp;
        assert!(BarSeries::new(bars).is_err());
    }

    #[test]
    fn out_of_order_timestamp_rejected() {
        let mut bars = bars_from_closes(&[1.0, 1.1, 1.2]);
        bars.swap(1, 2);
        assert!(BarSeries::new(bars).is_err());
    }

    #[test]
    fn high_below_close_rejected() {
        let mut bars = bars_from_closes(&[1.0, 1.1]);
        bars[1].high = 1.05;
        let err = BarSeries::new(bars).unwrap_err();
        assert!(matches!(
            err.current_context(),
            SeriesError::InvalidBar { index: 1, .. }
        ));
    }

    #[test]
    fn negative_volume_rejected() {
        let mut bars = bars_from_closes(&[1.0]);
        bars[0].volume = -1.0;
        assert!(BarSeries::new(bars).is_err());
    }

    #[test]
    fn nan_price_rejected() {
        let mut bars = bars_from_closes(&[1.0]);
        bars[0].close = f64::NAN;
        assert!(BarSeries::new(bars).is_err());
    }

    #[test]
    fn tail_keeps_most_recent_bars() {
        let series = BarSeries::new(bars_from_closes(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        let tail = series.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].close, 3.0);
        assert_eq!(series.tail(10).len(), 4);
    }
}

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ichimoku;
pub mod ma;
pub mod macd;
pub mod momentum;
pub mod psar;
pub mod rsi;
pub mod stochastic;
pub mod volatility;
pub mod volume;
pub mod vwap;

use crate::model::Bar;

/// Indicator output aligned index-for-index with its input.
///
/// `None` marks an index without enough history; it is never coerced to zero.
pub type Series = Vec<Option<f64>>;

/// A technical analysis indicator that operates on a slice of bars.
///
/// Bars must be in ascending chronological order (oldest first).
pub trait Indicator: Send + Sync {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Minimum number of bars required before the latest value is defined.
    fn required_bars(&self) -> usize;

    /// Calculate the indicator's primary line, one entry per input bar.
    fn calculate(&self, bars: &[Bar]) -> Series;
}

/// Extract close prices from a slice of bars.
pub fn close_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn high_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

pub fn low_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}

/// Extract volumes from a slice of bars.
pub fn volumes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}

/// Final element of a series, if it is defined.
pub fn latest(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

pub fn defined(values: &[f64]) -> Series {
    values.iter().copied().map(Some).collect()
}

/// Simple rolling mean in one pass over a running sum.
///
/// An output entry is defined only when all `window` inputs it covers are.
/// A window of zeros averages to exactly 0.0, with no leftover rounding from
/// values that have already left the window.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Series {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    let mut sum = 0.0;
    let mut missing = 0usize;
    let mut nonzero = 0usize;
    for (i, value) in values.iter().enumerate() {
        match *value {
            Some(v) => {
                sum += v;
                nonzero += usize::from(v != 0.0);
            }
            None => missing += 1,
        }
        if i >= window {
            match values[i - window] {
                Some(v) => {
                    sum -= v;
                    nonzero -= usize::from(v != 0.0);
                }
                None => missing -= 1,
            }
        }
        if nonzero == 0 {
            sum = 0.0;
        }
        if i + 1 >= window && missing == 0 {
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

/// Rolling sample standard deviation (ddof = 1).
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Series {
    let means = rolling_mean(values, window);
    rolling_std_about(values, &means, window)
}

/// Sample standard deviation of each window measured around the given means.
///
/// `means` must be the rolling mean of `values` over the same window. The
/// deviations are taken from that mean directly so the result is never
/// negative and collapses to zero on a constant window.
pub fn rolling_std_about(values: &[Option<f64>], means: &[Option<f64>], window: usize) -> Series {
    if window < 2 {
        return vec![None; values.len()];
    }
    means
        .iter()
        .enumerate()
        .map(|(i, mean)| {
            let mean = (*mean)?;
            let start = i + 1 - window;
            let sum_sq = values[start..=i]
                .iter()
                .map(|v| v.map(|v| (v - mean).powi(2)))
                .sum::<Option<f64>>()?;
            Some((sum_sq / (window - 1) as f64).sqrt())
        })
        .collect()
}

pub fn rolling_min(values: &[f64], window: usize) -> Series {
    rolling_extreme(values, window, f64::min)
}

pub fn rolling_max(values: &[f64], window: usize) -> Series {
    rolling_extreme(values, window, f64::max)
}

fn rolling_extreme(values: &[f64], window: usize, pick: fn(f64, f64) -> f64) -> Series {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for (i, w) in values.windows(window).enumerate() {
        out[i + window - 1] = w.iter().copied().reduce(pick);
    }
    out
}

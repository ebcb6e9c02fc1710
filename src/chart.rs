use error_stack::Report;
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::ichimoku::Ichimoku;
use crate::indicator::psar::ParabolicSar;
use crate::indicator::{Indicator, Series};
use crate::model::{BarSeries, ChartPoint};

pub const DEFAULT_MAX_POINTS: usize = 200;

/// Close prices of the last `max_points` bars, oldest first.
pub fn chart_series(series: &BarSeries, max_points: usize) -> Vec<ChartPoint> {
    series
        .tail(max_points)
        .iter()
        .map(|bar| ChartPoint {
            timestamp: bar.timestamp,
            close: bar.close,
        })
        .collect()
}

/// Overlay lines aligned index-for-index with [`chart_series`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlays {
    pub psar: Series,
    pub ichimoku_a: Series,
    pub ichimoku_b: Series,
}

/// Parabolic SAR and Ichimoku spans over the whole series, cut to the same
/// tail as the chart so the warm-up uses all available history.
pub fn chart_overlays(
    series: &BarSeries,
    max_points: usize,
) -> Result<Overlays, Report<IndicatorError>> {
    let bars = series.bars();
    let psar = ParabolicSar::standard()?;
    let ichimoku = Ichimoku::standard()?;
    let lines = ichimoku.calculate_lines(bars);

    Ok(Overlays {
        psar: tail(psar.calculate(bars), max_points),
        ichimoku_a: tail(lines.span_a, max_points),
        ichimoku_b: tail(lines.span_b, max_points),
    })
}

fn tail(mut values: Series, n: usize) -> Series {
    let start = values.len().saturating_sub(n);
    values.drain(..start);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::bars_with_wicks;

    fn series(n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n).map(|i| 1.1 + 0.0002 * i as f64).collect();
        BarSeries::new(bars_with_wicks(&closes, 0.0003)).unwrap()
    }

    #[test]
    fn chart_series_keeps_last_points() {
        let s = series(250);
        let points = chart_series(&s, DEFAULT_MAX_POINTS);
        assert_eq!(points.len(), 200);
        assert_eq!(points[0].timestamp, s.bars()[50].timestamp);
        assert_eq!(points[199].close, s.last().unwrap().close);
    }

    #[test]
    fn chart_series_short_input_returns_everything() {
        let s = series(30);
        assert_eq!(chart_series(&s, DEFAULT_MAX_POINTS).len(), 30);
    }

    #[test]
    fn chart_series_empty() {
        let s = BarSeries::new(Vec::new()).unwrap();
        assert!(chart_series(&s, DEFAULT_MAX_POINTS).is_empty());
    }

    #[test]
    fn overlays_align_with_chart() {
        let s = series(250);
        let overlays = chart_overlays(&s, 120).unwrap();
        assert_eq!(overlays.psar.len(), 120);
        assert_eq!(overlays.ichimoku_a.len(), 120);
        assert_eq!(overlays.ichimoku_b.len(), 120);
        // 130 bars of history precede the window, so every span is warm
        assert!(overlays.ichimoku_b.iter().all(Option::is_some));
    }

    #[test]
    fn overlays_keep_warm_up_gaps_on_short_input() {
        let s = series(40);
        let overlays = chart_overlays(&s, DEFAULT_MAX_POINTS).unwrap();
        assert_eq!(overlays.ichimoku_b.len(), 40);
        assert!(overlays.ichimoku_b.iter().all(Option::is_none));
        assert!(overlays.psar.iter().all(Option::is_some));
    }
}

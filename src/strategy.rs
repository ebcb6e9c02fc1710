pub mod classifier;
pub mod narrative;

use std::fmt;

use error_stack::{Report, bail};
use serde::Serialize;
use tracing::debug;

use crate::analysis::{IndicatorSet, Snapshot};
use crate::config::AnalysisConfig;
use crate::error::{IndicatorError, PredictError};
use crate::model::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Breakout {
    Up,
    Down,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    Buy,
    Sell,
    Uncertain,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
            Self::Uncertain => write!(f, "Uncertain"),
        }
    }
}

/// Outcome of one prediction. Derived only from the bars it was computed on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub direction: Direction,
    pub breakout: Breakout,
    pub recommendation: Recommendation,
    pub price: f64,
    pub target_up: f64,
    pub target_down: f64,
    pub narrative: String,
    pub indicators: Snapshot,
}

/// Indicator set plus target parameters. Holds no per-call state, so one
/// instance can serve concurrent predictions.
pub struct Predictor {
    set: IndicatorSet,
    pip_size: f64,
    target_pips: f64,
}

impl Predictor {
    pub fn new(config: &AnalysisConfig) -> Result<Self, Report<IndicatorError>> {
        let set = IndicatorSet::new(config.lookback)?;
        if config.lookback < set.required_bars() {
            bail!(IndicatorError::InvalidParameter {
                name: format!("lookback must be >= {}", set.required_bars()),
            });
        }
        Ok(Self {
            set,
            pip_size: config.pip_size,
            target_pips: config.target_pips,
        })
    }

    /// Run the full pipeline: indicator set, classifier, narrative.
    ///
    /// Fails with `InsufficientHistory` when any value the classifier needs is
    /// undefined; there is no partial prediction.
    pub fn predict(&self, series: &BarSeries) -> Result<Prediction, Report<PredictError>> {
        let snapshot = self.set.compute(series)?.snapshot();
        let classification = classifier::classify(&snapshot)?;

        let offset = self.target_pips * self.pip_size;
        let target_up = snapshot.price + offset;
        let target_down = snapshot.price - offset;

        debug!(
            price = snapshot.price,
            direction = ?classification.direction,
            breakout = ?classification.breakout,
            recommendation = %classification.recommendation,
            "trend classified"
        );

        let narrative = narrative::render(
            classification.recommendation,
            self.target_pips,
            target_up,
            target_down,
        );

        Ok(Prediction {
            direction: classification.direction,
            breakout: classification.breakout,
            recommendation: classification.recommendation,
            price: snapshot.price,
            target_up,
            target_down,
            narrative,
            indicators: snapshot,
        })
    }
}

use error_stack::{Report, bail};
use serde::Serialize;
use tracing::debug;

use crate::error::{IndicatorError, PredictError};
use crate::indicator::adx::{Adx, DirectionalIndex};
use crate::indicator::atr::Atr;
use crate::indicator::bollinger::{Bands, BollingerBands};
use crate::indicator::macd::{Macd, MacdLines};
use crate::indicator::momentum::Momentum;
use crate::indicator::rsi::Rsi;
use crate::indicator::stochastic::Stochastic;
use crate::indicator::volatility::Volatility;
use crate::indicator::volume::VolumeMA;
use crate::indicator::vwap::Vwap;
use crate::indicator::{Indicator, Series, close_prices, latest};
use crate::model::BarSeries;

/// The fixed bundle of indicators a prediction is derived from.
///
/// Holds only the indicator parameters; every call to [`IndicatorSet::compute`]
/// starts from the bars it is given.
pub struct IndicatorSet {
    lookback: usize,
    rsi: Rsi,
    macd: Macd,
    adx: Adx,
    atr: Atr,
    momentum: Momentum,
    bollinger: BollingerBands,
    stochastic: Stochastic,
    volatility: Volatility,
    vwap: Vwap,
    volume: VolumeMA,
}

impl IndicatorSet {
    /// RSI(14), MACD(12/26/9), ADX(14), ATR(14), Momentum(10), Bollinger(20, 2)
    /// plus the informational Stochastic(14), Volatility(14), VWAP and
    /// Volume(20) over the most recent `lookback` bars.
    pub fn new(lookback: usize) -> Result<Self, Report<IndicatorError>> {
        Ok(Self {
            lookback,
            rsi: Rsi::new(14)?,
            macd: Macd::standard()?,
            adx: Adx::new(14)?,
            atr: Atr::new(14)?,
            momentum: Momentum::new(10)?,
            bollinger: BollingerBands::new(20, 2.0)?,
            stochastic: Stochastic::new(14)?,
            volatility: Volatility::new(14)?,
            vwap: Vwap,
            volume: VolumeMA::new(20)?,
        })
    }

    /// Indicators whose history requirement gates a prediction.
    fn core(&self) -> [&dyn Indicator; 6] {
        [
            &self.rsi,
            &self.macd,
            &self.adx,
            &self.atr,
            &self.momentum,
            &self.bollinger,
        ]
    }

    /// Largest minimum history among the core indicators.
    pub fn required_bars(&self) -> usize {
        self.core()
            .iter()
            .map(|indicator| indicator.required_bars())
            .max()
            .unwrap_or(0)
    }

    pub fn compute(&self, series: &BarSeries) -> Result<IndicatorValues, Report<PredictError>> {
        let bars = series.tail(self.lookback);
        let required = self.required_bars();
        if bars.len() < required {
            bail!(PredictError::InsufficientHistory {
                required,
                available: bars.len(),
            });
        }

        debug!(
            bars = bars.len(),
            indicators = ?self.core().map(|i| i.name()),
            "computing indicator set"
        );

        let closes = close_prices(bars);
        Ok(IndicatorValues {
            bars: bars.len(),
            required,
            price: closes[closes.len() - 1],
            rsi: self.rsi.calculate_prices(&closes),
            macd: self.macd.calculate_full(&closes),
            directional: self.adx.calculate_full(bars),
            atr: self.atr.calculate(bars),
            momentum: self.momentum.calculate_prices(&closes),
            bands: self.bollinger.calculate_bands(&closes),
            stochastic: self.stochastic.calculate(bars),
            volatility: self.volatility.calculate_prices(&closes),
            vwap: self.vwap.calculate(bars),
            volume_above_average: self.volume.signal(bars),
        })
    }
}

/// Full indicator series computed over one lookback window.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorValues {
    pub bars: usize,
    pub required: usize,
    pub price: f64,
    pub rsi: Series,
    pub macd: MacdLines,
    pub directional: DirectionalIndex,
    pub atr: Series,
    pub momentum: Series,
    pub bands: Bands,
    pub stochastic: Series,
    pub volatility: Series,
    pub vwap: Series,
    pub volume_above_average: Option<bool>,
}

impl IndicatorValues {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bars: self.bars,
            required: self.required,
            price: self.price,
            rsi: latest(&self.rsi),
            macd: latest(&self.macd.macd),
            signal: latest(&self.macd.signal),
            histogram: latest(&self.macd.histogram),
            adx: latest(&self.directional.adx),
            plus_di: latest(&self.directional.plus_di),
            minus_di: latest(&self.directional.minus_di),
            atr: latest(&self.atr),
            momentum: latest(&self.momentum),
            upper_band: latest(&self.bands.upper),
            middle_band: latest(&self.bands.middle),
            lower_band: latest(&self.bands.lower),
            stochastic_k: latest(&self.stochastic),
            volatility: latest(&self.volatility),
            vwap: latest(&self.vwap),
            volume_above_average: self.volume_above_average,
        }
    }
}

/// Latest value of every indicator. `None` means the final entry was undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub bars: usize,
    pub required: usize,
    pub price: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
    pub adx: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub atr: Option<f64>,
    pub momentum: Option<f64>,
    pub upper_band: Option<f64>,
    pub middle_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub stochastic_k: Option<f64>,
    pub volatility: Option<f64>,
    pub vwap: Option<f64>,
    pub volume_above_average: Option<bool>,
}

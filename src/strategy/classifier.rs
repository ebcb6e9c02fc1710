use error_stack::Report;

use crate::analysis::Snapshot;
use crate::error::PredictError;
use crate::strategy::{Breakout, Direction, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub direction: Direction,
    pub breakout: Breakout,
    pub recommendation: Recommendation,
}

/// Classify the latest indicator values.
///
/// Needs MACD, signal, momentum and both Bollinger bands; an undefined one
/// means the window did not carry enough history.
pub fn classify(snapshot: &Snapshot) -> Result<Classification, Report<PredictError>> {
    let required = |name: &str, value: Option<f64>| {
        value.ok_or_else(|| {
            Report::new(PredictError::InsufficientHistory {
                required: snapshot.required,
                available: snapshot.bars,
            })
            .attach(format!("latest {name} is undefined"))
        })
    };

    let macd = required("macd", snapshot.macd)?;
    let signal = required("signal", snapshot.signal)?;
    let momentum = required("momentum", snapshot.momentum)?;
    let upper = required("upper band", snapshot.upper_band)?;
    let lower = required("lower band", snapshot.lower_band)?;

    let direction = direction(macd, signal, momentum);
    let breakout = breakout(snapshot.price, upper, lower);

    Ok(Classification {
        direction,
        breakout,
        recommendation: recommendation(direction, breakout),
    })
}

fn direction(macd: f64, signal: f64, momentum: f64) -> Direction {
    if macd > signal && momentum > 0.0 {
        Direction::Up
    } else if macd < signal && momentum < 0.0 {
        Direction::Down
    } else {
        Direction::Sideways
    }
}

fn breakout(price: f64, upper: f64, lower: f64) -> Breakout {
    if price > upper {
        Breakout::Up
    } else if price < lower {
        Breakout::Down
    } else {
        Breakout::None
    }
}

/// A call needs the trend and the band break to agree.
fn recommendation(direction: Direction, breakout: Breakout) -> Recommendation {
    match (direction, breakout) {
        (Direction::Up, Breakout::Up) => Recommendation::Buy,
        (Direction::Down, Breakout::Down) => Recommendation::Sell,
        _ => Recommendation::Uncertain,
    }
}

use crate::strategy::Recommendation;

/// Human-readable recommendation. Prices are printed with five decimals and
/// are never altered here.
pub fn render(
    recommendation: Recommendation,
    target_pips: f64,
    target_up: f64,
    target_down: f64,
) -> String {
    match recommendation {
        Recommendation::Buy => format!(
            "Price is likely to rise by {target_pips} pips. Target: {target_up:.5}. \
             If the price breaks above {target_up:.5}, this could confirm a bullish \
             breakout and a potential 'Buy'."
        ),
        Recommendation::Sell => format!(
            "Price is likely to drop by {target_pips} pips. Target: {target_down:.5}. \
             If the price falls below {target_down:.5}, this could confirm a bearish \
             breakdown and a potential 'Sell'."
        ),
        Recommendation::Uncertain => format!(
            "Uncertain trend. Monitor price levels {target_up:.5} (upward) and \
             {target_down:.5} (downward). If the price breaks above {target_up:.5}, \
             it could signal a potential 'Buy'. If the price falls below \
             {target_down:.5}, it could signal a potential 'Sell'."
        ),
    }
}

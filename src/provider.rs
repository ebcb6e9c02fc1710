pub mod polygon;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::model::{BarSeries, Interval};

/// Source of historical bars for a currency pair.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn BarSource`).
pub trait BarSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the recent bars of `pair` (e.g. `"EUR/USD"`), oldest first.
    fn fetch_bars(
        &self,
        pair: &str,
        interval: Interval,
    ) -> BoxFuture<'_, Result<BarSeries, Report<ProviderError>>>;
}

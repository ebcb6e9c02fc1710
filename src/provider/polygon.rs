use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::model::{Bar, BarSeries, Interval};
use crate::provider::BarSource;

const PROVIDER: &str = "polygon";
/// Upper bound the aggregates endpoint accepts per request.
const MAX_RESULTS: u32 = 50_000;

pub struct PolygonClient {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    base_url: String,
    api_key: String,
    history: TimeDelta,
}

impl PolygonClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, Report<ProviderError>> {
        let api_key = config.api_key.clone().unwrap_or_default();
        let rpm = NonZeroU32::new(config.requests_per_minute).unwrap_or(nonzero!(5u32));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .change_context(ProviderError::Request {
                provider: PROVIDER.into(),
            })?;
        let history = TimeDelta::try_days(config.history_days).ok_or_else(|| {
            Report::new(ProviderError::Request {
                provider: PROVIDER.into(),
            })
            .attach(format!("history_days out of range: {}", config.history_days))
        })?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rpm))),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key,
            history,
        })
    }

    async fn fetch_aggregates(
        &self,
        pair: &str,
        interval: Interval,
    ) -> Result<AggregatesResponse, Report<ProviderError>> {
        // Wait for rate limiter before making the request
        self.rate_limiter.until_ready().await;

        let end = Utc::now();
        let start = end.checked_sub_signed(self.history).ok_or_else(|| {
            Report::new(ProviderError::Request {
                provider: PROVIDER.into(),
            })
            .attach(format!(
                "history of {} days reaches past the supported date range",
                self.history.num_days()
            ))
        })?;
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/minute/{}/{}",
            self.base_url,
            ticker(pair),
            interval.minutes(),
            start.timestamp_millis(),
            end.timestamp_millis(),
        );

        debug!(pair, interval = %interval, url = %url, "requesting aggregates");

        let limit = MAX_RESULTS.to_string();
        let params = [
            ("adjusted", "true"),
            ("sort", "asc"),
            ("limit", limit.as_str()),
            ("apiKey", self.api_key.as_str()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            // the query string carries the api key
            .map_err(reqwest::Error::without_url)
            .change_context(ProviderError::Request {
                provider: PROVIDER.into(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let upstream = response
                .json::<AggregatesResponse>()
                .await
                .ok()
                .and_then(AggregatesResponse::upstream_error);
            let mut report = Report::new(ProviderError::Request {
                provider: PROVIDER.into(),
            })
            .attach(format!("HTTP status: {status}"));
            if let Some(message) = upstream {
                report = report.attach(format!("upstream: {message}"));
            }
            return Err(report);
        }

        response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .change_context(ProviderError::ResponseParse {
                provider: PROVIDER.into(),
            })
    }
}

impl BarSource for PolygonClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn fetch_bars(
        &self,
        pair: &str,
        interval: Interval,
    ) -> BoxFuture<'_, Result<BarSeries, Report<ProviderError>>> {
        let pair = pair.to_owned();
        Box::pin(async move {
            let response = self.fetch_aggregates(&pair, interval).await?;
            let series = response.into_series(&pair)?;
            info!(pair = %pair, interval = %interval, bars = series.len(), "bars fetched");
            Ok(series)
        })
    }
}

/// Polygon forex ticker: `"EUR/USD"` becomes `"C:EURUSD"`.
fn ticker(pair: &str) -> String {
    format!("C:{}", pair.replace('/', ""))
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// One aggregate bar. `t` is the bar start in Unix milliseconds.
#[derive(Debug, Deserialize)]
struct AggregateBar {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    #[serde(default)]
    v: f64,
}

impl AggregatesResponse {
    fn upstream_error(self) -> Option<String> {
        self.error.or(self.message)
    }

    fn into_series(self, pair: &str) -> Result<BarSeries, Report<ProviderError>> {
        if let Some(reason) = self.error {
            return Err(Report::new(ProviderError::DataUnavailable {
                pair: pair.to_owned(),
                reason,
            }));
        }
        let results = match self.results {
            Some(results) if !results.is_empty() => results,
            _ => {
                return Err(Report::new(ProviderError::DataUnavailable {
                    pair: pair.to_owned(),
                    reason: self
                        .message
                        .unwrap_or_else(|| "API returned no data".into()),
                }));
            }
        };

        let bars = results
            .into_iter()
            .map(AggregateBar::into_bar)
            .collect::<Result<Vec<_>, _>>()?;

        BarSeries::new(bars)
            .change_context(ProviderError::InvalidBar {
                provider: PROVIDER.into(),
            })
            .attach_with(|| format!("pair: {pair}"))
    }
}

impl AggregateBar {
    fn into_bar(self) -> Result<Bar, Report<ProviderError>> {
        let timestamp = DateTime::from_timestamp_millis(self.t).ok_or_else(|| {
            Report::new(ProviderError::ResponseParse {
                provider: PROVIDER.into(),
            })
            .attach(format!("timestamp out of range: {}", self.t))
        })?;
        Ok(Bar {
            timestamp,
            open: self.o,
            high: self.h,
            low: self.l,
            close: self.c,
            volume: self.v,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AggregatesResponse {
        serde_json::from_str(json).expect("parse failed")
    }

    #[test]
    fn ticker_strips_slash() {
        assert_eq!(ticker("EUR/USD"), "C:EURUSD");
        assert_eq!(ticker("USD/JPY"), "C:USDJPY");
    }

    #[test]
    fn aggregates_payload_parses_into_series() {
        let response = parse(
            r#"{
                "ticker": "C:EURUSD",
                "status": "OK",
                "resultsCount": 2,
                "results": [
                    {"t": 1704067200000, "o": 1.1040, "h": 1.1052, "l": 1.1031, "c": 1.1049, "v": 812},
                    {"t": 1704070800000, "o": 1.1049, "h": 1.1061, "l": 1.1044, "c": 1.1058, "v": 901.5}
                ]
            }"#,
        );
        let series = response.into_series("EUR/USD").unwrap();
        assert_eq!(series.len(), 2);
        let first = series.bars()[0];
        assert_eq!(first.timestamp.timestamp_millis(), 1704067200000);
        assert_eq!(first.open, 1.1040);
        assert_eq!(first.close, 1.1049);
        assert_eq!(series.last().unwrap().volume, 901.5);
    }

    #[test]
    fn missing_volume_defaults_to_zero() {
        let response = parse(r#"{"results": [{"t": 1704067200000, "o": 1.0, "h": 1.0, "l": 1.0, "c": 1.0}]}"#);
        let series = response.into_series("EUR/USD").unwrap();
        assert_eq!(series.bars()[0].volume, 0.0);
    }

    #[test]
    fn error_field_is_data_unavailable_with_reason() {
        let response = parse(r#"{"status": "ERROR", "error": "Unknown API Key"}"#);
        let err = response.into_series("EUR/USD").unwrap_err();
        match err.current_context() {
            ProviderError::DataUnavailable { pair, reason } => {
                assert_eq!(pair, "EUR/USD");
                assert_eq!(reason, "Unknown API Key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_results_is_data_unavailable() {
        for json in [r#"{"status": "OK", "results": []}"#, r#"{"status": "OK"}"#] {
            let err = parse(json).into_series("GBP/USD").unwrap_err();
            match err.current_context() {
                ProviderError::DataUnavailable { reason, .. } => {
                    assert_eq!(reason, "API returned no data");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn unordered_results_rejected() {
        let response = parse(
            r#"{"results": [
                {"t": 1704070800000, "o": 1.0, "h": 1.0, "l": 1.0, "c": 1.0, "v": 1},
                {"t": 1704067200000, "o": 1.0, "h": 1.0, "l": 1.0, "c": 1.0, "v": 1}
            ]}"#,
        );
        let err = response.into_series("EUR/USD").unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::InvalidBar { .. }
        ));
    }

    #[test]
    fn out_of_range_timestamp_is_parse_error() {
        let response =
            parse(r#"{"results": [{"t": 9223372036854775807, "o": 1.0, "h": 1.0, "l": 1.0, "c": 1.0}]}"#);
        let err = response.into_series("EUR/USD").unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::ResponseParse { .. }
        ));
    }

    #[test]
    fn client_builds_from_default_config() {
        let config = ProviderConfig {
            base_url: "https://api.polygon.io/".into(),
            api_key: Some("k".into()),
            ..ProviderConfig::default()
        };
        let client = PolygonClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.polygon.io");
        assert_eq!(client.history, TimeDelta::days(7));
    }

    #[test]
    fn client_rejects_unrepresentable_history() {
        let config = ProviderConfig {
            api_key: Some("k".into()),
            history_days: 9_000_000_000_000_000,
            ..ProviderConfig::default()
        };
        let err = PolygonClient::new(&config).err().unwrap();
        assert!(matches!(
            err.current_context(),
            ProviderError::Request { .. }
        ));
    }

    #[tokio::test]
    #[ignore] // requires network access and POLYGON_API_KEY
    async fn polygon_fetch_bars_integration() {
        let config = ProviderConfig {
            api_key: std::env::var("POLYGON_API_KEY").ok(),
            ..ProviderConfig::default()
        };
        let client = PolygonClient::new(&config).unwrap();
        let series = client.fetch_bars("EUR/USD", Interval::Hour1).await.unwrap();
        assert!(!series.is_empty());
    }
}

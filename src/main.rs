mod analysis;
mod chart;
mod config;
mod error;
mod indicator;
mod model;
mod provider;
mod strategy;

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chart::Overlays;
use config::AppConfig;
use error::{PredictError, ProviderError};
use model::{ChartPoint, Interval};
use provider::BarSource;
use provider::polygon::PolygonClient;
use strategy::{Prediction, Predictor};

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("market data provider error")]
    Provider,
    #[display("runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(name = "fx-trend", about = "Forex trend predictor")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict the trend of one currency pair
    Predict {
        /// Currency pair, e.g. EUR/USD
        #[arg(long)]
        pair: String,
        /// Bar interval in minutes (5, 15, 60, 240)
        #[arg(long, default_value_t = 60)]
        interval: u32,
        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,
    },
    /// Predict every configured pair concurrently
    Scan {
        #[arg(long, default_value_t = 60)]
        interval: u32,
    },
    /// Print the chart series and overlays of one pair as JSON
    Chart {
        #[arg(long)]
        pair: String,
        #[arg(long, default_value_t = 60)]
        interval: u32,
        /// Defaults to `analysis.chart_points`
        #[arg(long)]
        max_points: Option<usize>,
    },
}

#[derive(Serialize)]
struct ChartOutput<'a> {
    pair: &'a str,
    interval_minutes: u32,
    points: Vec<ChartPoint>,
    overlays: Overlays,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    let predictor =
        Arc::new(Predictor::new(&config.analysis).change_context(AppError::Config)?);
    let source: Arc<dyn BarSource> =
        Arc::new(PolygonClient::new(&config.provider).change_context(AppError::Provider)?);

    match cli.command {
        Command::Predict {
            pair,
            interval,
            json,
        } => {
            let interval = parse_request(&pair, interval)?;
            let prediction = run_prediction(source.as_ref(), &predictor, &pair, interval)
                .await
                .change_context(AppError::Runtime)?;
            if json {
                let body = serde_json::to_string_pretty(&prediction)
                    .change_context(AppError::Runtime)?;
                println!("{body}");
            } else {
                println!("{}", render_text(&pair, interval, &prediction));
            }
        }
        Command::Scan { interval } => {
            let interval = config::parse_interval(interval).change_context(AppError::Config)?;
            scan(&config, source, predictor, interval).await?;
        }
        Command::Chart {
            pair,
            interval,
            max_points,
        } => {
            let interval = parse_request(&pair, interval)?;
            let max_points = max_points.unwrap_or(config.analysis.chart_points);
            let series = source
                .fetch_bars(&pair, interval)
                .await
                .change_context(AppError::Provider)?;
            let output = ChartOutput {
                pair: &pair,
                interval_minutes: interval.minutes(),
                points: chart::chart_series(&series, max_points),
                overlays: chart::chart_overlays(&series, max_points)
                    .change_context(AppError::Runtime)?,
            };
            let body = serde_json::to_string(&output).change_context(AppError::Runtime)?;
            println!("{body}");
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    // stdout is reserved for command output
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn parse_request(pair: &str, interval: u32) -> Result<Interval, Report<AppError>> {
    if !config::is_valid_pair(pair) {
        return Err(Report::new(AppError::Config)
            .attach(format!("pair \"{pair}\" is not of the form AAA/BBB")));
    }
    config::parse_interval(interval).change_context(AppError::Config)
}

/// Fetch bars for one pair and run the prediction pipeline on them.
async fn run_prediction(
    source: &dyn BarSource,
    predictor: &Predictor,
    pair: &str,
    interval: Interval,
) -> Result<Prediction, Report<PredictError>> {
    info!(provider = source.name(), pair, interval = %interval, "fetching bars");

    let series = source.fetch_bars(pair, interval).await.map_err(|report| {
        let context = match report.current_context() {
            ProviderError::InvalidBar { .. } => PredictError::InvalidBar,
            // the upstream message is reported verbatim
            ProviderError::DataUnavailable { reason, .. } => PredictError::DataUnavailable {
                reason: reason.clone(),
            },
            other => PredictError::DataUnavailable {
                reason: other.to_string(),
            },
        };
        report.change_context(context)
    })?;

    let prediction = predictor.predict(&series)?;
    info!(
        pair,
        interval = %interval,
        recommendation = %prediction.recommendation,
        "prediction ready"
    );
    Ok(prediction)
}

/// One task per pair; the source's rate limiter paces the requests.
async fn scan(
    config: &AppConfig,
    source: Arc<dyn BarSource>,
    predictor: Arc<Predictor>,
    interval: Interval,
) -> Result<(), Report<AppError>> {
    let mut handles = Vec::with_capacity(config.pairs.len());
    for pair in &config.pairs {
        let pair = pair.clone();
        let source = Arc::clone(&source);
        let predictor = Arc::clone(&predictor);
        let handle = tokio::spawn(async move {
            let result = run_prediction(source.as_ref(), &predictor, &pair, interval).await;
            (pair, result)
        });
        handles.push(handle);
    }

    for handle in handles {
        let (pair, result) = handle.await.change_context(AppError::Runtime)?;
        match result {
            Ok(prediction) => println!("{}\n", render_text(&pair, interval, &prediction)),
            Err(e) => {
                tracing::warn!(pair = %pair, error = ?e, "prediction failed (continuing)");
                println!("{}\n", render_error(&pair, interval, &e));
            }
        }
    }

    Ok(())
}

fn render_error(pair: &str, interval: Interval, error: &Report<PredictError>) -> String {
    format!("{pair} ({interval}): Error: {}", error.current_context())
}

fn render_text(pair: &str, interval: Interval, prediction: &Prediction) -> String {
    format!(
        "{pair} ({interval}) @ {:.5}\nDirection: {:?}  Breakout: {:?}  Recommendation: {}\n{}",
        prediction.price,
        prediction.direction,
        prediction.breakout,
        prediction.recommendation,
        prediction.narrative,
    )
}

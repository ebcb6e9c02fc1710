use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    #[display("no data available for {pair}: {reason}")]
    DataUnavailable { pair: String, reason: String },
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("{provider} returned an invalid bar series")]
    InvalidBar { provider: String },
}

#[derive(Debug, Display, Error)]
pub enum SeriesError {
    #[display("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

/// Failure modes of a prediction. None of them is retried.
#[derive(Debug, Display, Error)]
pub enum PredictError {
    #[display("market data unavailable: {reason}")]
    DataUnavailable { reason: String },
    #[display("insufficient history: need {required} bars, got {available}")]
    InsufficientHistory { required: usize, available: usize },
    #[display("invalid bar series")]
    InvalidBar,
}

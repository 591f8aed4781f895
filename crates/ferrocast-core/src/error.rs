use ferrocast_model::ModelError;
use serde::Serialize;
use thiserror::Error;

use crate::data_source::SourceError;
use crate::{MarketDate, Symbol};

/// Validation and contract errors exposed by `ferrocast-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptySymbol,
    #[error("ticker length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
    #[error("date '{value}' is out of the supported calendar range")]
    DateOutOfRange { value: String },
    #[error("start date {start} must be before end date {end}")]
    InvalidDateRange { start: String, end: String },
    #[error("end date {end} cannot be after today ({today})")]
    EndDateInFuture { end: String, today: String },

    #[error("order '{name}' = {value} exceeds max {max}")]
    OrderOutOfRange {
        name: &'static str,
        value: usize,
        max: usize,
    },
    #[error("'{field}' must be a whole number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("horizon {value} must be between {min} and {max} months")]
    HorizonOutOfRange { value: usize, min: usize, max: usize },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("duplicate date {date} in price series")]
    DuplicateDate { date: String },
    #[error("dates must be strictly increasing: {previous} then {next}")]
    UnorderedDates { previous: String, next: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Failure category of a forecast submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastErrorKind {
    Validation,
    DataUnavailable,
    Upstream,
    ModelFit,
}

impl ForecastErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "forecast.validation",
            Self::DataUnavailable => "forecast.data_unavailable",
            Self::Upstream => "forecast.upstream",
            Self::ModelFit => "forecast.model_fit",
        }
    }
}

/// Typed outcome of a failed submission. Every variant is reported to the
/// user and none is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no price data for {symbol} between {start} and {end}")]
    DataUnavailable {
        symbol: Symbol,
        start: MarketDate,
        end: MarketDate,
    },

    /// Provider failure; the provider's message is kept verbatim.
    #[error("{}", .0.message())]
    Upstream(SourceError),

    #[error("model fit failed: {0}")]
    ModelFit(#[from] ModelError),

    /// The fitted values could not be placed on a month-end date index.
    #[error("forecast dates could not be built: {0}")]
    ForecastIndex(#[source] ValidationError),
}

impl ForecastError {
    pub const fn kind(&self) -> ForecastErrorKind {
        match self {
            Self::Validation(_) => ForecastErrorKind::Validation,
            Self::DataUnavailable { .. } => ForecastErrorKind::DataUnavailable,
            Self::Upstream(_) => ForecastErrorKind::Upstream,
            Self::ModelFit(_) | Self::ForecastIndex(_) => ForecastErrorKind::ModelFit,
        }
    }

    pub const fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Message shown in the presentation layer's inline error area.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(error) => {
                format!("Make sure the dates are valid and the ticker is not empty ({error}).")
            }
            Self::DataUnavailable { symbol, .. } => {
                format!("No data found for {symbol} in the selected date range.")
            }
            Self::Upstream(error) => format!("Error: {}", error.message()),
            Self::ModelFit(error) => format!("Forecasting failed: {error}"),
            Self::ForecastIndex(error) => format!("Forecasting failed: {error}"),
        }
    }
}

/// CSV serialization failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer flush failed: {0}")]
    Io(#[from] std::io::Error),
}

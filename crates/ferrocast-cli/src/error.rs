use ferrocast_core::{ExportError, ForecastError, ForecastErrorKind, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}", .0.user_message())]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid bind address '{value}'")]
    InvalidBind { value: String },
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Forecast(error) => match error.kind() {
                ForecastErrorKind::Validation => 2,
                ForecastErrorKind::DataUnavailable => 3,
                ForecastErrorKind::Upstream => 4,
                ForecastErrorKind::ModelFit => 5,
            },
            Self::Validation(_) | Self::InvalidBind { .. } => 2,
            Self::Export(_) | Self::Serialization(_) => 6,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrocast_core::{MarketDate, ModelError, SourceError, Symbol};

    #[test]
    fn forecast_failures_map_to_distinct_exit_codes() {
        let day = MarketDate::parse("2022-01-01").expect("date");
        let codes: Vec<u8> = [
            ForecastError::Validation(ValidationError::EmptySymbol),
            ForecastError::DataUnavailable {
                symbol: Symbol::parse("ZZZZ").expect("symbol"),
                start: day,
                end: day,
            },
            ForecastError::Upstream(SourceError::unavailable("down")),
            ForecastError::ModelFit(ModelError::SingularSystem),
        ]
        .into_iter()
        .map(|error| CliError::from(error).exit_code())
        .collect();
        assert_eq!(codes, vec![2, 3, 4, 5]);
    }

    #[test]
    fn forecast_error_displays_user_message() {
        let error = CliError::from(ForecastError::Upstream(SourceError::unavailable("down")));
        assert_eq!(error.to_string(), "Error: down");
    }
}

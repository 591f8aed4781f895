//! Core contracts for ferrocast.
//!
//! This crate contains:
//! - Request-scoped domain models and validation
//! - Price source trait with Yahoo and synthetic adapters
//! - The forecast orchestrator and its session state machine
//! - CSV export and the JSON response envelope

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod export;
pub mod forecast;
pub mod http_client;
pub mod session;
pub mod source;

pub use adapters::{parse_chart_response, SyntheticSource, YahooAdapter};
pub use config::SourceConfig;
pub use data_source::{HistoryRequest, PriceSource, SourceError, SourceErrorKind};
pub use domain::{
    bounded_order, CombinedPoint, CombinedSeries, ForecastPoint, ForecastRequest, ForecastSeries,
    Horizon, MarketDate, PricePoint, PriceSeries, SeriesKind, Symbol, MAX_AR_ORDER,
    MAX_DIFFERENCING, MAX_MA_ORDER,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{ExportError, ForecastError, ForecastErrorKind, ValidationError};
pub use export::{export_csv, CSV_CONTENT_TYPE, CSV_FILE_NAME};
pub use ferrocast_model::{ArimaEstimator, ArimaOrder, FittedModel, ForecastModel, ModelError};
pub use forecast::{
    build_combined, extend_forecast, fetch_prices, finish_staged, fit_model, forecast_dates, run,
    run_forecast, validate_request, ForecastOutcome,
};
pub use http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use session::{ForecastForm, ForecastSession, Stage};
pub use source::ProviderId;

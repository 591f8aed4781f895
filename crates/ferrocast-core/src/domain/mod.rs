//! # Domain Models
//!
//! Request-scoped types for one forecast submission.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker |
//! | [`MarketDate`] | Calendar date (ISO-8601 on the wire) |
//! | [`ForecastRequest`] | Validated ticker, date range, order and horizon |
//! | [`PriceSeries`] | Daily closes, strictly increasing by date |
//! | [`ForecastSeries`] | Monthly point forecasts |
//! | [`CombinedSeries`] | Closes followed by forecasts, for charting |
//!
//! Invariants are enforced at construction time; nothing here is persisted.

mod date;
mod request;
mod series;
mod symbol;

pub use date::MarketDate;
pub use request::{
    bounded_order, ForecastRequest, Horizon, MAX_AR_ORDER, MAX_DIFFERENCING, MAX_MA_ORDER,
};
pub use series::{
    CombinedPoint, CombinedSeries, ForecastPoint, ForecastSeries, PricePoint, PriceSeries,
    SeriesKind,
};
pub use symbol::Symbol;

//! Price source trait and request/error types.
//!
//! `PriceSource` is the contract every market-data provider implements. The
//! orchestrator only ever asks for one thing: daily closing prices for one
//! symbol over a half-open date range.
//!
//! # Example
//!
//! ```rust,ignore
//! use ferrocast_core::{HistoryRequest, MarketDate, PriceSource, Symbol, YahooAdapter};
//!
//! async fn closes(adapter: &YahooAdapter) -> Result<(), Box<dyn std::error::Error>> {
//!     let request = HistoryRequest::new(
//!         Symbol::parse("AAPL")?,
//!         MarketDate::parse("2022-01-01")?,
//!         MarketDate::parse("2022-06-01")?,
//!     )?;
//!     let series = adapter.daily_closes(request).await?;
//!     println!("{} closes", series.len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{MarketDate, PriceSeries, ProviderId, Symbol};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Parse,
    Internal,
}

/// Structured error returned by price sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for daily history. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub start: MarketDate,
    pub end: MarketDate,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, start: MarketDate, end: MarketDate) -> Result<Self, SourceError> {
        if start >= end {
            return Err(SourceError::invalid_request(format!(
                "history start {start} must be before end {end}"
            )));
        }
        Ok(Self { symbol, start, end })
    }
}

/// Market data provider contract.
///
/// Implementations return an empty [`PriceSeries`] (not an error) when the
/// symbol is unknown or the range holds no trading days; the orchestrator
/// decides how to report that.
pub trait PriceSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fetches daily closing prices for `req.symbol` in `[req.start, req.end)`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport failures, non-success upstream
    /// statuses or unparseable payloads.
    fn daily_closes<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>>;
}

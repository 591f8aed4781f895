//! Forecast orchestration.
//!
//! A submission runs strictly in sequence: validate, fetch closes, fit the
//! model, extrapolate onto a monthly date index and concatenate the
//! historical and forecast series. Every failure is returned as a typed
//! [`ForecastError`]; nothing is retried and nothing outlives the call.

use ferrocast_model::{ArimaOrder, FittedModel, ForecastModel, ModelError};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::data_source::{HistoryRequest, PriceSource};
use crate::error::{ForecastError, ValidationError};
use crate::session::Stage;
use crate::{
    CombinedPoint, CombinedSeries, ForecastPoint, ForecastRequest, ForecastSeries, Horizon,
    MarketDate, PriceSeries, ProviderId, SeriesKind, Symbol,
};

/// Everything a presentation layer needs after a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutcome {
    pub request: ForecastRequest,
    pub source: ProviderId,
    pub model: String,
    pub prices: PriceSeries,
    pub forecast: ForecastSeries,
    pub combined: CombinedSeries,
}

/// Checks the ticker and date range of a submission.
///
/// Pure: no provider is contacted.
pub fn validate_request(
    ticker: &str,
    start: MarketDate,
    end: MarketDate,
) -> Result<Symbol, ValidationError> {
    let symbol = Symbol::parse(ticker)?;
    if start >= end {
        return Err(ValidationError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(symbol)
}

/// Fetches daily closes in `[start, end)`.
///
/// An empty result is [`ForecastError::DataUnavailable`]; provider failures
/// surface as [`ForecastError::Upstream`] with the provider's message.
pub async fn fetch_prices(
    source: &dyn PriceSource,
    symbol: &Symbol,
    start: MarketDate,
    end: MarketDate,
) -> Result<PriceSeries, ForecastError> {
    let request = HistoryRequest::new(symbol.clone(), start, end).map_err(ForecastError::Upstream)?;

    let prices = source.daily_closes(request).await.map_err(|error| {
        warn!(
            source = %source.id(),
            symbol = %symbol,
            code = error.code(),
            error = %error.message(),
            "price fetch failed"
        );
        ForecastError::Upstream(error)
    })?;

    if prices.is_empty() {
        info!(symbol = %symbol, %start, %end, "no prices in range");
        return Err(ForecastError::DataUnavailable {
            symbol: symbol.clone(),
            start,
            end,
        });
    }

    debug!(symbol = %symbol, observations = prices.len(), "fetched closes");
    Ok(prices)
}

/// Estimates `model` on the closing prices.
pub fn fit_model(
    model: &dyn ForecastModel,
    prices: &PriceSeries,
    order: ArimaOrder,
) -> Result<Box<dyn FittedModel>, ForecastError> {
    let fitted = model.fit(&prices.closes(), order).map_err(|error| {
        warn!(model = model.name(), %order, error = %error, "model fit failed");
        ForecastError::ModelFit(error)
    })?;
    debug!(model = model.name(), %order, "model fitted");
    Ok(fitted)
}

/// Month-end dates for `horizon` periods following `last`.
///
/// The first date is the first month-end on or after the day after `last`;
/// each further date is the next calendar month's end.
pub fn forecast_dates(last: MarketDate, horizon: Horizon) -> Result<Vec<MarketDate>, ValidationError> {
    let mut dates = Vec::with_capacity(horizon.months());
    let mut current = last.next_day()?.month_end()?;
    for _ in 0..horizon.months() {
        dates.push(current);
        current = current.next_day()?.month_end()?;
    }
    Ok(dates)
}

/// Extrapolates a fitted model onto the monthly date index after `last`.
pub fn extend_forecast(
    fitted: &dyn FittedModel,
    last: MarketDate,
    horizon: Horizon,
) -> Result<ForecastSeries, ForecastError> {
    let steps = horizon.months();
    let values = fitted.forecast(steps)?;
    if values.len() != steps {
        return Err(ModelError::StepMismatch {
            expected: steps,
            actual: values.len(),
        }
        .into());
    }
    if values.iter().any(|value| !value.is_finite()) {
        return Err(ModelError::NonFiniteEstimate { what: "forecast" }.into());
    }

    let points = forecast_dates(last, horizon)
        .map_err(ForecastError::ForecastIndex)?
        .into_iter()
        .zip(values)
        .map(|(date, value)| ForecastPoint::new(date, value))
        .collect();
    ForecastSeries::new(points).map_err(ForecastError::ForecastIndex)
}

/// Fits on the closes and forecasts `horizon` monthly periods.
pub fn run_forecast(
    model: &dyn ForecastModel,
    prices: &PriceSeries,
    order: ArimaOrder,
    horizon: Horizon,
) -> Result<ForecastSeries, ForecastError> {
    let last = last_date(prices, order)?;
    let fitted = fit_model(model, prices, order)?;
    extend_forecast(fitted.as_ref(), last, horizon)
}

/// Historical closes followed by the forecast.
pub fn build_combined(prices: &PriceSeries, forecast: &ForecastSeries) -> CombinedSeries {
    let historical = prices.points().iter().map(|point| CombinedPoint {
        date: point.date,
        value: point.close,
        kind: SeriesKind::Historical,
    });
    let projected = forecast.points().iter().map(|point| CombinedPoint {
        date: point.date,
        value: point.forecast,
        kind: SeriesKind::Forecast,
    });
    CombinedSeries::from_sorted(historical.chain(projected).collect())
}

/// Runs a validated request end to end.
pub async fn run(
    request: &ForecastRequest,
    source: &dyn PriceSource,
    model: &dyn ForecastModel,
) -> Result<ForecastOutcome, ForecastError> {
    log_submitted(request, source.id());
    let prices = fetch_prices(source, request.symbol(), request.start(), request.end()).await?;
    finish_staged(request, source.id(), model, prices, |_| {})
}

/// Fits and forecasts on already fetched closes, reporting
/// [`Stage::Fitting`] and [`Stage::Forecasting`] to `on_stage` before
/// entering each.
pub fn finish_staged<F>(
    request: &ForecastRequest,
    source: ProviderId,
    model: &dyn ForecastModel,
    prices: PriceSeries,
    mut on_stage: F,
) -> Result<ForecastOutcome, ForecastError>
where
    F: FnMut(Stage),
{
    on_stage(Stage::Fitting);
    let last = last_date(&prices, request.order())?;
    let fitted = fit_model(model, &prices, request.order())?;

    on_stage(Stage::Forecasting);
    let forecast = extend_forecast(fitted.as_ref(), last, request.horizon())?;
    let combined = build_combined(&prices, &forecast);

    info!(
        symbol = %request.symbol(),
        observations = prices.len(),
        periods = forecast.len(),
        "forecast complete"
    );

    Ok(ForecastOutcome {
        request: request.clone(),
        source,
        model: model.name().to_owned(),
        prices,
        forecast,
        combined,
    })
}

pub(crate) fn log_submitted(request: &ForecastRequest, source: ProviderId) {
    info!(
        symbol = %request.symbol(),
        start = %request.start(),
        end = %request.end(),
        order = %request.order(),
        horizon = request.horizon().months(),
        %source,
        "forecast submitted"
    );
}

fn last_date(prices: &PriceSeries, order: ArimaOrder) -> Result<MarketDate, ForecastError> {
    prices.last().map(|point| point.date).ok_or_else(|| {
        ForecastError::ModelFit(ModelError::InsufficientData {
            required: order.min_observations(),
            actual: 0,
        })
    })
}

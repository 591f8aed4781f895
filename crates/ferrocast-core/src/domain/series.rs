use serde::{Deserialize, Serialize};

use crate::{MarketDate, Symbol, ValidationError};

/// Closing price for one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: MarketDate,
    pub close: f64,
}

impl PricePoint {
    pub const fn new(date: MarketDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily closing prices for one symbol, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: Symbol,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts `points` by date and rejects duplicate dates or non-finite closes.
    pub fn new(symbol: Symbol, mut points: Vec<PricePoint>) -> Result<Self, ValidationError> {
        if points.iter().any(|point| !point.close.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "close" });
        }

        points.sort_by_key(|point| point.date);
        if let Some(pair) = points.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(ValidationError::DuplicateDate {
                date: pair[0].date.to_string(),
            });
        }

        Ok(Self { symbol, points })
    }

    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.close).collect()
    }
}

/// One forecasted period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: MarketDate,
    pub forecast: f64,
}

impl ForecastPoint {
    pub const fn new(date: MarketDate, forecast: f64) -> Self {
        Self { date, forecast }
    }
}

/// Forecast values indexed by strictly increasing period dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn new(points: Vec<ForecastPoint>) -> Result<Self, ValidationError> {
        if points.iter().any(|point| !point.forecast.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "forecast" });
        }
        if let Some(pair) = points.windows(2).find(|pair| pair[0].date >= pair[1].date) {
            return Err(ValidationError::UnorderedDates {
                previous: pair[0].date.to_string(),
                next: pair[1].date.to_string(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.forecast).collect()
    }
}

/// Which part of a [`CombinedSeries`] a point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Historical,
    Forecast,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedPoint {
    pub date: MarketDate,
    pub value: f64,
    pub kind: SeriesKind,
}

/// Historical closes followed by forecasts, ordered by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedSeries {
    points: Vec<CombinedPoint>,
}

impl CombinedSeries {
    pub(crate) fn from_sorted(points: Vec<CombinedPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[CombinedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn historical(&self) -> impl Iterator<Item = &CombinedPoint> {
        self.points
            .iter()
            .filter(|point| point.kind == SeriesKind::Historical)
    }

    pub fn forecast(&self) -> impl Iterator<Item = &CombinedPoint> {
        self.points
            .iter()
            .filter(|point| point.kind == SeriesKind::Forecast)
    }
}

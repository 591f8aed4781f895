use std::fmt::{Display, Formatter};

use ferrocast_model::ArimaOrder;
use serde::{Deserialize, Serialize};

use crate::{MarketDate, Symbol, ValidationError};

pub const MAX_AR_ORDER: usize = 5;
pub const MAX_DIFFERENCING: usize = 2;
pub const MAX_MA_ORDER: usize = 5;

/// Build an [`ArimaOrder`] restricted to the ranges the form offers.
pub fn bounded_order(p: usize, d: usize, q: usize) -> Result<ArimaOrder, ValidationError> {
    for (name, value, max) in [
        ("p", p, MAX_AR_ORDER),
        ("d", d, MAX_DIFFERENCING),
        ("q", q, MAX_MA_ORDER),
    ] {
        if value > max {
            return Err(ValidationError::OrderOutOfRange { name, value, max });
        }
    }
    Ok(ArimaOrder::new(p, d, q))
}

/// Number of monthly periods to forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Horizon(usize);

impl Horizon {
    pub const MIN: usize = 1;
    pub const MAX: usize = 24;

    pub fn new(months: usize) -> Result<Self, ValidationError> {
        if !(Self::MIN..=Self::MAX).contains(&months) {
            return Err(ValidationError::HorizonOutOfRange {
                value: months,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(months))
    }

    pub const fn months(self) -> usize {
        self.0
    }
}

impl Display for Horizon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for Horizon {
    type Error = ValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Horizon> for usize {
    fn from(value: Horizon) -> Self {
        value.0
    }
}

/// A validated, immutable forecast submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastRequest {
    symbol: Symbol,
    start: MarketDate,
    end: MarketDate,
    order: ArimaOrder,
    horizon: Horizon,
}

impl ForecastRequest {
    pub fn new(
        symbol: Symbol,
        start: MarketDate,
        end: MarketDate,
        order: ArimaOrder,
        horizon: Horizon,
    ) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let order = bounded_order(order.p, order.d, order.q)?;

        Ok(Self {
            symbol,
            start,
            end,
            order,
            horizon,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn start(&self) -> MarketDate {
        self.start
    }

    /// Exclusive upper bound of the price history.
    pub fn end(&self) -> MarketDate {
        self.end
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }
}

//! Submission state for interactive front ends.

use std::fmt::{Display, Formatter};

use ferrocast_model::ForecastModel;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::data_source::PriceSource;
use crate::error::{ForecastError, ValidationError};
use crate::forecast::{
    fetch_prices, finish_staged, log_submitted, validate_request, ForecastOutcome,
};
use crate::{bounded_order, ForecastRequest, Horizon, MarketDate, PriceSeries};

pub const DEFAULT_TICKER: &str = "AAPL";
pub const DEFAULT_START: &str = "2022-01-01";
pub const DEFAULT_ORDER: (usize, usize, usize) = (2, 1, 2);
pub const DEFAULT_HORIZON: usize = 6;

/// Where a submission currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Validating,
    Fetching,
    Fitting,
    Forecasting,
    Rendering,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Fetching => "fetching",
            Self::Fitting => "fitting",
            Self::Forecasting => "forecasting",
            Self::Rendering => "rendering",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw form inputs as typed by the user.
///
/// Numeric fields stay text until [`ForecastForm::to_request`] so a blank or
/// malformed entry is reported like any other invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastForm {
    pub ticker: String,
    pub start: String,
    pub end: String,
    #[serde(deserialize_with = "text_or_number")]
    pub p: String,
    #[serde(deserialize_with = "text_or_number")]
    pub d: String,
    #[serde(deserialize_with = "text_or_number")]
    pub q: String,
    #[serde(deserialize_with = "text_or_number")]
    pub months: String,
}

impl ForecastForm {
    /// Form defaults with the end date set to `today`.
    pub fn with_today(today: MarketDate) -> Self {
        let (p, d, q) = DEFAULT_ORDER;
        Self {
            ticker: String::from(DEFAULT_TICKER),
            start: String::from(DEFAULT_START),
            end: today.to_string(),
            p: p.to_string(),
            d: d.to_string(),
            q: q.to_string(),
            months: DEFAULT_HORIZON.to_string(),
        }
    }

    /// Validates every field and builds an immutable request.
    pub fn to_request(&self, today: MarketDate) -> Result<ForecastRequest, ValidationError> {
        let start = MarketDate::parse(&self.start)?;
        let end = MarketDate::parse(&self.end)?;
        let symbol = validate_request(&self.ticker, start, end)?;
        if end > today {
            return Err(ValidationError::EndDateInFuture {
                end: end.to_string(),
                today: today.to_string(),
            });
        }
        let order = bounded_order(
            whole_number("p", &self.p)?,
            whole_number("d", &self.d)?,
            whole_number("q", &self.q)?,
        )?;
        let horizon = Horizon::new(whole_number("months", &self.months)?)?;
        ForecastRequest::new(symbol, start, end, order, horizon)
    }
}

fn whole_number(field: &'static str, value: &str) -> Result<usize, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidNumber {
            field,
            value: value.to_owned(),
        })
}

/// Accepts `2` and `"2"` alike; JSON clients send numbers, forms send text.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Integer(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
        Raw::Text(value) => value,
    })
}

impl Default for ForecastForm {
    fn default() -> Self {
        Self::with_today(MarketDate::today_utc())
    }
}

/// One user's form, the stage of the running submission and the last result.
///
/// A failed submission clears the previous outcome and returns to
/// [`Stage::Idle`]. Closes fetched by the current submission are kept even
/// when fitting fails afterwards.
#[derive(Debug, Clone, Default)]
pub struct ForecastSession {
    form: ForecastForm,
    stage: Stage,
    prices: Option<PriceSeries>,
    outcome: Option<ForecastOutcome>,
    last_error: Option<ForecastError>,
    trail: Vec<Stage>,
}

impl ForecastSession {
    pub fn new(form: ForecastForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn form(&self) -> &ForecastForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ForecastForm {
        &mut self.form
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Closes fetched by the most recent submission, if the fetch succeeded.
    pub fn prices(&self) -> Option<&PriceSeries> {
        self.prices.as_ref()
    }

    pub fn outcome(&self) -> Option<&ForecastOutcome> {
        self.outcome.as_ref()
    }

    pub fn last_error(&self) -> Option<&ForecastError> {
        self.last_error.as_ref()
    }

    /// Stages entered by the most recent submission, in order.
    pub fn trail(&self) -> &[Stage] {
        &self.trail
    }

    /// Validates the form and runs the whole workflow.
    ///
    /// On success the session is left in [`Stage::Rendering`] until
    /// [`ForecastSession::finish_rendering`] is called.
    pub async fn submit(
        &mut self,
        source: &dyn PriceSource,
        model: &dyn ForecastModel,
        today: MarketDate,
    ) -> Result<&ForecastOutcome, ForecastError> {
        self.trail.clear();
        self.last_error = None;
        self.prices = None;
        self.enter(Stage::Validating);

        let request = match self.form.to_request(today) {
            Ok(request) => request,
            Err(error) => return Err(self.fail(error.into())),
        };
        log_submitted(&request, source.id());

        self.enter(Stage::Fetching);
        let prices = match fetch_prices(source, request.symbol(), request.start(), request.end()).await
        {
            Ok(prices) => self.prices.insert(prices).clone(),
            Err(error) => return Err(self.fail(error)),
        };

        let trail = &mut self.trail;
        let stage = &mut self.stage;
        let result = finish_staged(&request, source.id(), model, prices, |next| {
            transition(stage, trail, next);
        });

        match result {
            Ok(outcome) => {
                self.enter(Stage::Rendering);
                Ok(self.outcome.insert(outcome))
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Marks the current outcome as displayed.
    pub fn finish_rendering(&mut self) {
        if self.stage == Stage::Rendering {
            self.enter(Stage::Idle);
        }
    }

    fn enter(&mut self, next: Stage) {
        transition(&mut self.stage, &mut self.trail, next);
    }

    fn fail(&mut self, error: ForecastError) -> ForecastError {
        debug!(stage = %self.stage, code = error.code(), "submission failed");
        self.outcome = None;
        self.last_error = Some(error.clone());
        self.enter(Stage::Idle);
        error
    }
}

fn transition(stage: &mut Stage, trail: &mut Vec<Stage>, next: Stage) {
    debug!(from = %stage, to = %next, "stage transition");
    *stage = next;
    trail.push(next);
}

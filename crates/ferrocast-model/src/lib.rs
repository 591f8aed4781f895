//! # Ferrocast Model
//!
//! Univariate forecasting models used by the ferrocast orchestrator.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`ForecastModel`] | Estimation contract the orchestrator depends on |
//! | [`FittedModel`] | Estimated parameters able to extrapolate |
//! | [`ArimaEstimator`] | Default [`ForecastModel`] backed by [`Arima`] |
//! | [`Arima`] | ARIMA(p,d,q) estimation and point forecasts |
//! | [`ModelError`] | Estimation failures |
//!
//! Models are stateless from the caller's point of view: every call to
//! [`ForecastModel::fit`] estimates from scratch.

pub mod arima;
pub mod error;
mod linalg;

pub use arima::{Arima, ArimaOrder};
pub use error::ModelError;

/// Estimation contract.
///
/// Implementations must be `Send + Sync` so a single instance can serve the
/// web front end.
pub trait ForecastModel: Send + Sync {
    /// Short model label used in logs and output metadata.
    fn name(&self) -> &str;

    /// Estimates parameters of the given order on `history`.
    fn fit(&self, history: &[f64], order: ArimaOrder) -> Result<Box<dyn FittedModel>, ModelError>;

    /// Fits on `history` and returns `steps` point forecasts following the
    /// last observation.
    fn fit_forecast(
        &self,
        history: &[f64],
        order: ArimaOrder,
        steps: usize,
    ) -> Result<Vec<f64>, ModelError> {
        self.fit(history, order)?.forecast(steps)
    }
}

/// A model whose parameters have been estimated.
pub trait FittedModel: Send + Sync {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ModelError>;
}

impl FittedModel for Arima {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ModelError> {
        Arima::forecast(self, steps)
    }
}

/// [`ForecastModel`] that estimates a fresh [`Arima`] per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArimaEstimator;

impl ForecastModel for ArimaEstimator {
    fn name(&self) -> &str {
        "arima"
    }

    fn fit(&self, history: &[f64], order: ArimaOrder) -> Result<Box<dyn FittedModel>, ModelError> {
        let mut model = Arima::new(order)?;
        model.fit(history)?;
        Ok(Box::new(model))
    }
}

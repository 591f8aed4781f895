//! ARIMA (AutoRegressive Integrated Moving Average) estimation.
//!
//! The series is differenced `d` times, an ARMA(p, q) is estimated on the
//! result with the Hannan-Rissanen two-stage regression, and forecasts are
//! produced recursively (future shocks set to zero) before being integrated
//! back onto the original scale.
//!
//! - **AR (p)**: weights on past values of the differenced series
//! - **I (d)**: number of differencing passes
//! - **MA (q)**: weights on past one-step innovations
//!
//! A mean term is estimated only when `d == 0`; with differencing the model
//! carries no drift, so an ARIMA(0,1,0) forecast is the last observation.
//!
//! ## Example
//!
//! ```rust
//! use ferrocast_model::{Arima, ArimaOrder};
//!
//! let data: Vec<f64> = (1..=40).map(|x| x as f64 + (x as f64 * 0.7).sin()).collect();
//! let mut model = Arima::new(ArimaOrder::new(1, 1, 0)).unwrap();
//! model.fit(&data).unwrap();
//! let forecast = model.forecast(3).unwrap();
//! assert_eq!(forecast.len(), 3);
//! ```

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::linalg::{autocovariances, least_squares, levinson_durbin};

pub const MAX_AR_ORDER: usize = 10;
pub const MAX_DIFFERENCING: usize = 2;
pub const MAX_MA_ORDER: usize = 10;

/// The (p, d, q) order of an ARIMA model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Smallest history length the estimator accepts for this order.
    pub const fn min_observations(self) -> usize {
        self.p + self.d + self.q + 10
    }
}

impl Display for ArimaOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA model state after (or before) fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arima {
    order: ArimaOrder,
    ar_coeffs: Vec<f64>,
    ma_coeffs: Vec<f64>,
    mean: f64,
    sigma2: f64,
    /// Last observation at each differencing level, level 0 first.
    tails: Vec<f64>,
    /// Differenced, mean-removed working series.
    working: Vec<f64>,
    residuals: Vec<f64>,
    fitted: bool,
}

impl Arima {
    pub fn new(order: ArimaOrder) -> Result<Self, ModelError> {
        if order.p > MAX_AR_ORDER {
            return Err(ModelError::InvalidParameter {
                name: "p",
                reason: format!("AR order must be <= {MAX_AR_ORDER}"),
            });
        }
        if order.d > MAX_DIFFERENCING {
            return Err(ModelError::InvalidParameter {
                name: "d",
                reason: format!("differencing order must be <= {MAX_DIFFERENCING}"),
            });
        }
        if order.q > MAX_MA_ORDER {
            return Err(ModelError::InvalidParameter {
                name: "q",
                reason: format!("MA order must be <= {MAX_MA_ORDER}"),
            });
        }

        Ok(Self {
            order,
            ar_coeffs: vec![0.0; order.p],
            ma_coeffs: vec![0.0; order.q],
            mean: 0.0,
            sigma2: 0.0,
            tails: Vec::new(),
            working: Vec::new(),
            residuals: Vec::new(),
            fitted: false,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coeffs
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coeffs
    }

    /// Estimated mean of the differenced series (zero when `d > 0`).
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Innovation variance over the conditioned sample.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn fit(&mut self, data: &[f64]) -> Result<(), ModelError> {
        let ArimaOrder { p, d, q } = self.order;

        let required = self.order.min_observations();
        if data.len() < required {
            return Err(ModelError::InsufficientData {
                required,
                actual: data.len(),
            });
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::InvalidData(
                "series contains NaN or infinite values".to_string(),
            ));
        }

        let mut tails = Vec::with_capacity(d);
        let mut level = data.to_vec();
        for _ in 0..d {
            tails.push(level[level.len() - 1]);
            level = difference(&level);
        }

        let mean = if d == 0 {
            level.iter().sum::<f64>() / level.len() as f64
        } else {
            0.0
        };
        let working: Vec<f64> = level.iter().map(|x| x - mean).collect();
        let n = working.len();

        let (ar_coeffs, ma_coeffs) = if p == 0 && q == 0 {
            (Vec::new(), Vec::new())
        } else {
            let (innovations, long_order) = if q > 0 {
                let long_order = long_ar_order(n, p, q);
                (long_ar_innovations(&working, long_order)?, long_order)
            } else {
                (Vec::new(), 0)
            };

            let start = if q > 0 { p.max(long_order + q) } else { p };
            if n <= start + p + q {
                return Err(ModelError::InsufficientData {
                    required: start + p + q + 1 + d,
                    actual: data.len(),
                });
            }

            let mut design = Vec::with_capacity(n - start);
            let mut target = Vec::with_capacity(n - start);
            for t in start..n {
                let mut row = Vec::with_capacity(p + q);
                row.extend((1..=p).map(|lag| working[t - lag]));
                row.extend((1..=q).map(|lag| innovations[t - lag]));
                design.push(row);
                target.push(working[t]);
            }

            let beta = least_squares(&design, &target).ok_or(ModelError::SingularSystem)?;
            if beta.iter().any(|value| !value.is_finite()) {
                return Err(ModelError::NonFiniteEstimate {
                    what: "coefficients",
                });
            }
            let (ar, ma) = beta.split_at(p);
            (ar.to_vec(), ma.to_vec())
        };

        let residuals = conditional_residuals(&working, &ar_coeffs, &ma_coeffs);
        if residuals.iter().any(|value| !value.is_finite()) {
            return Err(ModelError::NonFiniteEstimate { what: "residuals" });
        }
        let conditioned = &residuals[p.min(n)..];
        let sigma2 = if conditioned.is_empty() {
            0.0
        } else {
            conditioned.iter().map(|e| e * e).sum::<f64>() / conditioned.len() as f64
        };

        debug!(
            order = %self.order,
            observations = data.len(),
            sigma2,
            "fitted arima model"
        );

        self.ar_coeffs = ar_coeffs;
        self.ma_coeffs = ma_coeffs;
        self.mean = mean;
        self.sigma2 = sigma2;
        self.tails = tails;
        self.working = working;
        self.residuals = residuals;
        self.fitted = true;
        Ok(())
    }

    /// Point forecasts for the next `steps` periods on the original scale.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>, ModelError> {
        if !self.fitted {
            return Err(ModelError::NotFitted);
        }
        if steps == 0 {
            return Ok(Vec::new());
        }

        let n = self.working.len();
        let mut extended = self.working.clone();
        let mut shocks = self.residuals.clone();

        for _ in 0..steps {
            let t = extended.len();
            let mut value = 0.0;
            for (i, coeff) in self.ar_coeffs.iter().enumerate() {
                value += coeff * extended[t - 1 - i];
            }
            for (j, coeff) in self.ma_coeffs.iter().enumerate() {
                if let Some(shock) = t.checked_sub(j + 1).and_then(|idx| shocks.get(idx)) {
                    value += coeff * shock;
                }
            }
            extended.push(value);
            shocks.push(0.0);
        }

        let mut forecasts: Vec<f64> = extended[n..].iter().map(|x| x + self.mean).collect();
        for tail in self.tails.iter().rev() {
            let mut running = *tail;
            for value in forecasts.iter_mut() {
                running += *value;
                *value = running;
            }
        }

        if forecasts.iter().any(|value| !value.is_finite()) {
            return Err(ModelError::NonFiniteEstimate { what: "forecast" });
        }
        Ok(forecasts)
    }
}

fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Order of the long autoregression used to proxy the innovations.
fn long_ar_order(n: usize, p: usize, q: usize) -> usize {
    let heuristic = (10.0 * (n as f64).log10()).ceil() as usize;
    heuristic.max(p + q).min((n / 3).max(1))
}

fn long_ar_innovations(working: &[f64], order: usize) -> Result<Vec<f64>, ModelError> {
    let acov = autocovariances(working, order);
    let phi = levinson_durbin(&acov, order).ok_or(ModelError::SingularSystem)?;

    let mut innovations = vec![0.0; working.len()];
    for t in order..working.len() {
        let fitted: f64 = phi
            .iter()
            .enumerate()
            .map(|(i, coeff)| coeff * working[t - 1 - i])
            .sum();
        innovations[t] = working[t] - fitted;
    }
    Ok(innovations)
}

fn conditional_residuals(working: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut residuals = vec![0.0; working.len()];
    for t in p..working.len() {
        let mut prediction = 0.0;
        for (i, coeff) in ar.iter().enumerate() {
            prediction += coeff * working[t - 1 - i];
        }
        for (j, coeff) in ma.iter().enumerate() {
            if let Some(idx) = t.checked_sub(j + 1) {
                prediction += coeff * residuals[idx];
            }
        }
        residuals[t] = working[t] - prediction;
    }
    residuals
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lcg(u64);

    impl Lcg {
        fn next_unit(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((self.0 >> 11) as f64 / (1_u64 << 53) as f64) * 2.0 - 1.0
        }
    }

    #[test]
    fn rejects_out_of_range_orders() {
        assert!(Arima::new(ArimaOrder::new(11, 0, 0)).is_err());
        assert!(Arima::new(ArimaOrder::new(1, 3, 0)).is_err());
        assert!(Arima::new(ArimaOrder::new(0, 0, 11)).is_err());
        assert!(Arima::new(ArimaOrder::new(2, 1, 2)).is_ok());
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let mut rng = Lcg(42);
        let mut x = 0.0;
        let data: Vec<f64> = (0..800)
            .map(|_| {
                x = 0.6 * x + rng.next_unit();
                50.0 + x
            })
            .collect();

        let mut model = Arima::new(ArimaOrder::new(1, 0, 0)).expect("valid order");
        model.fit(&data).expect("fit should succeed");

        let phi = model.ar_coefficients()[0];
        assert!((phi - 0.6).abs() < 0.1, "phi = {phi}");
        assert!((model.mean() - 50.0).abs() < 0.5);
    }

    #[test]
    fn random_walk_forecast_is_last_value() {
        let data: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 1.3).sin()).collect();
        let mut model = Arima::new(ArimaOrder::new(0, 1, 0)).expect("valid order");
        model.fit(&data).expect("fit");

        let last = data[data.len() - 1];
        for value in model.forecast(4).expect("forecast") {
            assert!((value - last).abs() < 1e-12);
        }
    }

    #[test]
    fn second_differencing_extends_linear_trend() {
        let data: Vec<f64> = (0..25).map(|t| 3.0 + 2.0 * t as f64).collect();
        let mut model = Arima::new(ArimaOrder::new(0, 2, 0)).expect("valid order");
        model.fit(&data).expect("fit");

        let forecast = model.forecast(3).expect("forecast");
        assert_eq!(forecast, vec![53.0, 55.0, 57.0]);
    }

    #[test]
    fn arma_fit_on_noisy_walk_produces_finite_forecasts() {
        let mut rng = Lcg(7);
        let mut level = 150.0;
        let data: Vec<f64> = (0..120)
            .map(|_| {
                level += rng.next_unit();
                level
            })
            .collect();

        let mut model = Arima::new(ArimaOrder::new(2, 1, 2)).expect("valid order");
        model.fit(&data).expect("fit");
        let forecast = model.forecast(6).expect("forecast");

        assert_eq!(forecast.len(), 6);
        assert!(forecast.iter().all(|v| v.is_finite()));
        assert!(model.sigma2() > 0.0);
    }

    #[test]
    fn short_series_is_rejected() {
        let mut model = Arima::new(ArimaOrder::new(2, 1, 2)).expect("valid order");
        let err = model.fit(&[1.0, 2.0, 3.0]).expect_err("must fail");
        assert!(matches!(
            err,
            ModelError::InsufficientData {
                required: 15,
                actual: 3
            }
        ));
    }

    #[test]
    fn constant_series_with_ar_terms_is_singular() {
        let data = vec![100.0; 40];
        let mut model = Arima::new(ArimaOrder::new(1, 1, 0)).expect("valid order");
        assert_eq!(model.fit(&data), Err(ModelError::SingularSystem));
    }

    #[test]
    fn forecasting_before_fit_fails() {
        let model = Arima::new(ArimaOrder::new(1, 0, 0)).expect("valid order");
        assert_eq!(model.forecast(2), Err(ModelError::NotFitted));
    }
}

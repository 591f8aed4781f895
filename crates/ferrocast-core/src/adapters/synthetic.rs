use std::future::Future;
use std::pin::Pin;

use crate::data_source::{HistoryRequest, PriceSource, SourceError};
use crate::{PricePoint, PriceSeries, ProviderId, Symbol};

const DAILY_DRIFT: f64 = 0.0004;
const DAILY_SWING: f64 = 0.02;

/// Offline price source producing a deterministic random walk per symbol.
///
/// Weekends are skipped; the same request always yields the same closes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl SyntheticSource {
    pub const fn new() -> Self {
        Self
    }

    fn generate(&self, req: &HistoryRequest) -> Result<PriceSeries, SourceError> {
        let mut state = symbol_seed(&req.symbol);
        let mut close = 50.0 + (state % 200) as f64;
        let mut points = Vec::new();

        let mut date = req.start;
        while date < req.end {
            if !date.is_weekend() {
                state = next_state(state);
                let shock = unit_interval(state) - 0.5;
                close *= 1.0 + DAILY_DRIFT + DAILY_SWING * shock;
                points.push(PricePoint::new(date, (close * 100.0).round() / 100.0));
            }
            date = date
                .next_day()
                .map_err(|e| SourceError::invalid_request(e.to_string()))?;
        }

        PriceSeries::new(req.symbol.clone(), points).map_err(|e| SourceError::internal(e.to_string()))
    }
}

impl PriceSource for SyntheticSource {
    fn id(&self) -> ProviderId {
        ProviderId::Synthetic
    }

    fn daily_closes<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.generate(&req) })
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(5381_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}

fn next_state(state: u64) -> u64 {
    state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407)
}

fn unit_interval(state: u64) -> f64 {
    (state >> 11) as f64 / (1_u64 << 53) as f64
}

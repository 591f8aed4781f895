use std::path::PathBuf;
use std::time::Instant;

use ferrocast_core::{
    export_csv, ArimaEstimator, Envelope, ForecastForm, ForecastOutcome, ForecastSession,
    MarketDate, PriceSource, ProviderId,
};
use tracing::info;

use crate::cli::ForecastArgs;
use crate::error::CliError;
use crate::metadata::Metadata;

/// Observations below which estimates are flagged as unreliable.
const SHORT_HISTORY: usize = 60;

pub struct ForecastReport {
    pub envelope: Envelope<ForecastOutcome>,
    pub csv_path: Option<PathBuf>,
}

pub async fn run(args: &ForecastArgs, source: &dyn PriceSource) -> Result<ForecastReport, CliError> {
    let today = MarketDate::today_utc();
    let mut session = ForecastSession::new(form_from_args(args, today));

    let started = Instant::now();
    let outcome = session
        .submit(source, &ArimaEstimator, today)
        .await?
        .clone();
    session.finish_rendering();
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let csv_path = match &args.output {
        Some(path) => {
            std::fs::write(path, export_csv(&outcome.forecast)?)?;
            info!(path = %path.display(), rows = outcome.forecast.len(), "forecast csv written");
            Some(path.clone())
        }
        None => None,
    };

    let mut metadata = Metadata::new(outcome.source, latency_ms).with_model(outcome.model.clone());
    for warning in warnings(&outcome) {
        metadata.push_warning(warning);
    }
    let meta = metadata.into_envelope_meta()?;

    Ok(ForecastReport {
        envelope: Envelope::success(meta, outcome),
        csv_path,
    })
}

fn form_from_args(args: &ForecastArgs, today: MarketDate) -> ForecastForm {
    ForecastForm {
        ticker: args.ticker.clone(),
        start: args.start.clone(),
        end: args.end.clone().unwrap_or_else(|| today.to_string()),
        p: args.p.to_string(),
        d: args.d.to_string(),
        q: args.q.to_string(),
        months: args.months.to_string(),
    }
}

fn warnings(outcome: &ForecastOutcome) -> Vec<String> {
    let mut warnings = Vec::new();
    if outcome.source == ProviderId::Synthetic {
        warnings.push(String::from("prices are synthetic, not market data"));
    }
    if outcome.prices.len() < SHORT_HISTORY {
        warnings.push(format!(
            "only {} closes available; estimates may be unstable",
            outcome.prices.len()
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrocast_core::SyntheticSource;

    fn args(ticker: &str, output: Option<PathBuf>) -> ForecastArgs {
        ForecastArgs {
            ticker: String::from(ticker),
            start: String::from("2022-01-01"),
            end: Some(String::from("2022-07-01")),
            p: 1,
            d: 1,
            q: 1,
            months: 3,
            output,
            raw_close: false,
        }
    }

    #[tokio::test]
    async fn writes_csv_and_builds_envelope() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("forecast.csv");

        let report = run(&args("aapl", Some(path.clone())), &SyntheticSource)
            .await
            .expect("forecast should succeed");

        let csv = std::fs::read_to_string(&path).expect("csv written");
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.starts_with("date,forecast\n"));
        assert_eq!(report.envelope.data.forecast.len(), 3);
        assert_eq!(report.envelope.meta.source, ProviderId::Synthetic);
        assert!(report
            .envelope
            .meta
            .warnings
            .iter()
            .any(|w| w.contains("synthetic")));
    }

    #[tokio::test]
    async fn blank_ticker_is_a_validation_failure() {
        let error = run(&args(" ", None), &SyntheticSource)
            .await
            .err()
            .expect("blank ticker must fail");
        assert_eq!(error.exit_code(), 2);
    }
}

//! Behavior-driven tests for the forecast workflow
//!
//! These tests verify WHAT a submission produces: the forecast table, the
//! combined chart series and the CSV download, using stub price sources and
//! stub models so no network or estimation is involved.

use std::future::Future;
use std::pin::Pin;

use ferrocast_core::{
    build_combined, export_csv, run, run_forecast, ArimaEstimator, ArimaOrder, FittedModel,
    ForecastForm, ForecastModel, ForecastRequest, ForecastSession, HistoryRequest, Horizon,
    MarketDate, ModelError, PricePoint, PriceSeries, PriceSource, ProviderId, SeriesKind,
    SourceError, Stage, Symbol, SyntheticSource, CSV_CONTENT_TYPE, CSV_FILE_NAME,
};

// =============================================================================
// Stubs
// =============================================================================

struct FixedSource {
    points: Vec<(&'static str, f64)>,
}

impl PriceSource for FixedSource {
    fn id(&self) -> ProviderId {
        ProviderId::Synthetic
    }

    fn daily_closes<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        let points = self
            .points
            .iter()
            .map(|(day, close)| PricePoint::new(date(day), *close))
            .collect();
        Box::pin(async move {
            PriceSeries::new(req.symbol, points).map_err(|e| SourceError::internal(e.to_string()))
        })
    }
}

struct ConstantModel(f64);

struct ConstantFit(f64);

impl ForecastModel for ConstantModel {
    fn name(&self) -> &str {
        "constant"
    }

    fn fit(&self, _: &[f64], _: ArimaOrder) -> Result<Box<dyn FittedModel>, ModelError> {
        Ok(Box::new(ConstantFit(self.0)))
    }
}

impl FittedModel for ConstantFit {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.0; steps])
    }
}

/// Extends the slope between the last two observations.
struct LinearTrendModel;

struct LinearTrendFit {
    last: f64,
    slope: f64,
}

impl ForecastModel for LinearTrendModel {
    fn name(&self) -> &str {
        "linear-trend"
    }

    fn fit(&self, history: &[f64], _: ArimaOrder) -> Result<Box<dyn FittedModel>, ModelError> {
        let [.., previous, last] = history else {
            return Err(ModelError::InsufficientData {
                required: 2,
                actual: history.len(),
            });
        };
        Ok(Box::new(LinearTrendFit {
            last: *last,
            slope: last - previous,
        }))
    }
}

impl FittedModel for LinearTrendFit {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ModelError> {
        Ok((1..=steps)
            .map(|step| self.last + self.slope * step as f64)
            .collect())
    }
}

fn date(value: &str) -> MarketDate {
    MarketDate::parse(value).expect("valid date")
}

fn five_month_ends() -> FixedSource {
    FixedSource {
        points: vec![
            ("2022-01-31", 100.0),
            ("2022-02-28", 102.0),
            ("2022-03-31", 104.0),
            ("2022-04-29", 106.0),
            ("2022-05-31", 108.0),
        ],
    }
}

fn request(ticker: &str, start: &str, end: &str, months: usize) -> ForecastRequest {
    ForecastRequest::new(
        Symbol::parse(ticker).expect("valid symbol"),
        date(start),
        date(end),
        ArimaOrder::new(2, 1, 2),
        Horizon::new(months).expect("valid horizon"),
    )
    .expect("valid request")
}

// =============================================================================
// Forecast table
// =============================================================================

#[tokio::test]
async fn constant_model_yields_one_value_per_requested_month() {
    // Given: Five months of closes and a model that always predicts 100
    let source = five_month_ends();
    let prices = source
        .daily_closes(
            HistoryRequest::new(
                Symbol::parse("TEST").expect("valid"),
                date("2022-01-01"),
                date("2022-06-01"),
            )
            .expect("valid history request"),
        )
        .await
        .expect("stub prices");

    // When: Three months are forecast
    let forecast = run_forecast(
        &ConstantModel(100.0),
        &prices,
        ArimaOrder::new(2, 1, 2),
        Horizon::new(3).expect("valid"),
    )
    .expect("forecast should succeed");

    // Then: Exactly three month-end rows follow the last close
    assert_eq!(forecast.len(), 3);
    assert_eq!(forecast.values(), vec![100.0, 100.0, 100.0]);
    let dates: Vec<MarketDate> = forecast.points().iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![date("2022-06-30"), date("2022-07-31"), date("2022-08-31")]
    );
    assert!(dates[0] > date("2022-05-31"));
}

// =============================================================================
// Combined series and CSV download
// =============================================================================

#[tokio::test]
async fn end_to_end_submission_produces_chart_series_and_csv() {
    // Given: The TEST ticker with five monthly closes and a linear-trend model
    let source = five_month_ends();
    let request = request("TEST", "2022-01-01", "2022-06-01", 6);

    // When: The whole workflow runs
    let outcome = run(&request, &source, &LinearTrendModel)
        .await
        .expect("workflow should succeed");

    // Then: The combined series holds 5 closes followed by 6 forecasts
    assert_eq!(outcome.combined.len(), 5 + 6);
    assert_eq!(outcome.combined.historical().count(), 5);
    assert_eq!(outcome.combined.forecast().count(), 6);
    assert!(outcome
        .combined
        .points()
        .windows(2)
        .all(|pair| pair[0].date < pair[1].date));
    assert_eq!(outcome.forecast.values()[0], 110.0);
    assert_eq!(outcome.forecast.values()[5], 120.0);
    assert_eq!(outcome.model, "linear-trend");

    // And: The CSV download has a header plus one row per forecast month
    let bytes = export_csv(&outcome.forecast).expect("csv export");
    let text = String::from_utf8(bytes).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "date,forecast");
    assert_eq!(lines[1], "2022-06-30,110.0");
    assert_eq!(lines[6], "2022-11-30,120.0");
    assert_eq!(CSV_FILE_NAME, "forecast.csv");
    assert_eq!(CSV_CONTENT_TYPE, "text/csv");
}

#[tokio::test]
async fn combined_length_is_sum_of_parts() {
    // Given: A synthetic source over several months
    let request = request("MSFT", "2022-01-01", "2022-04-01", 4);

    // When: The workflow runs with a constant model
    let outcome = run(&request, &SyntheticSource, &ConstantModel(50.0))
        .await
        .expect("workflow should succeed");

    // Then: Combined length equals closes plus forecasts, tagged by origin
    assert_eq!(
        outcome.combined.len(),
        outcome.prices.len() + outcome.forecast.len()
    );
    let last_historical = outcome
        .combined
        .points()
        .iter()
        .rposition(|p| p.kind == SeriesKind::Historical)
        .expect("historical points");
    assert_eq!(last_historical + 1, outcome.prices.len());

    let rebuilt = build_combined(&outcome.prices, &outcome.forecast);
    assert_eq!(rebuilt, outcome.combined);
}

#[test]
fn csv_export_round_trips_through_a_reader() {
    // Given: A forecast written to a temporary file
    let prices = PriceSeries::new(
        Symbol::parse("TEST").expect("valid"),
        vec![
            PricePoint::new(date("2022-05-30"), 10.0),
            PricePoint::new(date("2022-05-31"), 10.5),
        ],
    )
    .expect("valid series");
    let forecast = run_forecast(
        &LinearTrendModel,
        &prices,
        ArimaOrder::new(0, 1, 0),
        Horizon::new(4).expect("valid"),
    )
    .expect("forecast");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CSV_FILE_NAME);
    std::fs::write(&path, export_csv(&forecast).expect("csv")).expect("write");

    // When: The file is read back with a CSV reader
    let mut reader = csv::Reader::from_path(&path).expect("reader");
    let headers: Vec<String> = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_owned)
        .collect();
    let rows: Vec<(String, f64)> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("rows parse");

    // Then: N points give N rows under the date,forecast header
    assert_eq!(headers, ["date", "forecast"]);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], (String::from("2022-06-30"), 11.0));
    assert_eq!(rows[3], (String::from("2022-09-30"), 12.5));
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn successful_session_walks_every_stage_and_returns_to_idle() {
    // Given: A form for the TEST ticker submitted on 2022-06-15
    let today = date("2022-06-15");
    let mut session = ForecastSession::new(ForecastForm {
        ticker: String::from("test"),
        start: String::from("2022-01-01"),
        end: String::from("2022-06-01"),
        ..ForecastForm::with_today(today)
    });

    // When: The form is submitted and the result rendered
    let periods = session
        .submit(&five_month_ends(), &ConstantModel(1.0), today)
        .await
        .expect("submission should succeed")
        .forecast
        .len();
    assert_eq!(session.stage(), Stage::Rendering);
    session.finish_rendering();

    // Then: Every stage was visited in order and the outcome is kept
    assert_eq!(periods, 6);
    assert_eq!(
        session.trail(),
        &[
            Stage::Validating,
            Stage::Fetching,
            Stage::Fitting,
            Stage::Forecasting,
            Stage::Rendering,
            Stage::Idle,
        ]
    );
    assert!(session.outcome().is_some());
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn arima_estimator_forecasts_synthetic_history() {
    // Given: Half a year of synthetic closes
    let request = request("AAPL", "2022-01-01", "2022-07-01", 6);

    // When: The default ARIMA(2,1,2) estimator runs
    let outcome = run(&request, &SyntheticSource, &ArimaEstimator)
        .await
        .expect("arima forecast should succeed");

    // Then: Six finite month-end forecasts follow the history
    assert_eq!(outcome.forecast.len(), 6);
    assert!(outcome.forecast.values().iter().all(|v| v.is_finite()));
    assert_eq!(outcome.forecast.points()[0].date, date("2022-07-31"));
}

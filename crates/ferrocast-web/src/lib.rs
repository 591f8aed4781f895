//! Single-page web UI for ferrocast.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /` | Form plus the most recent charts, table or error |
//! | `POST /forecast` | Submit the form |
//! | `GET /forecast.csv` | Download the most recent forecast |
//! | `POST /api/forecast` | JSON submission answered with an envelope |
//! | `GET /health` | Liveness probe |
//!
//! Submissions are processed one at a time behind a single async mutex.

mod page;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use ferrocast_core::{ForecastForm, ForecastModel, ForecastSession, MarketDate, PriceSource};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn PriceSource>,
    model: Arc<dyn ForecastModel>,
    session: Arc<Mutex<ForecastSession>>,
    clock: fn() -> MarketDate,
}

impl AppState {
    pub fn new(source: Arc<dyn PriceSource>, model: Arc<dyn ForecastModel>) -> Self {
        Self::with_clock(source, model, MarketDate::today_utc)
    }

    /// State whose notion of "today" comes from `clock`.
    pub fn with_clock(
        source: Arc<dyn PriceSource>,
        model: Arc<dyn ForecastModel>,
        clock: fn() -> MarketDate,
    ) -> Self {
        let session = ForecastSession::new(ForecastForm::with_today(clock()));
        Self {
            source,
            model,
            session: Arc::new(Mutex::new(session)),
            clock,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/forecast", post(routes::submit))
        .route("/forecast.csv", get(routes::download_csv))
        .route("/api/forecast", post(routes::api_forecast))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "ferrocast v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        listener.local_addr()?
    );
    axum::serve(listener, router(state)).await
}

//! HTTP handlers.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use ferrocast_core::{
    export_csv, Envelope, EnvelopeError, EnvelopeMeta, ForecastErrorKind, ForecastForm,
    ForecastSession, CSV_CONTENT_TYPE, CSV_FILE_NAME,
};
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::{page, AppState};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    Html(page::render(&session))
}

/// Form submission: runs the workflow and re-renders the page with either
/// the results or an inline error.
pub async fn submit(State(state): State<AppState>, Form(form): Form<ForecastForm>) -> Html<String> {
    let today = (state.clock)();
    let mut session = state.session.lock().await;
    *session.form_mut() = form;

    if let Err(error) = session
        .submit(state.source.as_ref(), state.model.as_ref(), today)
        .await
    {
        info!(code = error.code(), "forecast submission rejected");
    }

    let html = page::render(&session);
    session.finish_rendering();
    Html(html)
}

/// CSV download of the most recent forecast.
pub async fn download_csv(State(state): State<AppState>) -> Response {
    let session = state.session.lock().await;
    let Some(outcome) = session.outcome() else {
        return (StatusCode::NOT_FOUND, "no forecast has been run yet").into_response();
    };

    match export_csv(&outcome.forecast) {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{CSV_FILE_NAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "csv export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "csv export failed").into_response()
        }
    }
}

/// JSON API: same workflow, answered with an envelope. Does not touch the
/// page's session but waits for the same lock.
pub async fn api_forecast(State(state): State<AppState>, Json(form): Json<ForecastForm>) -> Response {
    let today = (state.clock)();
    let started = std::time::Instant::now();
    let _guard = state.session.lock().await;

    let mut session = ForecastSession::new(form);
    let result = session
        .submit(state.source.as_ref(), state.model.as_ref(), today)
        .await
        .cloned();
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let meta = match EnvelopeMeta::new(Uuid::new_v4().to_string(), state.source.id(), latency_ms) {
        Ok(meta) => meta.with_model(state.model.name()),
        Err(err) => {
            error!(error = %err, "invalid envelope metadata");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match result {
        Ok(outcome) => Json(Envelope::success(meta, outcome)).into_response(),
        Err(forecast_error) => {
            let status = match forecast_error.kind() {
                ForecastErrorKind::Validation | ForecastErrorKind::ModelFit => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ForecastErrorKind::DataUnavailable => StatusCode::NOT_FOUND,
                ForecastErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            };
            let errors = vec![EnvelopeError::from(&forecast_error).with_source(state.source.id())];
            match Envelope::with_errors(meta, Value::Null, errors) {
                Ok(envelope) => (status, Json(envelope)).into_response(),
                Err(err) => {
                    error!(error = %err, "invalid error envelope");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

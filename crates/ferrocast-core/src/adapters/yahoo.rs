use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::data_source::{HistoryRequest, PriceSource, SourceError};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{MarketDate, PricePoint, PriceSeries, ProviderId, Symbol};

const CHART_ENDPOINT: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const COOKIE_ENDPOINT: &str = "https://fc.yahoo.com";
const CRUMB_ENDPOINTS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER: &str = "https://finance.yahoo.com/";

/// Daily closes from the Yahoo Finance v8 chart endpoint.
///
/// Each call performs its own cookie/crumb handshake unless a cookie is
/// configured; nothing is cached between calls.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    config: SourceConfig,
}

/// Session obtained by one handshake, dropped when the call returns.
#[derive(Debug, Default)]
struct Session {
    auth: Option<HttpAuth>,
    crumb: Option<String>,
}

impl YahooAdapter {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            http_client: Arc::new(ReqwestHttpClient::new(&config)),
            config,
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, config: SourceConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn request(&self, url: impl Into<String>, auth: &HttpAuth) -> HttpRequest {
        HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_auth(auth)
            .with_timeout_ms(self.config.timeout_ms)
    }

    /// Best-effort session handshake. A missing crumb is not fatal: the
    /// chart endpoint usually answers without one and reports its own
    /// status when it does not.
    async fn handshake(&self) -> Session {
        if self.config.cookie.is_some() {
            return Session {
                auth: Some(HttpAuth::from_config(&self.config)),
                crumb: None,
            };
        }

        // fc.yahoo.com answers 404 but still sets the session cookie.
        let auth = match self
            .http_client
            .execute(self.request(COOKIE_ENDPOINT, &HttpAuth::None))
            .await
        {
            Ok(response) => response.cookie_header().map(HttpAuth::Cookie),
            Err(error) => {
                debug!(error = %error, "yahoo cookie request failed");
                return Session::default();
            }
        };
        let crumb_auth = auth.clone().unwrap_or(HttpAuth::None);

        for endpoint in CRUMB_ENDPOINTS {
            match self
                .http_client
                .execute(self.request(endpoint, &crumb_auth))
                .await
            {
                Ok(response) if response.is_success() => {
                    if let Some(crumb) = accept_crumb(&response.body) {
                        return Session {
                            auth,
                            crumb: Some(crumb),
                        };
                    }
                }
                Ok(response) => debug!(endpoint, status = response.status, "crumb rejected"),
                Err(error) => debug!(endpoint, error = %error, "crumb request failed"),
            }
        }

        warn!("continuing without a yahoo crumb");
        Session { auth, crumb: None }
    }

    async fn fetch_daily_closes(&self, req: &HistoryRequest) -> Result<PriceSeries, SourceError> {
        let session = self.handshake().await;
        let url = chart_url(req, session.crumb.as_deref());
        let auth = session.auth.unwrap_or(HttpAuth::None);
        debug!(symbol = %req.symbol, %url, "requesting yahoo chart");

        let response = self
            .http_client
            .execute(self.request(url, &auth))
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::unavailable(format!("yahoo request timed out: {}", e.message()))
                } else {
                    SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
                }
            })?;

        match response.status {
            200..=299 => {}
            404 => {
                debug!(symbol = %req.symbol, "yahoo reports symbol not found");
                return Ok(PriceSeries::empty(req.symbol.clone()));
            }
            429 => {
                return Err(SourceError::rate_limited(
                    "yahoo rate limit reached (status 429)",
                ))
            }
            status => {
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {status}"
                )))
            }
        }

        parse_chart_response(
            &req.symbol,
            &response.body,
            self.config.adjusted_close,
            req.start,
            req.end,
        )
    }
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::new(SourceConfig::default())
    }
}

impl PriceSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn daily_closes<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_daily_closes(&req).await })
    }
}

fn accept_crumb(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() || body.len() >= 100 || body.contains(' ') || body.contains('<') {
        return None;
    }
    Some(body.to_owned())
}

fn chart_url(req: &HistoryRequest, crumb: Option<&str>) -> String {
    let mut url = format!(
        "{CHART_ENDPOINT}/{}?period1={}&period2={}&interval=1d&events=history&includeAdjustedClose=true",
        urlencoding::encode(req.symbol.as_str()),
        req.start.unix_midnight(),
        req.end.unix_midnight(),
    );
    if let Some(crumb) = crumb {
        url.push_str("&crumb=");
        url.push_str(&urlencoding::encode(crumb));
    }
    url
}

/// Parse a v8 chart payload into daily closes within `[start, end)`.
///
/// Sessions are dated in the exchange's local time. Null closes are
/// skipped and a repeated date keeps the last value reported for it.
pub fn parse_chart_response(
    symbol: &Symbol,
    body: &str,
    adjusted: bool,
    start: MarketDate,
    end: MarketDate,
) -> Result<PriceSeries, SourceError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(PriceSeries::empty(symbol.clone()));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart error {}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(result) = response.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(PriceSeries::empty(symbol.clone()));
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(PriceSeries::empty(symbol.clone()));
    };

    let adjusted_closes = result
        .indicators
        .adjclose
        .and_then(|series| series.into_iter().next())
        .map(|series| series.adjclose)
        .filter(|_| adjusted);
    let closes = match adjusted_closes {
        Some(values) => values,
        None => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|quote| quote.close)
            .ok_or_else(|| SourceError::parse("yahoo chart has no quote indicators"))?,
    };

    if closes.len() != timestamps.len() {
        return Err(SourceError::parse(format!(
            "yahoo chart has {} timestamps but {} closes",
            timestamps.len(),
            closes.len()
        )));
    }

    let offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);
    let mut by_date = BTreeMap::new();
    for (timestamp, close) in timestamps.into_iter().zip(closes) {
        let Some(close) = close.filter(|value| value.is_finite()) else {
            continue;
        };
        let date = MarketDate::from_unix(timestamp, offset)
            .map_err(|e| SourceError::parse(e.to_string()))?;
        if date >= start && date < end {
            by_date.insert(date, close);
        }
    }

    let points = by_date
        .into_iter()
        .map(|(date, close)| PricePoint::new(date, close))
        .collect();
    PriceSeries::new(symbol.clone(), points).map_err(|e| SourceError::parse(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Option<Vec<ChartAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
                "timestamp": [1641220200, 1641306600, 1641393000, 1641479400],
                "indicators": {
                    "quote": [{ "close": [182.01, 179.70, null, 172.00] }],
                    "adjclose": [{ "adjclose": [180.0, 177.7, null, 170.1] }]
                }
            }],
            "error": null
        }
    }"#;

    /// Replays canned responses in order and records every request.
    struct ScriptedHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self
                .responses
                .lock()
                .expect("response queue should not be poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new("no scripted response")));
            Box::pin(async move { response })
        }
    }

    fn cookie_config() -> SourceConfig {
        SourceConfig {
            cookie: Some(String::from("B=session")),
            ..SourceConfig::default()
        }
    }

    fn request(start: &str, end: &str) -> HistoryRequest {
        HistoryRequest::new(
            Symbol::parse("AAPL").expect("symbol"),
            MarketDate::parse(start).expect("start"),
            MarketDate::parse(end).expect("end"),
        )
        .expect("request")
    }

    fn date(value: &str) -> MarketDate {
        MarketDate::parse(value).expect("date")
    }

    #[tokio::test]
    async fn cookie_override_skips_handshake_and_sends_cookie() {
        let client = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json(
            CHART_BODY,
        ))]));
        let adapter = YahooAdapter::with_http_client(client.clone(), cookie_config());

        let series = adapter
            .daily_closes(request("2022-01-01", "2022-02-01"))
            .await
            .expect("chart should parse");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.contains("/v8/finance/chart/AAPL?period1=1640995200"));
        assert!(requests[0].url.contains("period2=1643673600"));
        assert!(!requests[0].url.contains("crumb="));
        assert_eq!(
            requests[0].headers.get("cookie").map(String::as_str),
            Some("B=session")
        );
        assert_eq!(series.len(), 3);
    }

    #[tokio::test]
    async fn handshake_appends_crumb_to_chart_url() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok_json("abc/Def")),
            Ok(HttpResponse::ok_json(CHART_BODY)),
        ]));
        let adapter = YahooAdapter::with_http_client(client.clone(), SourceConfig::default());

        adapter
            .daily_closes(request("2022-01-01", "2022-02-01"))
            .await
            .expect("chart should parse");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, COOKIE_ENDPOINT);
        assert!(requests[2].url.ends_with("&crumb=abc%2FDef"));
    }

    #[tokio::test]
    async fn handshake_cookie_is_scoped_to_one_call() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(404, "").with_cookie("A3=d=first")),
            Ok(HttpResponse::ok_json("crumb1")),
            Ok(HttpResponse::ok_json(CHART_BODY)),
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok_json("crumb2")),
            Ok(HttpResponse::ok_json(CHART_BODY)),
        ]));
        let adapter = YahooAdapter::with_http_client(client.clone(), SourceConfig::default());

        for _ in 0..2 {
            adapter
                .daily_closes(request("2022-01-01", "2022-02-01"))
                .await
                .expect("chart should parse");
        }

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 6);
        let cookie = |index: usize| requests[index].headers.get("cookie").cloned();
        assert_eq!(cookie(0), None);
        assert_eq!(cookie(1).as_deref(), Some("A3=d=first"));
        assert_eq!(cookie(2).as_deref(), Some("A3=d=first"));
        assert_eq!(cookie(3), None);
        assert_eq!(cookie(4), None);
        assert_eq!(cookie(5), None);
        assert!(requests[5].url.ends_with("&crumb=crumb2"));
    }

    #[tokio::test]
    async fn not_found_status_yields_empty_series() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let client = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::new(404, body))]));
        let adapter = YahooAdapter::with_http_client(client, cookie_config());

        let series = adapter
            .daily_closes(request("2022-01-01", "2022-02-01"))
            .await
            .expect("unknown symbol is not an error");
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn rate_limit_and_server_errors_are_reported() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(429, "Too Many Requests")),
            Ok(HttpResponse::new(502, "Bad Gateway")),
            Err(HttpError::timeout("deadline elapsed")),
        ]));
        let adapter = YahooAdapter::with_http_client(client, cookie_config());

        let limited = adapter
            .daily_closes(request("2022-01-01", "2022-02-01"))
            .await
            .expect_err("429 must fail");
        assert_eq!(limited.kind(), SourceErrorKind::RateLimited);

        let gateway = adapter
            .daily_closes(request("2022-01-01", "2022-02-01"))
            .await
            .expect_err("502 must fail");
        assert_eq!(gateway.message(), "yahoo returned status 502");

        let timeout = adapter
            .daily_closes(request("2022-01-01", "2022-02-01"))
            .await
            .expect_err("timeout must fail");
        assert!(timeout.message().contains("timed out"));
    }

    #[test]
    fn prefers_adjusted_closes_and_skips_nulls() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let series = parse_chart_response(
            &symbol,
            CHART_BODY,
            true,
            date("2022-01-01"),
            date("2022-02-01"),
        )
        .expect("parse");

        assert_eq!(series.closes(), vec![180.0, 177.7, 170.1]);
        assert_eq!(series.first().map(|p| p.date), Some(date("2022-01-03")));

        let raw = parse_chart_response(
            &symbol,
            CHART_BODY,
            false,
            date("2022-01-01"),
            date("2022-02-01"),
        )
        .expect("parse");
        assert_eq!(raw.closes(), vec![182.01, 179.70, 172.00]);
    }

    #[test]
    fn end_date_is_exclusive() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let series = parse_chart_response(
            &symbol,
            CHART_BODY,
            true,
            date("2022-01-01"),
            date("2022-01-06"),
        )
        .expect("parse");
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().map(|p| p.date), Some(date("2022-01-04")));
    }

    #[test]
    fn missing_timestamps_mean_no_trading_days() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let series =
            parse_chart_response(&symbol, body, true, date("2022-01-01"), date("2022-01-02"))
                .expect("parse");
        assert!(series.is_empty());
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let error =
            parse_chart_response(&symbol, "<html>", true, date("2022-01-01"), date("2022-02-01"))
                .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Parse);
    }

    #[test]
    fn crumb_bodies_are_screened() {
        assert_eq!(accept_crumb(" xyz \n"), Some(String::from("xyz")));
        assert_eq!(accept_crumb("Too Many Requests"), None);
        assert_eq!(accept_crumb("<!DOCTYPE html>"), None);
    }
}

//! Server-side rendering of the single forecast page.

use std::fmt::Write;

use ferrocast_core::{
    CombinedSeries, ForecastForm, ForecastOutcome, ForecastSession, Horizon, MarketDate,
    PriceSeries, SeriesKind, CSV_FILE_NAME, MAX_AR_ORDER, MAX_DIFFERENCING, MAX_MA_ORDER,
};

const CHART_WIDTH: f64 = 720.0;
const CHART_HEIGHT: f64 = 260.0;
const CHART_PAD: f64 = 36.0;
const HISTORICAL_COLOR: &str = "#1f77b4";
const FORECAST_COLOR: &str = "#ff7f0e";

/// Full HTML document for the current session state.
pub fn render(session: &ForecastSession) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str(concat!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n",
        "<title>Stock Price Forecasting with ARIMA</title>\n",
        "<style>body{font-family:sans-serif;max-width:800px;margin:2em auto}",
        "label{display:inline-block;margin:.3em .8em .3em 0}",
        ".error{color:#b00020;border:1px solid #b00020;padding:.6em}",
        "table{border-collapse:collapse}td,th{padding:.2em .8em;text-align:right}</style>\n",
        "</head>\n<body>\n<h1>Stock Price Forecasting with ARIMA</h1>\n"
    ));

    render_form(&mut html, session.form());

    // Closes stay visible when fitting fails after a successful fetch.
    match (session.outcome(), session.prices()) {
        (Some(outcome), _) => render_outcome(&mut html, outcome),
        (None, Some(prices)) => render_history(&mut html, prices),
        (None, None) => {}
    }

    if let Some(error) = session.last_error() {
        let _ = writeln!(
            html,
            "<div class=\"error\" role=\"alert\">{}</div>",
            escape(&error.user_message())
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_form(html: &mut String, form: &ForecastForm) {
    html.push_str("<form method=\"post\" action=\"/forecast\">\n");
    let _ = writeln!(
        html,
        "<label>Stock ticker <input name=\"ticker\" value=\"{}\"></label>",
        escape(&form.ticker)
    );
    let _ = writeln!(
        html,
        "<label>Start date <input type=\"date\" name=\"start\" value=\"{}\"></label>",
        escape(&form.start)
    );
    let _ = writeln!(
        html,
        "<label>End date <input type=\"date\" name=\"end\" value=\"{}\"></label><br>",
        escape(&form.end)
    );
    for (name, label, value, min, max) in [
        ("p", "AR order (p)", &form.p, 0, MAX_AR_ORDER),
        ("d", "Differencing (d)", &form.d, 0, MAX_DIFFERENCING),
        ("q", "MA order (q)", &form.q, 0, MAX_MA_ORDER),
        ("months", "Months to forecast", &form.months, Horizon::MIN, Horizon::MAX),
    ] {
        let _ = writeln!(
            html,
            "<label>{label} <input type=\"number\" name=\"{name}\" min=\"{min}\" max=\"{max}\" value=\"{}\"></label>",
            escape(value)
        );
    }
    html.push_str("<br><button type=\"submit\">Forecast</button>\n</form>\n");
}

fn render_history(html: &mut String, prices: &PriceSeries) {
    let _ = writeln!(
        html,
        "<h2>{} closing prices</h2>",
        escape(prices.symbol().as_str())
    );
    html.push_str(&historical_chart(prices));
}

fn render_outcome(html: &mut String, outcome: &ForecastOutcome) {
    let symbol = escape(outcome.request.symbol().as_str());

    render_history(html, &outcome.prices);

    let _ = writeln!(
        html,
        "<h2>{symbol} forecast for the next {} months</h2>",
        outcome.request.horizon()
    );
    html.push_str(&combined_chart(&outcome.combined));

    html.push_str("<table>\n<tr><th>date</th><th>forecast</th></tr>\n");
    for point in outcome.forecast.points() {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{:.2}</td></tr>",
            point.date, point.forecast
        );
    }
    html.push_str("</table>\n");
    let _ = writeln!(
        html,
        "<p><a href=\"/{CSV_FILE_NAME}\" download=\"{CSV_FILE_NAME}\">Download forecast as CSV</a></p>"
    );
}

fn historical_chart(prices: &PriceSeries) -> String {
    let points: Vec<(MarketDate, f64)> = prices
        .points()
        .iter()
        .map(|point| (point.date, point.close))
        .collect();
    svg(&[(points.as_slice(), HISTORICAL_COLOR)])
}

fn combined_chart(series: &CombinedSeries) -> String {
    let historical: Vec<(MarketDate, f64)> =
        series.historical().map(|p| (p.date, p.value)).collect();
    // Start the forecast line at the last close so the two lines join.
    let mut forecast: Vec<(MarketDate, f64)> = series
        .points()
        .iter()
        .rev()
        .find(|p| p.kind == SeriesKind::Historical)
        .map(|p| vec![(p.date, p.value)])
        .unwrap_or_default();
    forecast.extend(series.forecast().map(|p| (p.date, p.value)));

    svg(&[
        (historical.as_slice(), HISTORICAL_COLOR),
        (forecast.as_slice(), FORECAST_COLOR),
    ])
}

/// Line chart with a shared date/value scale across all `lines`.
fn svg(lines: &[(&[(MarketDate, f64)], &str)]) -> String {
    let all = lines.iter().flat_map(|(points, _)| points.iter());
    let (mut x_min, mut x_max) = (i32::MAX, i32::MIN);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (date, value) in all {
        let day = date.into_inner().to_julian_day();
        x_min = x_min.min(day);
        x_max = x_max.max(day);
        y_min = y_min.min(*value);
        y_max = y_max.max(*value);
    }

    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CHART_WIDTH}\" height=\"{CHART_HEIGHT}\" viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\">\n"
    );
    if x_min > x_max {
        out.push_str("</svg>\n");
        return out;
    }

    let x_span = f64::from((x_max - x_min).max(1));
    let y_span = if y_max > y_min { y_max - y_min } else { 1.0 };
    let plot_w = CHART_WIDTH - 2.0 * CHART_PAD;
    let plot_h = CHART_HEIGHT - 2.0 * CHART_PAD;

    let _ = writeln!(
        out,
        "<text x=\"2\" y=\"{CHART_PAD}\" font-size=\"11\">{y_max:.2}</text><text x=\"2\" y=\"{}\" font-size=\"11\">{y_min:.2}</text>",
        CHART_HEIGHT - CHART_PAD
    );
    for (points, color) in lines {
        if points.is_empty() {
            continue;
        }
        let coords: Vec<String> = points
            .iter()
            .map(|(date, value)| {
                let x = CHART_PAD
                    + f64::from(date.into_inner().to_julian_day() - x_min) / x_span * plot_w;
                let y = CHART_HEIGHT - CHART_PAD - (value - y_min) / y_span * plot_h;
                format!("{x:.1},{y:.1}")
            })
            .collect();
        let _ = writeln!(
            out,
            "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" points=\"{}\"/>",
            coords.join(" ")
        );
    }
    out.push_str("</svg>\n");
    out
}

fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> MarketDate {
        MarketDate::parse(value).expect("date")
    }

    #[test]
    fn escapes_markup_in_user_input() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn empty_session_renders_form_only() {
        let session = ForecastSession::new(ForecastForm::with_today(date("2024-03-15")));
        let html = render(&session);
        assert!(html.contains("name=\"ticker\" value=\"AAPL\""));
        assert!(html.contains("name=\"end\" value=\"2024-03-15\""));
        assert!(!html.contains("<svg"));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn chart_scales_points_into_the_plot_area() {
        let points = [(date("2022-01-01"), 10.0), (date("2022-01-11"), 20.0)];
        let rendered = svg(&[(points.as_slice(), HISTORICAL_COLOR)]);
        assert!(rendered.contains(&format!(
            "points=\"{CHART_PAD:.1},{:.1} {:.1},{CHART_PAD:.1}\"",
            CHART_HEIGHT - CHART_PAD,
            CHART_WIDTH - CHART_PAD
        )));
    }

    #[test]
    fn empty_chart_is_an_empty_svg() {
        let empty: Vec<(MarketDate, f64)> = Vec::new();
        let rendered = svg(&[(empty.as_slice(), HISTORICAL_COLOR)]);
        assert!(rendered.ends_with("</svg>\n"));
        assert!(!rendered.contains("polyline"));
    }
}

pub mod chart;

use ferrocast_core::{Envelope, ForecastOutcome};

use crate::cli::OutputFormat;
use crate::commands::ForecastReport;
use crate::error::CliError;

pub fn render(report: &ForecastReport, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&report.envelope)?
            } else {
                serde_json::to_string(&report.envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => {
            for line in table_lines(&report.envelope) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn table_lines(envelope: &Envelope<ForecastOutcome>) -> Vec<String> {
    let meta = &envelope.meta;
    let outcome = &envelope.data;
    let request = &outcome.request;
    let mut lines = vec![
        format!("request_id  : {}", meta.request_id),
        format!("schema      : {}", meta.schema_version),
        format!("generated_at: {}", meta.generated_at),
        format!("source      : {}", meta.source),
        format!("model       : {} {}", outcome.model, request.order()),
        format!("latency_ms  : {}", meta.latency_ms),
    ];

    if !meta.warnings.is_empty() {
        lines.push(String::from("warnings:"));
        lines.extend(meta.warnings.iter().map(|warning| format!("  - {warning}")));
    }

    let (first, last) = match (outcome.prices.first(), outcome.prices.last()) {
        (Some(first), Some(last)) => (first.date.to_string(), last.date.to_string()),
        _ => (String::from("-"), String::from("-")),
    };
    lines.push(String::new());
    lines.push(format!(
        "{} closing prices, {first} to {last} ({} days)",
        request.symbol(),
        outcome.prices.len()
    ));
    lines.extend(chart::historical(&outcome.prices));

    lines.push(String::new());
    lines.push(format!(
        "{} forecast, {} months (* close, o forecast)",
        request.symbol(),
        request.horizon()
    ));
    lines.extend(chart::combined(&outcome.combined));

    lines.push(String::new());
    lines.push(format!("{:<10}  {:>12}", "date", "forecast"));
    lines.extend(
        outcome
            .forecast
            .points()
            .iter()
            .map(|point| format!("{:<10}  {:>12.2}", point.date.to_string(), point.forecast)),
    );

    lines
}

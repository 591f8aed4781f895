mod forecast;
mod serve;

pub use forecast::ForecastReport;

use std::sync::Arc;

use ferrocast_core::{PriceSource, SourceConfig, SyntheticSource, YahooAdapter};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = source_config(cli);
    let source = price_source(cli.mock, config);

    match &cli.command {
        Command::Forecast(args) => {
            let report = forecast::run(args, source.as_ref()).await?;
            output::render(&report, cli.format, cli.pretty)?;
            if let Some(path) = &report.csv_path {
                eprintln!("forecast written to {}", path.display());
            }
            Ok(())
        }
        Command::Serve(args) => serve::run(args, source).await,
    }
}

fn source_config(cli: &Cli) -> SourceConfig {
    let mut config = SourceConfig::from_env();
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    if let Command::Forecast(args) = &cli.command {
        config = config.with_adjusted_close(!args.raw_close);
    }
    config
}

fn price_source(mock: bool, config: SourceConfig) -> Arc<dyn PriceSource> {
    if mock {
        Arc::new(SyntheticSource::new())
    } else {
        Arc::new(YahooAdapter::new(config))
    }
}

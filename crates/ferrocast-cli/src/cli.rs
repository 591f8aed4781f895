//! CLI argument definitions for ferrocast.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `forecast` | Fetch closes, fit ARIMA(p,d,q) and forecast monthly prices |
//! | `serve` | Run the single-page web UI |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Use the offline synthetic price source |
//! | `--timeout-ms` | `10000` | Provider request timeout in ms |
//! | `--log-level` | `warn` | Log filter, overrides `RUST_LOG` |
//!
//! # Examples
//!
//! ```bash
//! ferrocast forecast AAPL --start 2022-01-01 --months 6
//! ferrocast forecast GOTO.JK --p 1 --d 1 --q 1 --output forecast.csv
//! ferrocast --format json --pretty forecast MSFT --mock
//! ferrocast serve --bind 0.0.0.0:8080
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ferrocast_core::session::{DEFAULT_HORIZON, DEFAULT_START, DEFAULT_TICKER};

/// Stock price forecasting with ARIMA models.
#[derive(Debug, Parser)]
#[command(
    name = "ferrocast",
    author,
    version,
    about = "Forecast monthly stock prices with ARIMA models",
    long_about = "ferrocast fetches daily closing prices for a ticker, fits an ARIMA(p,d,q) \
model and forecasts month-end prices. Results are printed as a chart and table, \
or as a JSON envelope, and can be saved as CSV.\n\
\n\
Use 'ferrocast <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Use deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Provider request timeout in milliseconds.
    ///
    /// Falls back to FERROCAST_TIMEOUT_MS, then 10000.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log filter directive (e.g. `debug`, `ferrocast_core=trace`).
    ///
    /// Falls back to RUST_LOG, then `warn`. Logs go to stderr.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Chart and table for terminal display.
    Table,
    /// Single JSON envelope.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast month-end prices for a ticker.
    ///
    /// # Examples
    ///
    ///   ferrocast forecast AAPL
    ///   ferrocast forecast MSFT --start 2021-01-01 --end 2023-01-01 --months 12
    Forecast(ForecastArgs),

    /// Serve the web UI.
    Serve(ServeArgs),
}

/// Arguments for the `forecast` command.
#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Ticker symbol (e.g. AAPL, GOTO.JK, ^GSPC).
    #[arg(default_value = DEFAULT_TICKER)]
    pub ticker: String,

    /// First day of price history (YYYY-MM-DD).
    #[arg(long, default_value = DEFAULT_START)]
    pub start: String,

    /// Day after the last day of price history (YYYY-MM-DD, default today).
    #[arg(long)]
    pub end: Option<String>,

    /// Autoregressive order (0-5).
    #[arg(long, default_value_t = 2)]
    pub p: usize,

    /// Differencing order (0-2).
    #[arg(long, default_value_t = 1)]
    pub d: usize,

    /// Moving-average order (0-5).
    #[arg(long, default_value_t = 2)]
    pub q: usize,

    /// Number of months to forecast (1-24).
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub months: usize,

    /// Write the forecast as CSV to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Use unadjusted closes.
    #[arg(long, default_value_t = false)]
    pub raw_close: bool,
}

/// Arguments for the `serve` command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "FERROCAST_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,
}

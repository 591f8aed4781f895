//! Provider configuration.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `YAHOO_COOKIE` | Session cookie sent instead of the cookie/crumb handshake |
//! | `FERROCAST_TIMEOUT_MS` | Per-request HTTP timeout |

use std::env;

use tracing::warn;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_USER_AGENT: &str = concat!("ferrocast/", env!("CARGO_PKG_VERSION"));

const COOKIE_ENV: &str = "YAHOO_COOKIE";
const TIMEOUT_ENV: &str = "FERROCAST_TIMEOUT_MS";

/// Settings shared by the HTTP client and provider adapters.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub timeout_ms: u64,
    /// Prefer split/dividend adjusted closes when the provider reports them.
    pub adjusted_close: bool,
    pub user_agent: String,
    pub cookie: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            adjusted_close: true,
            user_agent: String::from(DEFAULT_USER_AGENT),
            cookie: None,
        }
    }
}

impl SourceConfig {
    /// Defaults overridden by `YAHOO_COOKIE` and `FERROCAST_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(cookie) = env::var(COOKIE_ENV) {
            if !cookie.trim().is_empty() {
                config.cookie = Some(cookie);
            }
        }

        if let Ok(raw) = env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(value) if value > 0 => config.timeout_ms = value,
                _ => warn!(value = %raw, "ignoring invalid {TIMEOUT_ENV}"),
            }
        }

        config
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_adjusted_close(mut self, adjusted_close: bool) -> Self {
        self.adjusted_close = adjusted_close;
        self
    }
}

// Hand-written so the cookie never reaches logs.
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("timeout_ms", &self.timeout_ms)
            .field("adjusted_close", &self.adjusted_close)
            .field("user_agent", &self.user_agent)
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

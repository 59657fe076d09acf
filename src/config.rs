//! Engine configuration.
//!
//! Read once at startup (environment, optionally a `.env` file) and passed
//! into the engine as a plain value, so extraction itself stays free of
//! hidden global reads.

use std::env;
use std::time::Duration;

use tracing::info;

const DEFAULT_ASSISTED_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_PROMPT_CHARS: usize = 12_000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether the assisted strategy is offered at all. Resource-constrained
    /// deployments set this off; requesting assisted extraction then fails
    /// with `StrategyUnavailable` rather than falling back.
    pub assisted_enabled: bool,
    /// Budget for a single language-model call.
    pub assisted_timeout: Duration,
    /// Maximum number of source-text characters embedded in the prompt.
    pub max_prompt_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assisted_enabled: true,
            assisted_timeout: Duration::from_secs(DEFAULT_ASSISTED_TIMEOUT_SECS),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}

impl EngineConfig {
    /// Build a config from the environment, loading `.env` if present.
    ///
    /// Recognized variables: `INVOICE_ASSISTED_ENABLED`,
    /// `INVOICE_ASSISTED_TIMEOUT_SECS`, `INVOICE_MAX_PROMPT_CHARS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            assisted_enabled: env::var("INVOICE_ASSISTED_ENABLED")
                .map(|v| !matches!(v.trim(), "0" | "false" | "off"))
                .unwrap_or(defaults.assisted_enabled),
            assisted_timeout: env::var("INVOICE_ASSISTED_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.assisted_timeout),
            max_prompt_chars: env::var("INVOICE_MAX_PROMPT_CHARS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_prompt_chars),
        };

        info!(
            assisted_enabled = config.assisted_enabled,
            assisted_timeout_secs = config.assisted_timeout.as_secs(),
            "engine config loaded"
        );
        config
    }
}

//! Chat-completion endpoint configuration

use rubrica_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:1234";
pub const DEFAULT_MODEL: &str = "llama-3.2-3b-instruct";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
/// Local inference is slow; five minutes per request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Configuration for the chat-completion client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmStudioConfig {
    /// Server base URL, e.g. `http://localhost:1234`
    pub api_url: String,
    pub model_id: String,
    pub temperature: f64,
    pub timeout: Duration,
}

impl Default for LmStudioConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model_id: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LmStudioConfig {
    /// Create configuration from environment variables
    ///
    /// Reads `.env` first, then `RUBRICA_API_URL`, `RUBRICA_MODEL`,
    /// `RUBRICA_TIMEOUT_SECS` and `RUBRICA_TEMPERATURE`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source
    ///
    /// Only parses; ranges and the URL are checked by [`validate`](Self::validate).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(api_url) = lookup("RUBRICA_API_URL") {
            config.api_url = api_url;
        }

        if let Some(model_id) = lookup("RUBRICA_MODEL") {
            config.model_id = model_id;
        }

        if let Some(raw) = lookup("RUBRICA_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                Error::Configuration(format!(
                    "RUBRICA_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("RUBRICA_TEMPERATURE") {
            config.temperature = raw.trim().parse::<f64>().map_err(|_| {
                Error::Configuration(format!("RUBRICA_TEMPERATURE must be a number, got '{}'", raw))
            })?;
        }

        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(api_url: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            model_id: model_id.into(),
            ..Default::default()
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the values a request depends on
    pub fn validate(&self) -> Result<()> {
        self.endpoint()?;

        if self.model_id.trim().is_empty() {
            return Err(Error::Configuration("model id must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Configuration(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::Configuration("timeout must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Full chat-completions URL
    ///
    /// A base URL that already ends in `/v1/chat/completions` is used as is.
    pub fn endpoint(&self) -> Result<Url> {
        let base = self.api_url.trim().trim_end_matches('/');
        let full = if base.ends_with(COMPLETIONS_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, COMPLETIONS_PATH)
        };

        let url = Url::parse(&full)
            .map_err(|e| Error::Configuration(format!("invalid API URL '{}': {}", self.api_url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Configuration(format!(
                "API URL must use http or https, got '{}'",
                other
            ))),
        }
    }
}

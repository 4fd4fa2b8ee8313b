//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CLICLEITURA_BASE_URL` - Backend origin (e.g., `https://clicleitura.com.br`)
//!
//! ## Optional
//! - `CLICLEITURA_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `CLICLEITURA_SESSION_FILE` - Cached identity record
//!   (default: `$HOME/.clicleitura/session.json`)
//! - `CLICLEITURA_QR_DIR` - Where decoded PIX QR codes are written
//!   (default: system temp dir)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default request timeout. Expiry is reported as a network failure.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const SESSION_DIR: &str = ".clicleitura";
const SESSION_FILE: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin every API path is joined onto.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Path of the cached identity record.
    pub session_file: PathBuf,
    /// Directory for decoded QR code images.
    pub qr_dir: PathBuf,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Build a configuration for `base_url` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: default_session_file(None),
            qr_dir: std::env::temp_dir(),
            sentry_dsn: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("CLICLEITURA_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CLICLEITURA_BASE_URL".to_string()))?;
        let base_url = parse_base_url(&base_url)?;

        let timeout = match lookup("CLICLEITURA_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let session_file = lookup("CLICLEITURA_SESSION_FILE")
            .map_or_else(|| default_session_file(lookup("HOME")), PathBuf::from);
        let qr_dir = lookup("CLICLEITURA_QR_DIR").map_or_else(std::env::temp_dir, PathBuf::from);
        let sentry_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty());

        Ok(Self {
            base_url,
            timeout,
            session_file,
            qr_dir,
            sentry_dsn,
        })
    }

    /// Absolute URL for an API path such as `/api/carrinho/7`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        )
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("CLICLEITURA_BASE_URL".to_string(), msg);
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid =
        |msg: String| ConfigError::InvalidEnvVar("CLICLEITURA_TIMEOUT_SECS".to_string(), msg);
    let secs = raw.trim().parse::<u64>().map_err(|e| invalid(e.to_string()))?;
    if secs == 0 {
        return Err(invalid("timeout must be at least 1 second".to_string()));
    }
    Ok(Duration::from_secs(secs))
}

fn default_session_file(home: Option<String>) -> PathBuf {
    home.map_or_else(PathBuf::new, PathBuf::from)
        .join(SESSION_DIR)
        .join(SESSION_FILE)
}

//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `RADAPOS_API_URL` - Backend base URL (default: `http://127.0.0.1:5555`)
//! - `RADAPOS_STATE_DIR` - Directory for persisted client state (default: `.radapos`)
//! - `RADAPOS_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `RADAPOS_NOTIFICATION_POLL_SECS` - Notification refresh interval (default: 30)
//! - `RADAPOS_VENDOR_ID` - Vendor the terminal sells for (default: 1)
//! - `RADAPOS_EVENT_ID` - Event the terminal sells at (default: 1)
//! - `RADAPOS_CLEAR_CART_ON_QUEUE` - Empty the cart after queueing an offline sale (default: true)
//! - `RADAPOS_CLEAR_CART_ON_FAILURE` - Empty the cart after a rejected online sale (default: false)
//! - `RADAPOS_REJECT_EMPTY_CART` - Refuse to check out an empty cart (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use radapos_core::{EventId, VendorId};
use thiserror::Error;
use url::Url;

use crate::cart::CheckoutPolicy;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5555";
const DEFAULT_STATE_DIR: &str = ".radapos";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NOTIFICATION_POLL_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; endpoint paths are appended to it.
    pub api_url: Url,
    /// Where [`crate::storage::FileStore`] keeps state.
    pub state_dir: PathBuf,
    /// Per-request timeout.
    pub http_timeout: Duration,
    /// Notification poll interval.
    pub notification_poll: Duration,
    /// Vendor and event stamped on checkout payloads.
    pub terminal: TerminalConfig,
    /// Cart clearing behavior at checkout.
    pub checkout_policy: CheckoutPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Identity of the selling terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Vendor the sales are booked to.
    pub vendor_id: VendorId,
    /// Event the sales happen at.
    pub event_id: EventId,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            vendor_id: VendorId::new(1),
            event_id: EventId::new(1),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with every other setting at its default.
    #[must_use]
    pub fn with_api_url(api_url: Url) -> Self {
        Self {
            api_url,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            notification_poll: Duration::from_secs(DEFAULT_NOTIFICATION_POLL_SECS),
            terminal: TerminalConfig::default(),
            checkout_policy: CheckoutPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("RADAPOS_API_URL", DEFAULT_API_URL))?;
        let state_dir = PathBuf::from(get_env_or_default("RADAPOS_STATE_DIR", DEFAULT_STATE_DIR));
        let http_timeout = Duration::from_secs(parse_env(
            "RADAPOS_HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let notification_poll = Duration::from_secs(parse_env(
            "RADAPOS_NOTIFICATION_POLL_SECS",
            DEFAULT_NOTIFICATION_POLL_SECS,
        )?);
        if notification_poll.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "RADAPOS_NOTIFICATION_POLL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let defaults = TerminalConfig::default();
        let terminal = TerminalConfig {
            vendor_id: VendorId::new(parse_env("RADAPOS_VENDOR_ID", defaults.vendor_id.as_i64())?),
            event_id: EventId::new(parse_env("RADAPOS_EVENT_ID", defaults.event_id.as_i64())?),
        };

        let policy = CheckoutPolicy::default();
        let checkout_policy = CheckoutPolicy {
            clear_on_queue: parse_env("RADAPOS_CLEAR_CART_ON_QUEUE", policy.clear_on_queue)?,
            clear_on_failure: parse_env("RADAPOS_CLEAR_CART_ON_FAILURE", policy.clear_on_failure)?,
            reject_empty_cart: parse_env("RADAPOS_REJECT_EMPTY_CART", policy.reject_empty_cart)?,
        };

        Ok(Self {
            api_url,
            state_dir,
            http_timeout,
            notification_poll,
            terminal,
            checkout_policy,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Parse and normalise a base URL so relative joins keep its path.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the URL is malformed or not http(s).
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("RADAPOS_API_URL".to_string(), msg);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme: {}", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_appends_slash() {
        let url = parse_api_url("http://localhost:3000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/");
        assert_eq!(
            url.join("products/").unwrap().as_str(),
            "http://localhost:3000/api/products/"
        );
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        assert!(matches!(
            parse_api_url("ftp://example.com"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_default_settings() {
        let config = ClientConfig::with_api_url(parse_api_url(DEFAULT_API_URL).unwrap());
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:5555/");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.checkout_policy.clear_on_queue);
        assert!(!config.checkout_policy.clear_on_failure);
    }
}

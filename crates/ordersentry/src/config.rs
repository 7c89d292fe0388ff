//! Environment configuration.
//!
//! Everything is read from the process environment (with `.env` loaded
//! first when present). Missing credentials are the only startup-fatal
//! condition; every other variable has a default. Malformed numeric or
//! boolean values fall back to their defaults with a warning rather
//! than killing the process.

use std::time::Duration;

use ordersentry_core::{ScanConfig, resolver};
use ordersentry_imap::SessionConfig;

/// Default required tokens; an order confirmation must carry both.
pub const DEFAULT_TOKENS: &[&str] = &["Credit Card", "United Kingdom"];

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-cycle scan settings.
    pub scan: ScanConfig,
    /// Delay between cycles.
    pub poll_delay: Duration,
    /// Run a single cycle and exit.
    pub run_once: bool,
    /// Liveness endpoint port.
    pub port: u16,
}

/// Startup configuration failure.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable was absent or empty.
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
}

impl Config {
    /// Loads configuration from the process environment, reading a
    /// `.env` file first if one exists.
    ///
    /// # Errors
    /// [`ConfigError::Missing`] when `IMAP_USER` or `IMAP_PASS` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal production case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    ///
    /// # Errors
    /// [`ConfigError::Missing`] when a required variable is absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let username = required(&lookup, "IMAP_USER")?;
        let secret = required(&lookup, "IMAP_PASS")?;

        let host = string(&lookup, "IMAP_HOST", "imap.gmail.com");
        let port = parsed(&lookup, "IMAP_PORT", 993_u16);
        let session = SessionConfig::new(host, port)
            .credentials(username, secret)
            .tls(parsed(&lookup, "IMAP_TLS", true))
            .verify_certs(parsed(&lookup, "IMAP_VERIFY_CERTS", true));

        let scan = ScanConfig {
            session,
            mailbox: string(&lookup, "IMAP_BOX", "MAGENTO_ORDERS"),
            fallback_boxes: resolver::default_fallbacks(),
            required_tokens: tokens(&lookup),
            lookback_days: parsed(&lookup, "SINCE_DAYS", 14_i64),
            max_messages: parsed(&lookup, "MAX_MESSAGES", 200_usize),
            server_filter: parsed(&lookup, "SERVER_FILTER", true),
        };

        Ok(Self {
            scan,
            poll_delay: Duration::from_millis(parsed(&lookup, "POLL_MS", 60_000_u64)),
            run_once: parsed(&lookup, "RUN_ONCE", false),
            port: parsed(&lookup, "PORT", 3000_u16),
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn string(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parses a variable, warning and using the default on malformed input.
fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match lookup(name) {
        None => default,
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return default;
            }
            trimmed.parse().unwrap_or_else(|_| {
                tracing::warn!(variable = name, value = %raw, "unparseable value, using default");
                default
            })
        }
    }
}

/// `MUST_CONTAIN` as a comma-separated list, defaulting to the fixed pair.
fn tokens(lookup: &impl Fn(&str) -> Option<String>) -> Vec<String> {
    match lookup("MUST_CONTAIN") {
        Some(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .collect(),
        _ => DEFAULT_TOKENS.iter().map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn with_vars(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let owned: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(move |name| {
            owned
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = with_vars(&[("IMAP_USER", "scanner"), ("IMAP_PASS", "sekrit")]).unwrap();
        assert_eq!(config.scan.session.host, "imap.gmail.com");
        assert_eq!(config.scan.session.port, 993);
        assert!(config.scan.session.tls);
        assert!(config.scan.session.verify_certs);
        assert_eq!(config.scan.mailbox, "MAGENTO_ORDERS");
        assert_eq!(config.scan.lookback_days, 14);
        assert_eq!(config.scan.max_messages, 200);
        assert_eq!(
            config.scan.required_tokens,
            vec!["Credit Card".to_string(), "United Kingdom".to_string()]
        );
        assert_eq!(config.poll_delay, Duration::from_millis(60_000));
        assert!(!config.run_once);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn missing_credentials_are_fatal() {
        assert_eq!(
            with_vars(&[("IMAP_PASS", "x")]).unwrap_err(),
            ConfigError::Missing("IMAP_USER")
        );
        assert_eq!(
            with_vars(&[("IMAP_USER", "x"), ("IMAP_PASS", "  ")]).unwrap_err(),
            ConfigError::Missing("IMAP_PASS")
        );
    }

    #[test]
    fn overrides_are_honoured() {
        let config = with_vars(&[
            ("IMAP_USER", "u"),
            ("IMAP_PASS", "p"),
            ("IMAP_HOST", "mail.example.com"),
            ("IMAP_PORT", "143"),
            ("IMAP_TLS", "false"),
            ("IMAP_BOX", "Orders"),
            ("SINCE_DAYS", "3"),
            ("POLL_MS", "5000"),
            ("RUN_ONCE", "true"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.scan.session.host, "mail.example.com");
        assert_eq!(config.scan.session.port, 143);
        assert!(!config.scan.session.tls);
        assert_eq!(config.scan.mailbox, "Orders");
        assert_eq!(config.scan.lookback_days, 3);
        assert_eq!(config.poll_delay, Duration::from_millis(5000));
        assert!(config.run_once);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let config = with_vars(&[
            ("IMAP_USER", "u"),
            ("IMAP_PASS", "p"),
            ("IMAP_PORT", "ninety"),
            ("POLL_MS", ""),
        ])
        .unwrap();
        assert_eq!(config.scan.session.port, 993);
        assert_eq!(config.poll_delay, Duration::from_millis(60_000));
    }

    #[test]
    fn must_contain_overrides_the_token_pair() {
        let config = with_vars(&[
            ("IMAP_USER", "u"),
            ("IMAP_PASS", "p"),
            ("MUST_CONTAIN", "PayPal, Ireland , "),
        ])
        .unwrap();
        assert_eq!(
            config.scan.required_tokens,
            vec!["PayPal".to_string(), "Ireland".to_string()]
        );
    }
}

//! Application configuration loaded from environment variables.
//!
//! Required variables must be present and valid, or the process exits with
//! a clear error message. A `.env` file in the working directory is loaded
//! first when present.

use std::env;
use std::time::Duration;

use deskbridge_directory::{DirectoryConfig, DirectoryCredentials, RetryPolicy};
use deskbridge_reconcile::{BulkSyncOptions, EngineConfig, EngineOptions, PhoneMatcher};
use deskbridge_webhooks::WebhookCredentials;
use thiserror::Error;

/// Configuration errors that prevent startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse port: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Billing API connection settings.
#[derive(Clone)]
pub struct BillingSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for BillingSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: DirectoryConfig,
    /// Present when `BILLING_API_KEY` and a billing location are set.
    pub billing: Option<BillingSettings>,
    pub webhook_credentials: Option<WebhookCredentials>,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_format: LogFormat,
    pub rust_log: String,
    pub phone_matcher: PhoneMatcher,
    pub sync_parallelism: usize,
    pub sync_exclude_email_suffixes: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// # Required Variables
    ///
    /// - `DIRECTORY_URL` or `DIRECTORY_SUBDOMAIN`
    /// - `DIRECTORY_API_USER`, `DIRECTORY_API_TOKEN`
    ///
    /// # Optional Variables
    ///
    /// - `DIRECTORY_TIMEOUT_SECS` (default: 30), `DIRECTORY_MAX_RETRIES` (default: 3)
    /// - `BILLING_URL` or `BILLING_SITE`, `BILLING_API_KEY` (needed by `sync`)
    /// - `BILLING_TIMEOUT_SECS` (default: 30)
    /// - `WEBHOOK_USERNAME`, `WEBHOOK_PASSWORD` (webhook auth is off when unset)
    /// - `HOST` (default: "0.0.0.0"), `PORT` (default: 8080)
    /// - `DEBUG` (default: false), `LOG_FORMAT` (json | pretty), `RUST_LOG`
    /// - `PHONE_COUNTRY_CODE` (unset: exact phone matching)
    /// - `SYNC_PARALLELISM` (default: 4), `SYNC_EXCLUDE_EMAIL_SUFFIXES` (comma-separated)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));

        // Directory
        let directory_base_url = match (get("DIRECTORY_URL"), get("DIRECTORY_SUBDOMAIN")) {
            (Some(url), _) => url,
            (None, Some(subdomain)) => DirectoryConfig::hosted_base_url(&subdomain),
            (None, None) => {
                return Err(ConfigError::MissingVar(
                    "DIRECTORY_URL or DIRECTORY_SUBDOMAIN".to_string(),
                ))
            }
        };
        let credentials =
            DirectoryCredentials::new(require("DIRECTORY_API_USER")?, require("DIRECTORY_API_TOKEN")?);
        let timeout_secs: u64 = parse_or("DIRECTORY_TIMEOUT_SECS", get("DIRECTORY_TIMEOUT_SECS"), 30)?;
        let max_retries: u32 = parse_or("DIRECTORY_MAX_RETRIES", get("DIRECTORY_MAX_RETRIES"), 3)?;
        let directory = DirectoryConfig {
            base_url: directory_base_url,
            credentials,
            timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy {
                max_retries,
                ..RetryPolicy::default()
            },
        };

        // Billing
        let billing_base_url = get("BILLING_URL").or_else(|| {
            get("BILLING_SITE").map(|site| deskbridge_billing::BillingClient::hosted_base_url(&site))
        });
        let billing_timeout_secs: u64 =
            parse_or("BILLING_TIMEOUT_SECS", get("BILLING_TIMEOUT_SECS"), 30)?;
        let billing = match (billing_base_url, get("BILLING_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(BillingSettings {
                base_url,
                api_key,
                timeout: Duration::from_secs(billing_timeout_secs),
            }),
            _ => None,
        };

        // Webhook auth
        let webhook_credentials = match (get("WEBHOOK_USERNAME"), get("WEBHOOK_PASSWORD")) {
            (Some(user), Some(password)) => Some(WebhookCredentials::new(user, &password)),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidValue {
                    var: "WEBHOOK_USERNAME/WEBHOOK_PASSWORD".to_string(),
                    message: "set both or neither".to_string(),
                })
            }
        };

        // Server
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = get("PORT").unwrap_or_else(|| "8080".to_string()).parse()?;
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                var: "PORT".to_string(),
                message: "Port must be between 1 and 65535".to_string(),
            });
        }

        // Logging
        let debug = parse_bool("DEBUG", get("DEBUG"))?;
        let log_format = match get("LOG_FORMAT").map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "LOG_FORMAT".to_string(),
                    message: format!("expected json or pretty, got {other}"),
                })
            }
        };
        let default_filter = if debug { "debug" } else { "info" };
        let rust_log = get("RUST_LOG").unwrap_or_else(|| default_filter.to_string());

        // Reconciliation
        let phone_matcher = PhoneMatcher::for_country_code(get("PHONE_COUNTRY_CODE").as_deref());
        let sync_parallelism: usize = parse_or("SYNC_PARALLELISM", get("SYNC_PARALLELISM"), 4)?;
        if sync_parallelism == 0 {
            return Err(ConfigError::InvalidValue {
                var: "SYNC_PARALLELISM".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let sync_exclude_email_suffixes = get("SYNC_EXCLUDE_EMAIL_SUFFIXES")
            .map(|s| {
                s.split(',')
                    .map(|suffix| suffix.trim().to_string())
                    .filter(|suffix| !suffix.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            directory,
            billing,
            webhook_credentials,
            host,
            port,
            debug,
            log_format,
            rust_log,
            phone_matcher,
            sync_parallelism,
            sync_exclude_email_suffixes,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            directory: self.directory.clone(),
            options: EngineOptions {
                phone_matcher: self.phone_matcher.clone(),
                debug: self.debug,
            },
        }
    }

    pub fn bulk_sync_options(&self, email: Option<String>, parallelism: Option<usize>) -> BulkSyncOptions {
        BulkSyncOptions {
            email,
            parallelism: parallelism.unwrap_or(self.sync_parallelism),
            exclude_email_suffixes: self.sync_exclude_email_suffixes.clone(),
            ..BulkSyncOptions::default()
        }
    }

    /// Billing settings, or the variable that is missing.
    pub fn require_billing(&self) -> Result<&BillingSettings, ConfigError> {
        self.billing.as_ref().ok_or_else(|| {
            ConfigError::MissingVar("BILLING_API_KEY and BILLING_URL or BILLING_SITE".to_string())
        })
    }
}

fn parse_or<T: std::str::FromStr>(var: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var: var.to_string(),
            message: e.to_string(),
        }),
    }
}

fn parse_bool(var: &str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("false" | "0" | "no") => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            message: format!("expected a boolean, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("DIRECTORY_SUBDOMAIN", "acme"),
        ("DIRECTORY_API_USER", "ops@acme.test"),
        ("DIRECTORY_API_TOKEN", "tok"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.directory.base_url, "https://acme.zendesk.com/api/v2");
        assert_eq!(config.directory.timeout, Duration::from_secs(30));
        assert_eq!(config.directory.retry.max_retries, 3);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert!(!config.debug);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.phone_matcher, PhoneMatcher::Exact);
        assert_eq!(config.sync_parallelism, 4);
        assert!(config.billing.is_none());
        assert!(config.webhook_credentials.is_none());
    }

    #[test]
    fn test_missing_directory_location() {
        let err = load(&[("DIRECTORY_API_USER", "u"), ("DIRECTORY_API_TOKEN", "t")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn test_missing_token() {
        let err = load(&[("DIRECTORY_URL", "http://localhost"), ("DIRECTORY_API_USER", "u")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "DIRECTORY_API_TOKEN"));
    }

    #[test]
    fn test_explicit_url_wins_over_subdomain() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("DIRECTORY_URL", "http://localhost:9000/api/v2"));
        let config = load(&vars).unwrap();
        assert_eq!(config.directory.base_url, "http://localhost:9000/api/v2");
    }

    #[test]
    fn test_full_configuration() {
        let mut vars = MINIMAL.to_vec();
        vars.extend([
            ("BILLING_SITE", "acme-test"),
            ("BILLING_API_KEY", "key"),
            ("WEBHOOK_USERNAME", "hook"),
            ("WEBHOOK_PASSWORD", "pw"),
            ("PORT", "9090"),
            ("DEBUG", "true"),
            ("LOG_FORMAT", "pretty"),
            ("PHONE_COUNTRY_CODE", "+61"),
            ("SYNC_PARALLELISM", "8"),
            ("SYNC_EXCLUDE_EMAIL_SUFFIXES", "atmail.com, example.org ,"),
        ]);
        let config = load(&vars).unwrap();

        let billing = config.require_billing().unwrap();
        assert_eq!(billing.base_url, "https://acme-test.chargebee.com/api/v2");
        assert_eq!(billing.timeout, Duration::from_secs(30));
        assert!(config.webhook_credentials.is_some());
        assert_eq!(config.port, 9090);
        assert!(config.debug);
        assert_eq!(config.rust_log, "debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(
            config.phone_matcher,
            PhoneMatcher::TrunkPrefix {
                country_code: "+61".to_string()
            }
        );
        assert_eq!(
            config.sync_exclude_email_suffixes,
            vec!["atmail.com".to_string(), "example.org".to_string()]
        );

        let options = config.bulk_sync_options(None, Some(2));
        assert_eq!(options.parallelism, 2);
        assert!(config.engine_config().options.debug);
    }

    #[test]
    fn test_half_configured_webhook_auth_is_rejected() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("WEBHOOK_USERNAME", "hook"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_values() {
        for (var, value) in [
            ("PORT", "0"),
            ("DEBUG", "maybe"),
            ("LOG_FORMAT", "xml"),
            ("SYNC_PARALLELISM", "0"),
            ("DIRECTORY_TIMEOUT_SECS", "soon"),
        ] {
            let mut vars = MINIMAL.to_vec();
            vars.push((var, value));
            assert!(
                matches!(load(&vars), Err(ConfigError::InvalidValue { .. })),
                "{var}={value}"
            );
        }
        let mut vars = MINIMAL.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidPort(_))));
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let mut vars = MINIMAL.to_vec();
        vars.extend([("BILLING_URL", "http://billing"), ("BILLING_API_KEY", "sk_live_123")]);
        let config = load(&vars).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk_live_123"));
        assert!(!debug.contains("\"tok\""));
    }
}

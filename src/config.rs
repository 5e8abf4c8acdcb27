//! Runtime configuration resolved from the environment.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::harvest::{HarvestError, RateLimitConfig, RetryPolicy};

pub const ENV_API_KEY: &str = "GREENHOUSE_API_KEY";
pub const ENV_BASE_URL: &str = "GREENHOUSE_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "GREENHOUSE_TIMEOUT_SECS";
pub const ENV_RATE_LIMIT_MAX: &str = "GREENHOUSE_RATE_LIMIT_MAX";
pub const ENV_RATE_LIMIT_WINDOW_SECS: &str = "GREENHOUSE_RATE_LIMIT_WINDOW_SECS";
pub const ENV_MAX_RETRIES: &str = "GREENHOUSE_MAX_RETRIES";

pub const DEFAULT_BASE_URL: &str = "https://harvest.greenhouse.io/v1";

/// Settings for the Harvest client.
#[derive(Clone)]
pub struct HarvestConfig {
    /// Harvest API key
    pub api_key: String,
    /// API base, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Client-side request ceiling
    pub rate_limit: RateLimitConfig,
    /// 429 retry bounds
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit)
            .field("retry", &self.retry)
            .finish()
    }
}

impl HarvestConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, HarvestError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads a dotenv file, with the process environment taking precedence.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let path = path.as_ref();
        let file_vars = dotenvy::from_path_iter(path)
            .and_then(|iter| iter.collect::<Result<HashMap<_, _>, _>>())
            .map_err(|e| {
                HarvestError::Configuration(format!("Failed to read {}: {}", path.display(), e))
            })?;

        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }

    /// Resolves every setting through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HarvestError> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                HarvestError::Configuration(format!(
                    "{} environment variable is required. Set it in your .env file or environment.",
                    ENV_API_KEY
                ))
            })?;

        let base_url = lookup(ENV_BASE_URL)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let rate_defaults = RateLimitConfig::default();
        let retry_defaults = RetryPolicy::default();

        let timeout = Duration::from_secs(parse_or(&lookup, ENV_TIMEOUT_SECS, 30)?);
        let rate_limit = RateLimitConfig {
            max_requests: parse_or(&lookup, ENV_RATE_LIMIT_MAX, rate_defaults.max_requests)?,
            window: Duration::from_secs(parse_or(
                &lookup,
                ENV_RATE_LIMIT_WINDOW_SECS,
                rate_defaults.window.as_secs(),
            )?),
        };
        let zero_settings = [
            (ENV_TIMEOUT_SECS, timeout.is_zero()),
            (ENV_RATE_LIMIT_MAX, rate_limit.max_requests == 0),
            (ENV_RATE_LIMIT_WINDOW_SECS, rate_limit.window.is_zero()),
        ];
        if let Some((key, _)) = zero_settings.iter().find(|(_, zero)| *zero) {
            return Err(HarvestError::Configuration(format!(
                "{} must be greater than zero",
                key
            )));
        }

        Ok(Self {
            api_key,
            base_url,
            timeout,
            rate_limit,
            retry: RetryPolicy {
                max_retries: parse_or(&lookup, ENV_MAX_RETRIES, retry_defaults.max_retries)?,
                ..retry_defaults
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, HarvestError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e| {
            HarvestError::Configuration(format!("Invalid value for {}: {} ({})", key, raw, e))
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_a_configuration_error() {
        let err = HarvestConfig::from_lookup(lookup_from(&[])).unwrap_err();

        assert!(matches!(err, HarvestError::Configuration(_)));
        assert!(err.to_string().contains(ENV_API_KEY));
    }

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "secret")])).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let config = HarvestConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "secret"),
            (ENV_BASE_URL, "http://localhost:9000/v1/"),
            (ENV_RATE_LIMIT_MAX, "20"),
            (ENV_MAX_RETRIES, "1"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.rate_limit.max_requests, 20);
        assert_eq!(config.retry.max_retries, 1);

        let err = HarvestConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "secret"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));
    }

    #[test]
    fn test_zero_settings_are_rejected() {
        for key in [ENV_TIMEOUT_SECS, ENV_RATE_LIMIT_MAX, ENV_RATE_LIMIT_WINDOW_SECS] {
            let err = HarvestConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "secret"), (key, "0")]))
                .unwrap_err();

            assert!(matches!(err, HarvestError::Configuration(_)), "{}", key);
            assert_eq!(
                err.to_string(),
                format!("Configuration error: {} must be greater than zero", key)
            );
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = HarvestConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "secret")])).unwrap();

        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_env_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GREENHOUSE_RATE_LIMIT_WINDOW_SECS=5").unwrap();
        writeln!(file, "{}=from-file", ENV_API_KEY).unwrap();

        let config = HarvestConfig::from_env_file(file.path()).unwrap();

        // The process environment wins if a key is set there.
        if std::env::var(ENV_API_KEY).is_err() {
            assert_eq!(config.api_key, "from-file");
        }
        if std::env::var(ENV_RATE_LIMIT_WINDOW_SECS).is_err() {
            assert_eq!(config.rate_limit.window, Duration::from_secs(5));
        }
    }

    #[test]
    fn test_missing_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = HarvestConfig::from_env_file(dir.path().join("absent.env")).unwrap_err();

        assert!(matches!(err, HarvestError::Configuration(_)));
    }
}

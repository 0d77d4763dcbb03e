use std::time::Duration;

use crate::error::ConfigError;

pub const API_URL_ENV: &str = "IMMICH_API_URL";
pub const API_KEY_ENV: &str = "IMMICH_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the Immich API.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base address, e.g. `https://photos.example.com/api`, without trailing `/`
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl CatalogConfig {
    /// Validate raw settings. Blank values count as missing.
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let api_url = api_url.trim().trim_end_matches('/');
        let api_key = api_key.trim();
        if api_url.is_empty() {
            return Err(ConfigError::Missing(API_URL_ENV));
        }
        if api_key.is_empty() {
            return Err(ConfigError::Missing(API_KEY_ENV));
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                url: api_url.to_string(),
                reason: "expected an http:// or https:// address",
            });
        }

        Ok(Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> Duration {
        Duration::from_secs(DEFAULT_TIMEOUT_SECS)
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let cfg = CatalogConfig::new("https://photos.example.com/api/", "secret", timeout()).unwrap();
        assert_eq!(cfg.api_url, "https://photos.example.com/api");
        assert_eq!(cfg.api_key, "secret");
    }

    #[test]
    fn test_blank_values_rejected() {
        assert!(matches!(
            CatalogConfig::new("  ", "secret", timeout()),
            Err(ConfigError::Missing(API_URL_ENV))
        ));
        assert!(matches!(
            CatalogConfig::new("http://localhost:2283/api", "", timeout()),
            Err(ConfigError::Missing(API_KEY_ENV))
        ));
    }

    #[test]
    fn test_scheme_required() {
        let err = CatalogConfig::new("localhost:2283", "secret", timeout()).unwrap_err();
        assert!(err.to_string().contains("localhost:2283"));
    }
}

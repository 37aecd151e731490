use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::render::{DEFAULT_EXPORT_SCALE, MAX_EXPORT_SCALE};
use crate::wizard::session::DEFAULT_SESSION_TTL;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub allowed_origins: Vec<String>,
    /// When set, the wizard asks this remote service for taglines instead of
    /// generating them in-process.
    pub tagline_service_url: Option<String>,
    pub tagline_timeout_secs: u64,
    pub export_scale: u32,
    /// Sessions untouched for this long are evicted with their photo.
    pub session_idle_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let tagline_service_url = lookup("TAGLINE_SERVICE_URL")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let tagline_timeout_secs = lookup("TAGLINE_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .context("TAGLINE_TIMEOUT_SECS must be a whole number of seconds")?;
        if tagline_timeout_secs == 0 {
            bail!("TAGLINE_TIMEOUT_SECS must be greater than zero");
        }

        let export_scale = lookup("EXPORT_SCALE")
            .map(|s| s.parse::<u32>())
            .transpose()
            .context("EXPORT_SCALE must be a whole number")?
            .unwrap_or(DEFAULT_EXPORT_SCALE);
        if !(1..=MAX_EXPORT_SCALE).contains(&export_scale) {
            bail!("EXPORT_SCALE must be between 1 and {MAX_EXPORT_SCALE}");
        }

        let session_idle_secs = lookup("SESSION_IDLE_SECS")
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("SESSION_IDLE_SECS must be a whole number of seconds")?
            .unwrap_or(DEFAULT_SESSION_TTL.as_secs());
        if session_idle_secs == 0 {
            bail!("SESSION_IDLE_SECS must be greater than zero");
        }

        Ok(Config {
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            allowed_origins,
            tagline_service_url,
            tagline_timeout_secs,
            export_scale,
            session_idle_secs,
        })
    }

    pub fn tagline_timeout(&self) -> Duration {
        Duration::from_secs(self.tagline_timeout_secs)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            tagline_service_url: None,
            tagline_timeout_secs: 5,
            export_scale: 1,
            session_idle_secs: DEFAULT_SESSION_TTL.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.rust_log, "info");
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:5173", "http://localhost:5174"]
        );
        assert!(config.tagline_service_url.is_none());
        assert_eq!(config.tagline_timeout(), Duration::from_secs(10));
        assert_eq!(config.export_scale, 3);
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("PORT", "8081"),
            ("ALLOWED_ORIGINS", " https://cards.example , ,http://localhost:3000"),
            ("TAGLINE_SERVICE_URL", "http://taglines:5000"),
            ("EXPORT_SCALE", "2"),
        ])
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(
            config.allowed_origins,
            vec!["https://cards.example", "http://localhost:3000"]
        );
        assert_eq!(config.tagline_service_url.as_deref(), Some("http://taglines:5000"));
        assert_eq!(config.export_scale, 2);
    }

    #[test]
    fn test_blank_service_url_is_ignored() {
        let config = from_map(&[("TAGLINE_SERVICE_URL", "  ")]).unwrap();
        assert!(config.tagline_service_url.is_none());
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(from_map(&[("PORT", "http")]).is_err());
        assert!(from_map(&[("EXPORT_SCALE", "9")]).is_err());
        assert!(from_map(&[("EXPORT_SCALE", "0")]).is_err());
        assert!(from_map(&[("TAGLINE_TIMEOUT_SECS", "0")]).is_err());
        assert!(from_map(&[("SESSION_IDLE_SECS", "0")]).is_err());
        assert!(from_map(&[("SESSION_IDLE_SECS", "soon")]).is_err());
    }
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cms_client::HttpOptions;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TOKEN_FILE: &str = ".cms_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub log_level: String,
    pub token_file: PathBuf,
    pub http_connect_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub inactivity_limit_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = get("CMS_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let log_level = get("LOG_LEVEL")
            .or_else(|| get("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());
        let token_file = get("CMS_TOKEN_FILE")
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string())
            .into();
        let http_connect_timeout_secs = parse_u64(&get, "CMS_HTTP_CONNECT_TIMEOUT_SECS", 5)?;
        let http_timeout_secs = parse_u64(&get, "CMS_HTTP_TIMEOUT_SECS", 15)?;
        let inactivity_limit_secs = parse_u64(&get, "CMS_INACTIVITY_LIMIT_SECS", 10 * 60 * 60)?;

        Ok(Self {
            api_url,
            log_level,
            token_file,
            http_connect_timeout_secs,
            http_timeout_secs,
            inactivity_limit_secs,
        })
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_secs(self.http_connect_timeout_secs),
            timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }

    pub fn inactivity_limit(&self) -> Duration {
        Duration::from_secs(self.inactivity_limit_secs)
    }
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let value = get(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_source(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let s = settings(&[]).expect("defaults are valid");
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.token_file, PathBuf::from(".cms_token"));
        assert_eq!(s.http_options(), HttpOptions::default());
        assert_eq!(s.inactivity_limit(), Duration::from_secs(36_000));
    }

    #[test]
    fn log_level_falls_back_to_rust_log() {
        let s = settings(&[("RUST_LOG", "debug")]).expect("valid");
        assert_eq!(s.log_level, "debug");

        let s = settings(&[("RUST_LOG", "debug"), ("LOG_LEVEL", "warn")]).expect("valid");
        assert_eq!(s.log_level, "warn");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = settings(&[("CMS_HTTP_TIMEOUT_SECS", "0")]).expect_err("must fail");
        assert!(err.to_string().contains("CMS_HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn garbage_number_is_rejected() {
        assert!(settings(&[("CMS_INACTIVITY_LIMIT_SECS", "ten")]).is_err());
    }

    #[test]
    fn blank_url_uses_default() {
        let s = settings(&[("CMS_API_URL", "  ")]).expect("valid");
        assert_eq!(s.api_url, DEFAULT_API_URL);
    }
}

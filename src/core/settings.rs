use crate::core::retry::{self, Backoff, RetryPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TOKEN_ENV: &str = "MAINTENANCE_WATCH_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub retry: RetrySettings,
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub status_path: String,
    pub toggle_path: String,
    /// Sent as `Authorization: Bearer <token>` on toggle requests.
    pub token: Option<String>,
    /// Raw `Cookie` header, for backends that authenticate by session cookie.
    pub session_cookie: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            status_path: "/api/maintenance/status".to_string(),
            toggle_path: "/api/admin/maintenance".to_string(),
            token: None,
            session_cookie: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub freshness_secs: u64,
    pub stale_multiplier: u32,
    pub poll_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            freshness_secs: 30,
            stale_multiplier: 5,
            poll_interval_secs: 30,
        }
    }
}

impl CacheSettings {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_base_delay_ms: u64,
    pub toggle_timeout_secs: u64,
    pub toggle_max_retries: u32,
    pub toggle_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: retry::FETCH_TIMEOUT.as_secs(),
            fetch_max_retries: retry::FETCH_MAX_RETRIES,
            fetch_base_delay_ms: retry::FETCH_BASE_DELAY.as_millis() as u64,
            toggle_timeout_secs: retry::TOGGLE_TIMEOUT.as_secs(),
            toggle_max_retries: retry::TOGGLE_MAX_RETRIES,
            toggle_delay_ms: retry::TOGGLE_DELAY.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn fetch_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_retries: self.fetch_max_retries,
            base_delay: Duration::from_millis(self.fetch_base_delay_ms),
            backoff: Backoff::Exponential,
        }
    }

    pub fn toggle_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.toggle_timeout_secs),
            max_retries: self.toggle_max_retries,
            base_delay: Duration::from_millis(self.toggle_delay_ms),
            backoff: Backoff::Linear,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("maintenance-watch").join("config.toml"))
    }

    /// The explicit path if given, otherwise [`Settings::config_path`].
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::config_path().context("Could not determine config directory"),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                settings.api.token = Some(token);
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if !self.api.status_path.starts_with('/') || !self.api.toggle_path.starts_with('/') {
            anyhow::bail!("api.status_path and api.toggle_path must start with '/'");
        }
        if self.cache.freshness_secs == 0 {
            anyhow::bail!("cache.freshness_secs must be greater than 0");
        }
        if self.cache.stale_multiplier < 1 {
            anyhow::bail!("cache.stale_multiplier must be at least 1");
        }
        if self.cache.poll_interval_secs == 0 {
            anyhow::bail!("cache.poll_interval_secs must be greater than 0");
        }
        if self.retry.fetch_timeout_secs == 0 || self.retry.toggle_timeout_secs == 0 {
            anyhow::bail!("retry timeouts must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.cache.freshness(), Duration::from_secs(30));
        assert_eq!(settings.cache.poll_interval(), Duration::from_secs(30));
        assert_eq!(settings.cache.stale_multiplier, 5);
        assert_eq!(settings.retry.fetch_policy(), RetryPolicy::fetch());
        assert_eq!(settings.retry.toggle_policy(), RetryPolicy::toggle());
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.cache.freshness_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.api.base_url = "  ".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.api.status_path = "api/status".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            debug = true

            [api]
            base_url = "https://sho.rt"
            session_cookie = "session=abc"

            [cache]
            freshness_secs = 10
            poll_interval_secs = 15

            [retry]
            toggle_max_retries = 0
        "#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert!(settings.debug);
        assert_eq!(settings.api.base_url, "https://sho.rt");
        assert_eq!(settings.api.status_path, "/api/maintenance/status");
        assert_eq!(settings.api.session_cookie.as_deref(), Some("session=abc"));
        assert_eq!(settings.cache.freshness_secs, 10);
        assert_eq!(settings.cache.stale_multiplier, 5);
        assert_eq!(settings.cache.poll_interval_secs, 15);
        assert_eq!(settings.retry.toggle_policy().max_attempts(), 1);
        assert_eq!(settings.retry.fetch_max_retries, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://example.test\"").unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.api.base_url, "https://example.test");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.api.base_url, ApiSettings::default().base_url);
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        let explicit = Path::new("/tmp/maintenance-watch.toml");
        assert_eq!(
            Settings::resolve_path(Some(explicit)).unwrap(),
            explicit.to_path_buf()
        );

        if let Some(default) = Settings::config_path() {
            assert_eq!(Settings::resolve_path(None).unwrap(), default);
        }
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nfreshness_secs = 0").unwrap();

        assert!(Settings::load_from(file.path()).is_err());
    }
}

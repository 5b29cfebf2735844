use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::api::{ApiEndpoints, HttpSiteApi, OfflineSiteApi, SiteApi};
use crate::player::{PlayerSelectors, RetryBudget};
use crate::state::TopBarSettings;

const DEFAULT_POLL_INTERVAL_MS: u64 = 5 * 60 * 1000;
const DEFAULT_PLAYER_RETRY_MAX_ATTEMPTS: u32 = 20;
const DEFAULT_PLAYER_RETRY_INTERVAL_MS: u64 = 500;
const CSRF_COOKIE: &str = "bili_jct";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) disable_network: Option<bool>,
    pub(crate) api_base_url: Option<String>,
    pub(crate) message_api_base_url: Option<String>,
    pub(crate) live_api_base_url: Option<String>,
    pub(crate) cookie: Option<String>,
    pub(crate) csrf: Option<String>,
    pub(crate) poll_interval_ms: Option<u64>,
    pub(crate) player_retry_max_attempts: Option<u32>,
    pub(crate) player_retry_interval_ms: Option<u64>,
    pub(crate) settings: Option<TopBarSettings>,
    pub(crate) player_selectors: Option<PlayerSelectors>,
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).context("parse topbar_config.json")
}

pub(crate) fn load_app_config(data_dir: &str) -> AppConfig {
    let path = Path::new(data_dir).join("topbar_config.json");
    if !path.exists() {
        return AppConfig::default();
    }
    match read_config(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(err = %format!("{e:#}"), "config unreadable, using defaults");
            AppConfig::default()
        }
    }
}

/// Picks the live HTTP client, or the offline stand-in when networking is disabled.
pub(crate) fn site_api_for(config: &AppConfig) -> Arc<dyn SiteApi> {
    if !config.network_enabled() {
        tracing::info!("network disabled; using offline site api");
        return Arc::new(OfflineSiteApi);
    }
    match HttpSiteApi::new(config.endpoints(), config.cookie().as_deref()) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            tracing::error!(err = %e, "http client init failed; using offline site api");
            Arc::new(OfflineSiteApi)
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Extracts `name` from a `k=v; k2=v2` cookie header.
pub(crate) fn cookie_value(cookie: &str, name: &str) -> Option<String> {
    cookie.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k.trim() == name)
            .then(|| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

impl AppConfig {
    pub(crate) fn network_enabled(&self) -> bool {
        // Used to keep Rust tests deterministic and offline.
        if let Some(disable) = self.disable_network {
            return !disable;
        }
        std::env::var("TOPBAR_DISABLE_NETWORK").ok().as_deref() != Some("1")
    }

    pub(crate) fn endpoints(&self) -> ApiEndpoints {
        let defaults = ApiEndpoints::default();
        ApiEndpoints {
            api_base_url: non_empty(&self.api_base_url).unwrap_or(defaults.api_base_url),
            message_api_base_url: non_empty(&self.message_api_base_url)
                .unwrap_or(defaults.message_api_base_url),
            live_api_base_url: non_empty(&self.live_api_base_url)
                .unwrap_or(defaults.live_api_base_url),
        }
    }

    pub(crate) fn cookie(&self) -> Option<String> {
        self.cookie_with_override(std::env::var("TOPBAR_COOKIE").ok())
    }

    /// `env_cookie` is the `TOPBAR_COOKIE` value; when non-empty it wins over the file.
    fn cookie_with_override(&self, env_cookie: Option<String>) -> Option<String> {
        non_empty(&env_cookie).or_else(|| non_empty(&self.cookie))
    }

    pub(crate) fn csrf(&self) -> Option<String> {
        self.csrf_with_cookie(self.cookie())
    }

    fn csrf_with_cookie(&self, cookie: Option<String>) -> Option<String> {
        non_empty(&self.csrf).or_else(|| cookie.and_then(|c| cookie_value(&c, CSRF_COOKIE)))
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        let ms = self
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(1);
        Duration::from_millis(ms)
    }

    pub(crate) fn retry_budget(&self) -> RetryBudget {
        RetryBudget {
            max_attempts: self
                .player_retry_max_attempts
                .unwrap_or(DEFAULT_PLAYER_RETRY_MAX_ATTEMPTS),
            interval: Duration::from_millis(
                self.player_retry_interval_ms
                    .unwrap_or(DEFAULT_PLAYER_RETRY_INTERVAL_MS),
            ),
        }
    }

    pub(crate) fn initial_settings(&self) -> TopBarSettings {
        self.settings.clone().unwrap_or_default()
    }

    pub(crate) fn selectors(&self) -> PlayerSelectors {
        self.player_selectors.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config(dir.path().to_str().unwrap());
        assert_eq!(config.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.retry_budget().max_attempts, 20);
        assert_eq!(config.retry_budget().interval, Duration::from_millis(500));
        assert_eq!(config.endpoints(), ApiEndpoints::default());
    }

    #[test]
    fn garbage_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("topbar_config.json"), b"{not json").unwrap();
        let config = load_app_config(dir.path().to_str().unwrap());
        assert!(config.settings.is_none());
    }

    #[test]
    fn reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("topbar_config.json"),
            serde_json::to_vec(&serde_json::json!({
                "disable_network": true,
                "api_base_url": "http://127.0.0.1:9000/",
                "poll_interval_ms": 0,
                "settings": {"auto_hide_top_bar": true},
            }))
            .unwrap(),
        )
        .unwrap();
        let config = load_app_config(dir.path().to_str().unwrap());
        assert!(!config.network_enabled());
        assert_eq!(config.endpoints().api_base_url, "http://127.0.0.1:9000/");
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        let settings = config.initial_settings();
        assert!(settings.auto_hide_top_bar);
        assert!(settings.show_top_bar);
    }

    #[test]
    fn csrf_falls_back_to_cookie() {
        let config = AppConfig {
            cookie: Some("SESSDATA=abc; bili_jct=tok123; DedeUserID=1".to_string()),
            ..Default::default()
        };
        let cookie = config.cookie_with_override(None);
        assert_eq!(
            config.csrf_with_cookie(cookie).as_deref(),
            Some("tok123")
        );

        let from_env = config.cookie_with_override(Some("bili_jct=envtok".to_string()));
        assert_eq!(
            config.csrf_with_cookie(from_env).as_deref(),
            Some("envtok")
        );
        assert_eq!(
            config.cookie_with_override(Some("  ".to_string())),
            config.cookie
        );

        let explicit = AppConfig {
            csrf: Some("explicit".to_string()),
            ..config
        };
        assert_eq!(
            explicit.csrf_with_cookie(explicit.cookie_with_override(None)).as_deref(),
            Some("explicit")
        );
    }

    #[test]
    fn cookie_value_ignores_empty_entries() {
        assert_eq!(cookie_value("a=1; bili_jct=", "bili_jct"), None);
        assert_eq!(cookie_value("bili_jct=x", "bili_jct").as_deref(), Some("x"));
        assert_eq!(cookie_value("", "bili_jct"), None);
    }
}

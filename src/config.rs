//! Process configuration, read once at startup.
//!
//! Sources, first wins per variable: process environment, `./.env`,
//! `<config_dir>/wayfarer/wayfarer.env`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEOLOCATE_URL: &str = "https://ipapi.co/json/";
pub const MAX_RESULTS_LIMIT: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Oracle API key. Only required once an oracle client is built.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub max_results: usize,
    pub geolocate_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("WAYFARER_API_KEY".to_string()))
    }
}

/// Load configuration from the environment and the optional env files.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    if let Some(path) = user_env_file() {
        load_env_file(&path);
    }
    build_app_config(|key| std::env::var(key))
}

/// `<config_dir>/wayfarer/wayfarer.env`, e.g. `~/.config/wayfarer/wayfarer.env`.
pub fn user_env_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wayfarer").join("wayfarer.env"))
}

/// Load an env file without overriding variables that are already set.
pub fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded env file");
            true
        }
        Err(_) => false,
    }
}

/// Core parsing and validation over an arbitrary lookup, so tests can use a map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let api_key = lookup("WAYFARER_API_KEY")
        .or_else(|_| lookup("GEMINI_API_KEY"))
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    let model = or_default("WAYFARER_MODEL", DEFAULT_MODEL);
    if model.trim().is_empty() {
        return Err(invalid("WAYFARER_MODEL", "must not be empty".into()));
    }

    let api_base = or_default("WAYFARER_API_BASE", DEFAULT_API_BASE)
        .trim_end_matches('/')
        .to_string();

    let request_timeout_secs = or_default("WAYFARER_TIMEOUT_SECS", "30")
        .parse::<u64>()
        .map_err(|e| invalid("WAYFARER_TIMEOUT_SECS", e.to_string()))?;
    if request_timeout_secs == 0 {
        return Err(invalid("WAYFARER_TIMEOUT_SECS", "must be at least 1".into()));
    }

    let max_results = or_default("WAYFARER_MAX_RESULTS", "10")
        .parse::<usize>()
        .map_err(|e| invalid("WAYFARER_MAX_RESULTS", e.to_string()))?;
    if !(1..=MAX_RESULTS_LIMIT).contains(&max_results) {
        return Err(invalid(
            "WAYFARER_MAX_RESULTS",
            format!("must be between 1 and {}", MAX_RESULTS_LIMIT),
        ));
    }

    let geolocate_url = or_default("WAYFARER_GEOLOCATE_URL", DEFAULT_GEOLOCATE_URL);

    let bind_addr = or_default("WAYFARER_BIND_ADDR", "127.0.0.1:8080")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("WAYFARER_BIND_ADDR", e.to_string()))?;

    let log_level = or_default("WAYFARER_LOG_LEVEL", "info");

    Ok(AppConfig {
        api_key,
        model,
        api_base,
        request_timeout_secs,
        max_results,
        geolocate_url,
        bind_addr,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::VarError;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| map.get(key).map(|v| (*v).to_string()).ok_or(VarError::NotPresent)
    }

    #[test]
    fn test_defaults() {
        let map = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.max_results, 10);
        assert_eq!(cfg.geolocate_url, DEFAULT_GEOLOCATE_URL);
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.log_level, "info");
        assert!(matches!(cfg.require_api_key(), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_api_key_fallback() {
        let mut map = HashMap::new();
        map.insert("GEMINI_API_KEY", "from-gemini");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.require_api_key().unwrap(), "from-gemini");

        map.insert("WAYFARER_API_KEY", "primary");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let mut map = HashMap::new();
        map.insert("WAYFARER_API_KEY", "   ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let mut map = HashMap::new();
        map.insert("WAYFARER_API_BASE", "http://localhost:9000/");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.api_base, "http://localhost:9000");
    }

    #[test]
    fn test_invalid_timeout() {
        let mut map = HashMap::new();
        map.insert("WAYFARER_TIMEOUT_SECS", "soon");
        let err = build_app_config(lookup_from_map(&map)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "WAYFARER_TIMEOUT_SECS"));

        map.insert("WAYFARER_TIMEOUT_SECS", "0");
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }

    #[test]
    fn test_max_results_bounds() {
        let mut map = HashMap::new();
        map.insert("WAYFARER_MAX_RESULTS", "0");
        assert!(build_app_config(lookup_from_map(&map)).is_err());
        map.insert("WAYFARER_MAX_RESULTS", "21");
        assert!(build_app_config(lookup_from_map(&map)).is_err());
        map.insert("WAYFARER_MAX_RESULTS", "20");
        assert_eq!(build_app_config(lookup_from_map(&map)).unwrap().max_results, 20);
    }

    #[test]
    fn test_invalid_bind_addr() {
        let mut map = HashMap::new();
        map.insert("WAYFARER_BIND_ADDR", "not-an-addr");
        let err = build_app_config(lookup_from_map(&map)).unwrap_err();
        assert!(err.to_string().starts_with("invalid value for WAYFARER_BIND_ADDR"));
    }

    #[test]
    fn test_load_env_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("wayfarer.env");
        std::fs::write(&path, "WAYFARER_TEST_ONLY_VAR=from-file\n").unwrap();

        assert!(load_env_file(&path));
        assert_eq!(std::env::var("WAYFARER_TEST_ONLY_VAR").unwrap(), "from-file");
        assert!(!load_env_file(&dir.path().join("missing.env")));
    }
}

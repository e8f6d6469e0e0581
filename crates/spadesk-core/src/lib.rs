use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spadesk_api::SpaError;

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_API_URL: &str = "SPADESK_API_URL";
pub const ENV_SPA_ID: &str = "SPADESK_SPA_ID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub default_tenant: Option<String>,
    pub tenant_param: String,
    pub exempt_prefixes: Vec<String>,
    pub request_timeout_ms: u64,
    pub keyring_service: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            default_tenant: None,
            tenant_param: "spaId".to_string(),
            exempt_prefixes: vec!["auth".to_string(), "master-admin".to_string()],
            request_timeout_ms: 15_000,
            keyring_service: "spadesk".to_string(),
        }
    }
}

pub fn validate_config(cfg: &ClientConfig) -> Result<(), SpaError> {
    if cfg.api_url.trim().is_empty() {
        return Err(SpaError::Config("api_url must not be empty".to_string()));
    }
    if !(cfg.api_url.starts_with("http://") || cfg.api_url.starts_with("https://")) {
        return Err(SpaError::Config(format!(
            "api_url must be an http(s) URL, got {}",
            cfg.api_url
        )));
    }
    if cfg.tenant_param.trim().is_empty() {
        return Err(SpaError::Config("tenant_param must not be empty".to_string()));
    }
    if cfg.request_timeout_ms == 0 {
        return Err(SpaError::Config(
            "request_timeout_ms must be positive".to_string(),
        ));
    }
    Ok(())
}

pub fn default_config_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config").join("spadesk")
    } else {
        PathBuf::from(".spadesk")
    }
}

pub fn load_config_from_file(path: &Path) -> Result<ClientConfig, SpaError> {
    let content = fs::read_to_string(path)
        .map_err(|e| SpaError::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| SpaError::Config(format!("invalid TOML in {}: {e}", path.display())))
}

/// Overlay environment values onto `cfg`. Blank values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_blank(ENV_API_URL) {
        cfg.api_url = url;
    }
    if let Some(tenant) = non_blank(ENV_SPA_ID) {
        cfg.default_tenant = Some(tenant);
    }
}

/// Load `<dir>/config.toml` (defaults when absent), apply environment
/// overrides, then validate.
pub fn load_config(dir: &Path) -> Result<ClientConfig, SpaError> {
    let path = dir.join(CONFIG_FILE);
    let mut cfg = if path.exists() {
        load_config_from_file(&path)?
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        ClientConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn write_default_config_file(dir: &Path) -> Result<PathBuf, SpaError> {
    fs::create_dir_all(dir)
        .map_err(|e| SpaError::Config(format!("failed to create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        fs::write(&path, DEFAULT_CONFIG).map_err(|e| {
            SpaError::Config(format!("failed to write {}: {e}", path.display()))
        })?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("../../../docs/spadesk/config.toml.example");

//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The app secret is loaded from COMPONENT_APP_SECRET or app_secret_file,
//! never stored in the TOML directly to avoid leaking secrets.

use common::Secret;
use component_auth::{ComponentConfig, DEFAULT_API_BASE};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Env var holding the component app secret
pub const SECRET_ENV: &str = "COMPONENT_APP_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub component: ComponentSection,
    #[serde(default)]
    pub cache: CacheSection,
}

/// Platform identity and API settings
#[derive(Debug, Deserialize)]
pub struct ComponentSection {
    pub app_id: String,
    #[serde(skip)]
    pub app_secret: Option<Secret<String>>,
    /// Path to a file containing the app secret (alternative to COMPONENT_APP_SECRET)
    #[serde(default)]
    pub app_secret_file: Option<PathBuf>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// File cache location
#[derive(Debug, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_owned()
}

fn default_timeout() -> u64 {
    10
}

fn default_cache_path() -> PathBuf {
    std::env::temp_dir().join("component-cache.json")
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// App secret resolution order:
    /// 1. COMPONENT_APP_SECRET env var
    /// 2. app_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.component.app_id.trim().is_empty() {
            return Err(common::Error::Config("app_id must not be empty".into()));
        }

        if !config.component.api_base.starts_with("http://")
            && !config.component.api_base.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "api_base must start with http:// or https://, got: {}",
                config.component.api_base
            )));
        }

        if config.component.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        // Resolve app secret: env var takes precedence over file
        if let Ok(secret) = std::env::var(SECRET_ENV) {
            config.component.app_secret = Secret::from_trimmed(&secret);
        } else if let Some(ref secret_file) = config.component.app_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read app_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            config.component.app_secret = Secret::from_trimmed(&secret);
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("component-cli.toml")
    }

    /// Platform identity for the component client.
    ///
    /// Fails when no secret was resolved; commands that never mint a token
    /// (storing a verify ticket) don't call this.
    pub fn component_config(&self) -> common::Result<ComponentConfig> {
        let secret = self.component.app_secret.clone().ok_or_else(|| {
            common::Error::Config(format!(
                "app secret missing: set {SECRET_ENV} or app_secret_file"
            ))
        })?;
        Ok(ComponentConfig::new(self.component.app_id.clone(), secret)
            .with_api_base(self.component.api_base.clone()))
    }
}

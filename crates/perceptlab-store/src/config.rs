//! Store configuration loading.
//!
//! `perceptlab.toml` configures where results go. Search order: explicit
//! path, `./perceptlab.toml`, then `~/.config/perceptlab/config.toml`.
//! `${VAR}` references resolve from the environment, and
//! `PERCEPTLAB_API_URL` overrides the configured service URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use perceptlab_core::traits::SessionStore;

use crate::http::HttpSessionStore;
use crate::memory::MemorySessionStore;

/// Top-level perceptlab configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the REST persistence service. When absent, runs use an
    /// in-process store and nothing outlives the process.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory for saved reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./perceptlab-results")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_secs: default_timeout_secs(),
            output_dir: default_output_dir(),
        }
    }
}

impl StoreConfig {
    /// Build the session store this configuration describes.
    pub fn build_store(&self) -> Arc<dyn SessionStore> {
        match &self.api_url {
            Some(url) => Arc::new(
                HttpSessionStore::new(url.clone())
                    .with_timeout(Duration::from_secs(self.timeout_secs)),
            ),
            None => Arc::new(MemorySessionStore::new()),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        } else {
            break;
        }
    }
    result
}

/// Load configuration from the default locations.
pub fn load_config() -> Result<StoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("perceptlab.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            global.exists().then_some(global)
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<StoreConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StoreConfig::default(),
    };

    if let Ok(url) = std::env::var("PERCEPTLAB_API_URL") {
        config.api_url = Some(url);
    }
    config.api_url = config.api_url.map(|u| resolve_env_vars(&u));

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("perceptlab"))
}

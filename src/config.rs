// Client configuration: where the similarity service lives and whether
// requests should time out.
//
// Values are resolved in this order: explicit overrides (CLI flags),
// environment variables, the TOML file in the user's config directory,
// then built-in defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const ENV_BASE_URL: &str = "IMGMATCH_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "IMGMATCH_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base address of the similarity service, without a trailing slash.
    pub base_url: String,
    /// `None` means requests never time out.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

/// Shape of `config.toml`. Every key is optional.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `<config_dir>/imgmatch/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("imgmatch").join("config.toml"))
}

/// Parse a config file. A missing file yields an empty `FileConfig`.
pub fn load_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let parsed: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(parsed)
}

impl Config {
    /// Resolve the configuration from flags, the process environment and
    /// the default config file location.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let file = match default_config_path() {
            Some(p) => load_file(&p)?,
            None => FileConfig::default(),
        };
        Self::resolve(overrides, |key| std::env::var(key).ok(), &file)
    }

    /// Merge the layers. `env` is a lookup so callers (and tests) control
    /// what the environment looks like.
    pub fn resolve<F>(overrides: &Overrides, env: F, file: &FileConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| env(ENV_BASE_URL))
            .or_else(|| file.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let env_timeout = match env(ENV_TIMEOUT_SECS) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))?,
            ),
            None => None,
        };
        let timeout_secs = overrides.timeout_secs.or(env_timeout).or(file.timeout_secs);

        Ok(Self {
            base_url: normalize_base_url(&base_url),
            // zero disables the timeout, same as leaving it unset
            timeout: timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
        })
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

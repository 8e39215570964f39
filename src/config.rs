use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::consts::LITELLM_PRICING_URL;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) offline: bool,
    #[serde(default)]
    pub(crate) debug: bool,
    #[serde(default)]
    pub(crate) compensation: Option<f64>,
    #[serde(default)]
    pub(crate) data_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) pricing_url: Option<String>,
}

impl Config {
    pub(crate) fn load() -> Self {
        Self::load_internal(false)
    }

    pub(crate) fn load_quiet() -> Self {
        Self::load_internal(true)
    }

    fn load_internal(quiet: bool) -> Self {
        // Try config locations in order of priority
        for path in Self::config_paths() {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        if !quiet {
                            eprintln!("Loaded config from {}", path.display());
                        }
                        return config;
                    }
                    Err(e) => {
                        if !quiet {
                            eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                        }
                    }
                }
            }
        }

        Self::default()
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/costwise/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("costwise").join("config.toml"));
        }

        // 2. Platform config dir (macOS Application Support)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("costwise").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.costwise.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".costwise.toml"));
        }

        paths
    }

    /// Ledger directory: env override, then config, then the platform data
    /// dir, then the working directory.
    pub(crate) fn data_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("COSTWISE_DATA_DIR") {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("costwise"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Pricing cache directory: env override, then config, then the
    /// platform cache dir, then the working directory.
    pub(crate) fn cache_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("COSTWISE_CACHE_DIR") {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|d| d.join("costwise"))
            .unwrap_or_else(|| PathBuf::from(".cache"))
    }

    /// Dataset URL: env override, then config, then the LiteLLM default.
    pub(crate) fn pricing_url(&self) -> String {
        if let Ok(url) = std::env::var("COSTWISE_PRICING_URL") {
            return url;
        }
        self.pricing_url
            .clone()
            .unwrap_or_else(|| LITELLM_PRICING_URL.to_string())
    }
}

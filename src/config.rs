// src/config.rs
// =============================================================================
// Configuration for github-explorer.
//
// Defaults for the display name, description and API token can be baked in
// at build time (`GITHUB_EXPLORER_APP_NAME`, `GITHUB_EXPLORER_APP_DESCRIPTION`,
// `GITHUB_EXPLORER_TOKEN`). A YAML file overrides them at runtime, and the
// `GITHUB_TOKEN` environment variable fills in a token when none is set.
// =============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::github::{DEFAULT_API_BASE, DEFAULT_PER_PAGE};

const CONFIG_FILE: &str = "github-explorer.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub name: String,
    pub description: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: option_env!("GITHUB_EXPLORER_APP_NAME")
                .unwrap_or("GitHub Explorer")
                .into(),
            description: option_env!("GITHUB_EXPLORER_APP_DESCRIPTION")
                .unwrap_or("Search GitHub users and browse their repositories")
                .into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub token: Option<String>,
    pub search_limit: u32,
    pub per_page: u32,
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            token: option_env!("GITHUB_EXPLORER_TOKEN").map(String::from),
            search_limit: 5,
            per_page: DEFAULT_PER_PAGE,
            timeout_secs: 15,
        }
    }
}

impl GithubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Synthesizer executable (espeak-ng compatible command line)
    pub binary: String,
    /// Language of the voice flagged as default
    pub default_language: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            binary: "espeak-ng".into(),
            default_language: "en-us".into(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppInfo,
    pub github: GithubConfig,
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./github-explorer.yaml
    /// 2. ~/.config/github-explorer/config.yaml
    ///
    /// A missing or broken file falls back to defaults with a warning.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::from_file(path);

        if config.github.token.as_deref().map_or(true, str::is_empty) {
            config.github.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        }

        config
    }

    fn from_file(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join(CONFIG_FILE)),
                dirs::home_dir().map(|h| h.join(".config/github-explorer/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }
}

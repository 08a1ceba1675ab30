use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::github::DEFAULT_API_URL;

const CONFIG_FILE: &str = ".gitdata.toml";
const DEFAULT_TOKEN_FILE: &str = "mytoken.txt";
const DEFAULT_DATA_DIR: &str = "session_data";
const DEFAULT_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .gitdata.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// API root, for GitHub Enterprise installs.
    pub api_url: Option<String>,
    /// Where a validated token is persisted between runs.
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Root directory for CSV files and chart tables.
    pub data_dir: Option<PathBuf>,
    /// Default trailing window for pull request downloads.
    pub window_days: Option<i64>,
}

impl Config {
    /// Load configuration from .gitdata.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
    }

    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn token_file(&self) -> PathBuf {
        self.github
            .token_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.output
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    pub fn window_days(&self) -> i64 {
        self.output.window_days.unwrap_or(DEFAULT_WINDOW_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.api_url(), "https://api.github.com");
        assert_eq!(config.token_file(), PathBuf::from("mytoken.txt"));
        assert_eq!(config.data_dir(), PathBuf::from("session_data"));
        assert_eq!(config.window_days(), 365);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "ghp_example"
api_url = "https://github.example.com/api/v3"

[output]
data_dir = "out"
window_days = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github_token().as_deref(), Some("ghp_example"));
        assert_eq!(config.api_url(), "https://github.example.com/api/v3");
        assert_eq!(config.data_dir(), PathBuf::from("out"));
        assert_eq!(config.window_days(), 30);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitdata.toml");
        std::fs::write(&path, "[output]\nwindow_days = 7\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.window_days(), 7);
        assert!(config.github.api_url.is_none());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitdata.toml");
        std::fs::write(&path, "[output\nwindow_days = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}

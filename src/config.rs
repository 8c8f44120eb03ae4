//! Configuration Module - User preferences from config.toml
//!
//! Supports:
//! - Default AWS profile, region and bucket
//! - Log level
//! - TUI display settings
//! - Keyboard shortcut overrides

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// bucket-grep configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// TUI settings
    pub tui: TuiConfig,
    /// Custom keyboard shortcuts
    #[serde(default)]
    pub keys: HashMap<String, String>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// AWS profile name; empty uses the default credential chain
    pub profile: String,
    /// Region override (defaults to the profile's region)
    pub region: Option<String>,
    /// Bucket to open on startup
    pub bucket: Option<String>,
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            region: None,
            bucket: None,
            log_level: "info".to_string(),
        }
    }
}

/// TUI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Show object sizes
    pub show_sizes: bool,
    /// Show last-modified timestamps
    pub show_dates: bool,
    /// Rows moved by PgUp/PgDn
    pub page_size: usize,
    /// Highlight regex matches in the log view
    pub highlight_matches: bool,
    /// Columns a tab character expands to in the log view
    pub tab_width: usize,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            show_sizes: true,
            show_dates: true,
            page_size: 20,
            highlight_matches: true,
            tab_width: 4,
        }
    }
}

impl Config {
    /// Load an explicit path, or the default path if it exists
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "bucket-grep", "bucket-grep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".bucket-grep")
                    .join("config.toml")
            })
    }

    /// Path of the TUI log file, if a cache directory is available
    pub fn log_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "bucket-grep", "bucket-grep")
            .map(|dirs| dirs.cache_dir().join("bucket-grep.log"))
    }

    /// Write the commented sample config unless a file already exists
    ///
    /// Returns false when the file was left untouched.
    pub fn init_at(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, generate_sample_config())
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        tracing::info!("Created default config at {}", path.display());
        Ok(true)
    }

    /// Get keybinding or default
    pub fn get_key(&self, action: &str, default: &str) -> String {
        self.keys
            .get(action)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Character bound to `action`, falling back to `default`
    ///
    /// Multi-character bindings are ignored.
    pub fn key_char(&self, action: &str, default: char) -> char {
        let key = self.get_key(action, &default.to_string());
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => default,
        }
    }
}

/// Generate a sample config file with comments
pub fn generate_sample_config() -> String {
    r#"# bucket-grep configuration

[general]
# AWS profile resolved through the standard credential chain
profile = "default"

# Region override; by default the profile's region is used
# region = "ap-northeast-1"

# Bucket opened on startup
# bucket = "my-log-bucket"

# Log level: trace, debug, info, warn, error
log_level = "info"

[tui]
# Show object sizes in the file list
show_sizes = true

# Show last-modified timestamps (UTC+9)
show_dates = true

# Rows moved by PgUp / PgDn
page_size = 20

# Highlight regex matches in the log view
highlight_matches = true

# Columns a tab expands to in the log view
tab_width = 4

[keys]
# Custom keybindings (action = key)
# Available actions: quit, decode, refresh, profile, help
# quit = "q"
# decode = "d"
# refresh = "r"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.profile, "default");
        assert_eq!(config.general.log_level, "info");
        assert!(config.general.bucket.is_none());
        assert!(config.tui.highlight_matches);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_config.toml");
        fs::write(&path, "[general]\nbucket = \"logs\"\n\n[tui]\npage_size = 5\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.general.bucket.as_deref(), Some("logs"));
        assert_eq!(loaded.tui.page_size, 5);
        assert_eq!(loaded.general.profile, "default");
    }

    #[test]
    fn test_parse_sample_config() {
        let sample = generate_sample_config();
        let config: Config = toml::from_str(&sample).unwrap();
        assert_eq!(config.tui.tab_width, 4);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[general]\nprofile = \"prod\"\n").unwrap();
        assert_eq!(config.general.profile, "prod");
        assert_eq!(config.general.log_level, "info");
        assert!(config.tui.show_dates);
    }

    #[test]
    fn test_init_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(Config::init_at(&path, false).unwrap());
        fs::write(&path, "[general]\nprofile = \"kept\"\n").unwrap();
        assert!(!Config::init_at(&path, false).unwrap());
        assert_eq!(Config::load_from(&path).unwrap().general.profile, "kept");

        assert!(Config::init_at(&path, true).unwrap());
        assert_eq!(Config::load_from(&path).unwrap().general.profile, "default");
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_or_default(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_custom_keybinding() {
        let mut config = Config::default();
        config.keys.insert("quit".to_string(), "x".to_string());
        config.keys.insert("decode".to_string(), "enter".to_string());

        assert_eq!(config.get_key("quit", "q"), "x");
        assert_eq!(config.key_char("quit", 'q'), 'x');
        assert_eq!(config.key_char("decode", 'd'), 'd');
        assert_eq!(config.key_char("refresh", 'r'), 'r');
    }
}

//! Configuration for the video subsystem

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Adapter, Charset, ScreenSettings};

/// Kind of monitor attached to the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monitor {
    #[default]
    Colour,
    /// Monochrome monitor; turns an EGA into an EGA mono
    Mono,
}

/// Video configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display adapter to emulate
    pub adapter: Adapter,
    pub monitor: Monitor,
    /// Bytes of memory set aside for video (Tandy and PCjr)
    pub video_memory: usize,
    /// Columns of the start-up text mode
    pub text_width: usize,
    /// Codepage of the text; 932, 936, 949 and 950 are double-byte
    pub codepage: u16,
    /// Keep box-drawing characters apart in double-byte codepages
    pub box_protect: bool,
    /// Display backends in order of preference; empty means built-in order
    pub backends: Vec<String>,
    /// Render tick in milliseconds
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adapter: Adapter::Cga,
            monitor: Monitor::Colour,
            video_memory: 0x10000,
            text_width: 80,
            codepage: 437,
            box_protect: false,
            backends: Vec::new(),
            tick_ms: 24,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from default location or return default config
    pub fn load_or_default() -> Self {
        // Try to load from ~/.config/retro-video/config.json
        if let Some(config_dir) = dirs_config_path() {
            let config_path = config_dir.join("config.json");
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(err) => {
                        tracing::warn!(path = %config_path.display(), error = %err, "ignoring unreadable config")
                    }
                }
            }
        }
        Self::default()
    }

    /// Adapter after taking the monitor into account
    pub fn effective_adapter(&self) -> Adapter {
        match (self.adapter, self.monitor) {
            (Adapter::Ega, Monitor::Mono) => Adapter::EgaMono,
            (adapter, _) => adapter,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Settings for building a [`Screen`](crate::core::Screen)
    pub fn screen_settings(&self) -> ScreenSettings {
        ScreenSettings {
            adapter: self.effective_adapter(),
            video_memory: self.video_memory,
            text_width: self.text_width,
            charset: Charset::from_codepage(self.codepage),
            box_protect: self.box_protect,
        }
    }
}

/// Get the configuration directory path
fn dirs_config_path() -> Option<std::path::PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| std::path::PathBuf::from(home).join(".config").join("retro-video"))
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.adapter, Adapter::Cga);
        assert_eq!(config.codepage, 437);
        assert_eq!(config.tick(), Duration::from_millis(24));
        assert!(config.backends.is_empty());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            adapter: Adapter::Tandy,
            video_memory: 0x20000,
            backends: vec!["headless".into()],
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"adapter": "ega", "monitor": "mono", "codepage": 932}"#).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.text_width, 80);

        let settings = config.screen_settings();
        assert_eq!(settings.adapter, Adapter::EgaMono);
        assert_eq!(settings.charset, Charset::ShiftJis);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Json(_))));
    }
}

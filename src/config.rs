use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::heatmap::HeatmapLevels;

const MIN_WORD_COUNT: usize = 1;
const MAX_WORD_COUNT: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Base URL of a sync server; local files are used when unset.
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default = "default_heatmap_levels")]
    pub heatmap_levels: u8,
    #[serde(default = "default_word_count")]
    pub learn_word_count: usize,
    #[serde(default = "default_word_count")]
    pub quiz_word_count: usize,
    #[serde(default = "default_word_count")]
    pub practice_word_count: usize,
    #[serde(default = "default_word_count")]
    pub missing_letters_word_count: usize,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub admin_pin: Option<String>,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spellbee")
        .to_string_lossy()
        .to_string()
}
fn default_heatmap_levels() -> u8 {
    HeatmapLevels::default().get()
}
fn default_word_count() -> usize {
    5
}
fn default_poll_interval_secs() -> u64 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server_url: None,
            heatmap_levels: default_heatmap_levels(),
            learn_word_count: default_word_count(),
            quiz_word_count: default_word_count(),
            practice_word_count: default_word_count(),
            missing_letters_word_count: default_word_count(),
            poll_interval_secs: default_poll_interval_secs(),
            admin_pin: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spellbee")
            .join("config.toml")
    }

    /// Pull out-of-range values back into range after loading or CLI overrides.
    pub fn validate(&mut self) {
        self.heatmap_levels = HeatmapLevels::new(self.heatmap_levels).get();
        for count in [
            &mut self.learn_word_count,
            &mut self.quiz_word_count,
            &mut self.practice_word_count,
            &mut self.missing_letters_word_count,
        ] {
            *count = (*count).clamp(MIN_WORD_COUNT, MAX_WORD_COUNT);
        }
        self.poll_interval_secs = self.poll_interval_secs.max(1);
        if self.server_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            self.server_url = None;
        }
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn levels(&self) -> HeatmapLevels {
        HeatmapLevels::new(self.heatmap_levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.heatmap_levels, 3);
        assert_eq!(config.learn_word_count, 5);
        assert_eq!(config.poll_interval_secs, 3);
        assert!(config.server_url.is_none());
        assert!(config.data_dir.contains("spellbee"));
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
server_url = "http://localhost:3001"
quiz_word_count = 10
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server_url.as_deref(), Some("http://localhost:3001"));
        assert_eq!(config.quiz_word_count, 10);
        assert_eq!(config.learn_word_count, 5);
        assert!(config.admin_pin.is_none());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.admin_pin = Some("4321".to_string());
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_validate_clamps_out_of_range_values() {
        let mut config = Config {
            heatmap_levels: 9,
            learn_word_count: 0,
            quiz_word_count: 500,
            poll_interval_secs: 0,
            server_url: Some("  ".to_string()),
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.heatmap_levels, 5);
        assert_eq!(config.learn_word_count, 1);
        assert_eq!(config.quiz_word_count, 100);
        assert_eq!(config.poll_interval_secs, 1);
        assert!(config.server_url.is_none());
    }
}

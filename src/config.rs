// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub boost: BoostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default CRF for re-encodes when the command line doesn't set one
    #[serde(default = "default_crf")]
    pub crf: i32,

    /// Default encoder speed preset
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Default output container
    #[serde(default = "default_container")]
    pub container: String,

    /// Pass the audio stream through unchanged by default
    #[serde(default = "default_true_config")]
    pub copy_audio: bool,

    /// Default scene-change threshold for thumbnail extraction
    #[serde(default = "default_scene_threshold")]
    pub scene_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostConfig {
    /// Remove the booster's working directory after a successful run
    #[serde(default = "default_true_config")]
    pub cleanup: bool,

    /// Forward the booster's own progress output
    #[serde(default)]
    pub verbose: bool,
}

fn default_crf() -> i32 {
    18
}

fn default_preset() -> String {
    "slow".to_string()
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_scene_threshold() -> f32 {
    0.15
}

fn default_true_config() -> bool {
    true
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            crf: default_crf(),
            preset: default_preset(),
            container: default_container(),
            copy_audio: true,
            scene_threshold: default_scene_threshold(),
        }
    }
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            cleanup: true,
            verbose: false,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("ffkit")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("ffkit")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or fall back to defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;

            let config: Config = toml::from_str(&contents).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a default config file if it doesn't exist
    pub fn ensure_default() -> Result<()> {
        if !Self::exists() {
            let config = Config::default();
            config.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.crf, 18);
        assert_eq!(config.defaults.preset, "slow");
        assert_eq!(config.defaults.container, "mp4");
        assert!(config.defaults.copy_audio);
        assert_eq!(config.defaults.scene_threshold, 0.15);
        assert!(config.boost.cleanup);
        assert!(!config.boost.verbose);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.defaults.crf, config.defaults.crf);
        assert_eq!(deserialized.defaults.preset, config.defaults.preset);
        assert_eq!(deserialized.boost.cleanup, config.boost.cleanup);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str("[defaults]\ncrf = 23\n").unwrap();
        assert_eq!(config.defaults.crf, 23);
        assert_eq!(config.defaults.preset, "slow");
        assert!(config.boost.cleanup);
    }
}

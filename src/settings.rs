//! Runtime settings loaded from TOML
//!
//! Settings are read from the path given on the command line, or from
//! `~/.config/imagine/settings.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use imagine_core::TimeConfig;
use imagine_physics::PhysicsConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All runtime settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub viewport: ViewportSettings,
    pub physics: PhysicsConfig,
    pub time: TimeConfig,
    pub demo: DemoSettings,
}

impl RuntimeSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("imagine"))
    }

    /// Get the default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from `path` (or the default location), falling back to
    /// defaults when the file is missing or unreadable.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let Some(path) = Self::settings_path() else {
                    warn!("Could not determine config directory");
                    return Self::default();
                };
                path
            }
        };

        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Size of the surface the scene renders into
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Headless demo run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Number of fixed-timestep frames to simulate
    pub frames: u32,
    /// Scene document to load instead of the built-in demo scene
    pub scene_path: Option<PathBuf>,
    /// Where to write the scene after the run
    pub save_path: Option<PathBuf>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            frames: 120,
            scene_path: None,
            save_path: None,
        }
    }
}

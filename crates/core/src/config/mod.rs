use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub shell: ShellConfig,
    pub scene: SceneConfig,
    pub assets: AssetConfig,
}

impl AppConfig {
    /// Reads a JSON config file. Missing fields fall back to their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Options recognised by the application shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Identifier of the surface the shell draws into.
    pub view: String,
    /// Device pixel ratio. `None` falls back to 1.
    pub resolution: Option<f32>,
    /// 24-bit RGB background fill.
    pub background_color: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            view: "stage-canvas".to_string(),
            resolution: None,
            background_color: 0x6495ed,
            width: 640,
            height: 480,
        }
    }
}

impl ShellConfig {
    /// Pixel ratio to render at. Anything that is not a positive finite
    /// number is treated as missing.
    pub fn effective_resolution(&self) -> f32 {
        self.resolution
            .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
            .unwrap_or(1.0)
    }

    pub fn background_rgb(&self) -> [u8; 3] {
        let [_, r, g, b] = self.background_color.to_be_bytes();
        [r, g, b]
    }
}

/// Assets and playback settings used by the demo scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub texture: String,
    pub sound: String,
    pub volume: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            texture: "clampy.png".to_string(),
            sound: "james-bond-music-363.mp3".to_string(),
            volume: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub base_path: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("assets"),
        }
    }
}

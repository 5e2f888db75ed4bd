//! Engine configuration.
//!
//! [`EngineConfig`] is plain data, loadable from JSON so a project can tune
//! timing and asset fallbacks without a rebuild. Missing fields take their
//! defaults, so an empty `{}` file is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum number of joints a skinned mesh can upload.
pub const MAX_SKINNING_JOINTS: usize = 96;

/// Tunable engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplier applied to every frame delta.
    pub time_scale: f32,
    /// Deltas above this are treated as a hitch.
    pub max_delta_secs: f32,
    /// Delta used in place of a hitch.
    pub fallback_delta_secs: f32,
    /// Weight of the next clip while cross-fading animations.
    pub blend_factor: f32,
    /// Directory asset references are resolved against.
    pub asset_root: PathBuf,
    /// Mesh substituted when a referenced mesh cannot be loaded.
    pub default_mesh: String,
    /// Texture substituted when a referenced texture cannot be found.
    pub default_texture: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_secs: 1.0,
            fallback_delta_secs: 1.0 / 60.0,
            blend_factor: 0.5,
            asset_root: PathBuf::from("assets"),
            default_mesh: "cube".into(),
            default_texture: "test.png".into(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        log::info!("Loaded engine config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config: EngineConfig = serde_json::from_str(r#"{ "time_scale": 0.25 }"#).unwrap();
        assert_eq!(config.time_scale, 0.25);
        assert_eq!(config.blend_factor, 0.5);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let config = EngineConfig {
            default_mesh: "crate.gltf".into(),
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }
}

//! Runtime settings, loaded from an optional RON file.
//!
//! Every field has a default, so a config file only needs the keys it wants to
//! change:
//!
//! ```ron
//! (
//!     seed: Some(7),
//!     global_scale: 1.0,
//!     star_count: 4000,
//! )
//! ```

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::Deserialize;

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "orrery.ron";
pub const CONFIG_ENV: &str = "ORRERY_CONFIG";

#[derive(Resource, Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrreryConfig {
    pub window_title: String,
    pub window_width: f32,
    pub window_height: f32,
    /// Passed to bevy's `LogPlugin` (same syntax as `RUST_LOG`).
    pub log_filter: String,
    /// Fixed seed for initial orbital phases and the starfield. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Shared multiplier on every body's angular speed.
    pub global_scale: f32,
    /// Axial spin added per frame, in radians. Not scaled by frame time.
    pub spin_step: f32,
    pub default_bump_scale: f32,
    pub star_count: usize,
    /// Half-width of the cube the starfield is scattered in.
    pub star_extent: f32,
    pub orbit_samples: usize,
    pub dash_size: f32,
    pub gap_size: f32,
    /// Directory, relative to the asset root, holding surface textures.
    pub texture_dir: String,
}

impl Default for OrreryConfig {
    fn default() -> Self {
        Self {
            window_title: "orrery — solar system".into(),
            window_width: 1400.0,
            window_height: 900.0,
            log_filter: "info,wgpu=error,naga=warn".into(),
            seed: None,
            global_scale: 0.5,
            spin_step: 0.02,
            default_bump_scale: 0.03,
            star_count: 1200,
            star_extent: 1000.0,
            orbit_samples: 480,
            dash_size: 1.0,
            gap_size: 1.0,
            texture_dir: "textures".into(),
        }
    }
}

impl OrreryConfig {
    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Reads `path` if it exists; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_ron(&contents)
    }

    /// `$ORRERY_CONFIG` if set, otherwise `orrery.ron` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    pub fn texture_path(&self, file: &str) -> String {
        format!("{}/{}", self.texture_dir.trim_end_matches('/'), file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = OrreryConfig::from_ron("(seed: Some(7), star_count: 10)").unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.star_count, 10);
        assert_eq!(config.global_scale, 0.5);
        assert_eq!(config.spin_step, 0.02);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = OrreryConfig::from_ron("(star_count: \"many\")").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = OrreryConfig::load(Path::new("definitely/not/here.ron")).unwrap();
        assert_eq!(config, OrreryConfig::default());
    }

    #[test]
    fn texture_paths_join_cleanly() {
        let mut config = OrreryConfig::default();
        assert_eq!(config.texture_path("earth.jpg"), "textures/earth.jpg");
        config.texture_dir = "maps/".into();
        assert_eq!(config.texture_path("sun.jpg"), "maps/sun.jpg");
    }
}

//! Runtime configuration
//!
//! Loaded from a TOML file; every section and key is optional.
//!
//! ```toml
//! [preview]
//! max_width_segments = 16
//! max_height_segments = 8
//! max_radial_segments = 8
//! max_tubular_segments = 32
//! imported_tint = "#4a90d9"
//! custom_tint = "#9b59b6"
//! placeholder_opacity = 0.5
//! auto_rotate_speed = 0.5
//!
//! [save]
//! collection = "projects"
//! light_fields = "extended"
//!
//! [reconstruct]
//! on_failure = "placeholder"
//! max_vertices = 4194304
//! ```

use std::path::{Path, PathBuf};

use atelier_geometry::SegmentLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;
use crate::full::FailurePolicy;
use crate::light::LightFieldSet;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtelierConfig {
    pub preview: PreviewConfig,
    pub save: SaveConfig,
    pub reconstruct: ReconstructConfig,
}

impl AtelierConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Preview reconstruction settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub max_width_segments: u32,
    pub max_height_segments: u32,
    pub max_radial_segments: u32,
    pub max_tubular_segments: u32,
    /// Placeholder tint for imported models
    pub imported_tint: Color,
    /// Placeholder tint for custom geometry
    pub custom_tint: Color,
    pub placeholder_opacity: f32,
    /// Radians per second
    pub auto_rotate_speed: f32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let limits = SegmentLimits::default();
        Self {
            max_width_segments: limits.max_width_segments,
            max_height_segments: limits.max_height_segments,
            max_radial_segments: limits.max_radial_segments,
            max_tubular_segments: limits.max_tubular_segments,
            imported_tint: Color(0x4a90d9),
            custom_tint: Color(0x9b59b6),
            placeholder_opacity: 0.5,
            auto_rotate_speed: 0.5,
        }
    }
}

impl PreviewConfig {
    pub fn limits(&self) -> SegmentLimits {
        SegmentLimits {
            max_width_segments: self.max_width_segments,
            max_height_segments: self.max_height_segments,
            max_radial_segments: self.max_radial_segments,
            max_tubular_segments: self.max_tubular_segments,
        }
    }
}

/// Project save settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Store collection holding project documents
    pub collection: String,
    pub light_fields: LightFieldSet,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            collection: "projects".to_string(),
            light_fields: LightFieldSet::Extended,
        }
    }
}

/// Full reconstruction settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    pub on_failure: FailurePolicy,
    /// Largest primitive, in vertices, that is tessellated from stored parameters
    pub max_vertices: u64,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            on_failure: FailurePolicy::default(),
            max_vertices: 1 << 22,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AtelierConfig::default();
        assert_eq!(config.preview.limits(), SegmentLimits::default());
        assert_eq!(config.save.collection, "projects");
        assert_eq!(config.save.light_fields, LightFieldSet::Extended);
        assert_eq!(config.reconstruct.on_failure, FailurePolicy::Placeholder);
        assert_eq!(config.reconstruct.max_vertices, 4_194_304);
    }

    #[test]
    fn test_partial_config() {
        let config = AtelierConfig::from_toml_str(
            r##"
[preview]
max_width_segments = 6
custom_tint = "#00ff00"

[save]
light_fields = "minimal"
"##,
        )
        .unwrap();
        assert_eq!(config.preview.max_width_segments, 6);
        assert_eq!(config.preview.max_height_segments, 8);
        assert_eq!(config.preview.custom_tint, Color(0x00ff00));
        assert_eq!(config.preview.imported_tint, Color(0x4a90d9));
        assert_eq!(config.save.light_fields, LightFieldSet::Minimal);
        assert_eq!(config.save.collection, "projects");
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(AtelierConfig::from_toml_str("").unwrap(), AtelierConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = AtelierConfig::default();
        config.reconstruct.on_failure = FailurePolicy::Omit;
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("on_failure = \"omit\""));
        assert_eq!(AtelierConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_value() {
        let err = AtelierConfig::from_toml_str("[save]\nlight_fields = \"everything\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

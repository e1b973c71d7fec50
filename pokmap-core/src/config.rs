//! Renderer configuration.
//!
//! Supports TOML configuration files like:
//! ```toml
//! padding_px = 40
//! line_width_px = 3
//! font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
//! flip_y = true
//! ```
//! Every key is optional.

use crate::error::{MapError, Result};
use crate::models::Orientation;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    pub padding_px: u32,
    pub line_width_px: u32,
    pub dot_radius_px: u32,
    /// Half-width of the arrow marker; its height is twice this.
    pub arrow_size_px: u32,
    pub font_path: PathBuf,
    pub font_size_pt: f32,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        let orientation = Orientation::default();
        Self {
            padding_px: 40,
            line_width_px: 3,
            dot_radius_px: 6,
            arrow_size_px: 5,
            font_path: PathBuf::from("DejaVuSans-Bold.ttf"),
            font_size_pt: 18.0,
            flip_x: orientation.flip_x,
            flip_y: orientation.flip_y,
        }
    }
}

impl RendererConfig {
    /// Load renderer configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MapError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read renderer config from {:?}: {}", path, e),
            ))
        })?;

        Self::from_str(&content)
    }

    /// Parse renderer configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            MapError::Config(format!("Failed to parse renderer config TOML: {}", e))
        })?;
        if !(config.font_size_pt > 0.0) {
            return Err(MapError::Config(format!(
                "font_size_pt must be positive, got {}",
                config.font_size_pt
            )));
        }
        Ok(config)
    }

    pub fn orientation(&self) -> Orientation {
        Orientation { flip_x: self.flip_x, flip_y: self.flip_y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RendererConfig::from_str("").unwrap();
        assert_eq!(config, RendererConfig::default());
        assert_eq!(config.orientation(), Orientation { flip_x: false, flip_y: true });
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
padding_px = 10
flip_x = true
font_path = "/fonts/custom.ttf"
"#;
        let config = RendererConfig::from_str(toml).unwrap();
        assert_eq!(config.padding_px, 10);
        assert!(config.flip_x);
        assert!(config.flip_y);
        assert_eq!(config.font_path, PathBuf::from("/fonts/custom.ttf"));
        assert_eq!(config.line_width_px, 3);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            RendererConfig::from_str("padding_px = \"wide\""),
            Err(MapError::Config(_))
        ));
        assert!(matches!(
            RendererConfig::from_str("font_size_pt = 0.0"),
            Err(MapError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pokmap.toml");
        std::fs::write(&path, "arrow_size_px = 8\n").unwrap();
        assert_eq!(RendererConfig::from_file(&path).unwrap().arrow_size_px, 8);
        assert!(RendererConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}

/// Render configuration.
///
/// Every struct here deserializes with `#[serde(default)]`, so a JSON file
/// only needs to name the values it overrides, for example
/// `{ "mode": "wait_for_texture", "wireframe": { "opacity": 0.1 } }`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::lighting::LightingModel;
use crate::projection::ScreenProjection;
use crate::surface::Color;

/// What to do while the texture has not arrived yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Render straight away with flat shading, switch to textured once ready
    #[default]
    FlatImmediate,
    /// Skip rendering until a texture is supplied
    WaitForTexture,
}

/// Faint edge lines drawn over every face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireframeConfig {
    pub color: [u8; 3],
    pub opacity: f32,
    pub width: f32,
}

impl Default for WireframeConfig {
    fn default() -> Self {
        Self {
            color: [100, 100, 150],
            opacity: 0.3,
            width: 0.5,
        }
    }
}

impl WireframeConfig {
    pub fn stroke_color(&self) -> Color {
        Color::from_array(self.color).with_opacity(self.opacity)
    }
}

/// Range the embedding UI keeps the zoom in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 50.0,
            max: 200.0,
            step: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
    /// At 100% zoom one object-space unit spans `min(width, height) / layout_divisor` pixels
    pub layout_divisor: f32,
    /// Texture triangles with `|det|` at or below this fall back to flat fill
    pub degenerate_epsilon: f32,
    pub mode: RenderMode,
    pub base_color: [u8; 3],
    pub flat_lighting: LightingModel,
    pub textured_lighting: LightingModel,
    /// Opacity of the multiply overlay on textured faces
    pub overlay_opacity: f32,
    pub wireframe: WireframeConfig,
    pub zoom: ZoomConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            layout_divisor: 4.0,
            degenerate_epsilon: 0.01,
            mode: RenderMode::default(),
            base_color: [155, 135, 245],
            flat_lighting: LightingModel::FLAT,
            textured_lighting: LightingModel::TEXTURED,
            overlay_opacity: 0.3,
            wireframe: WireframeConfig::default(),
            zoom: ZoomConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::Config(format!(
                "surface size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.layout_divisor <= 0.0 {
            return Err(RenderError::Config("layout_divisor must be positive".into()));
        }
        for (name, model) in [
            ("flat_lighting", &self.flat_lighting),
            ("textured_lighting", &self.textured_lighting),
        ] {
            if model.divisor <= 0.0 {
                return Err(RenderError::Config(format!("{}.divisor must be positive", name)));
            }
        }
        if self.degenerate_epsilon < 0.0 {
            return Err(RenderError::Config("degenerate_epsilon must not be negative".into()));
        }
        if self.zoom.min <= 0.0 || self.zoom.min > self.zoom.max {
            return Err(RenderError::Config(format!(
                "zoom range {}..{} is invalid",
                self.zoom.min, self.zoom.max
            )));
        }
        Ok(())
    }

    pub fn projection(&self) -> ScreenProjection {
        ScreenProjection::new(self.width, self.height, self.layout_divisor)
    }

    pub fn base_color(&self) -> Color {
        Color::from_array(self.base_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!((config.width, config.height), (800, 800));
        assert_eq!(config.mode, RenderMode::FlatImmediate);
        assert_eq!(config.flat_lighting, LightingModel::FLAT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let config = RenderConfig::from_json_str(
            r#"{"mode": "wait_for_texture", "wireframe": {"opacity": 0.1}, "width": 320}"#,
        )
        .unwrap();
        assert_eq!(config.mode, RenderMode::WaitForTexture);
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 800);
        assert!((config.wireframe.opacity - 0.1).abs() < 1e-6);
        assert_eq!(config.wireframe.color, [100, 100, 150]);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            RenderConfig::from_json_str(r#"{"layout_divisor": 0}"#),
            Err(RenderError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_json_str(r#"{"zoom": {"min": 300}}"#),
            Err(RenderError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_json_str(r#"{"mode": "sometimes"}"#),
            Err(RenderError::Json(_))
        ));
    }
}

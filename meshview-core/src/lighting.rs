/// Depth-based lighting tint
use serde::{Deserialize, Serialize};

use crate::surface::Color;

/// `lightness = clamp((avg_z + 1) / divisor, lower_bound, 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingModel {
    pub divisor: f32,
    /// Floor that keeps far faces from disappearing
    pub lower_bound: f32,
}

impl LightingModel {
    /// Flat-shaded faces: full range of darkening
    pub const FLAT: LightingModel = LightingModel {
        divisor: 2.0,
        lower_bound: 0.3,
    };

    /// Textured faces stay brighter; the texture carries most of the detail
    pub const TEXTURED: LightingModel = LightingModel {
        divisor: 1.5,
        lower_bound: 0.6,
    };

    pub fn lightness(&self, avg_z: f32) -> f32 {
        ((avg_z + 1.0) / self.divisor).clamp(self.lower_bound, 1.0)
    }
}

/// Base colour with every channel scaled by the lightness
pub fn flat_color(base: Color, lightness: f32) -> Color {
    base.scaled(lightness)
}

/// Grey level for the multiply overlay: white at full lightness
pub fn overlay_color(lightness: f32, opacity: f32) -> Color {
    Color::WHITE.scaled(lightness).with_opacity(opacity)
}

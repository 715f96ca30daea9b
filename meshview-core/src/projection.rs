/// Orthographic screen mapping for a surface of a given size.
///
/// There is no camera and no perspective divide: rotated x and y are scaled
/// by a factor derived from the surface size and zoom, then translated to the
/// surface centre. Depth is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenProjection {
    pub width: u32,
    pub height: u32,
    /// The mesh's unit extent is `min(width, height) / layout_divisor` pixels at 100% zoom
    pub layout_divisor: f32,
}

impl ScreenProjection {
    pub fn new(width: u32, height: u32, layout_divisor: f32) -> Self {
        Self {
            width,
            height,
            layout_divisor,
        }
    }

    /// Pixels per object-space unit at the given zoom percentage
    pub fn scale(&self, zoom: f32) -> f32 {
        self.width.min(self.height) as f32 / self.layout_divisor * (zoom / 100.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

impl Default for ScreenProjection {
    fn default() -> Self {
        Self::new(800, 800, 4.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_uses_smaller_side() {
        let projection = ScreenProjection::new(1000, 800, 4.0);
        assert!((projection.scale(100.0) - 200.0).abs() < 1e-6);
        assert!((projection.scale(50.0) - 100.0).abs() < 1e-6);
        assert_eq!(projection.center(), (500.0, 400.0));
    }

    #[test]
    fn test_layout_divisor() {
        let projection = ScreenProjection::new(900, 900, 3.0);
        assert!((projection.scale(200.0) - 600.0).abs() < 1e-4);
    }
}
